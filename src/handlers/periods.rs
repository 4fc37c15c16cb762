use super::common::{
    created_response, no_content_response, success_response, ApiPath, ValidatedJson,
};
use crate::{
    entities::period::Model as Period,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::periods::PeriodInput,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};

#[utoipa::path(
    get,
    path = "/api/v1/periods",
    responses((status = 200, description = "Periods ordered by year and month", body = [Period])),
    tag = "periods"
)]
pub async fn list_periods(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.periods.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/periods/{id}",
    params(("id" = i32, Path, description = "Period ID")),
    responses(
        (status = 200, description = "Period", body = Period),
        (status = 404, description = "Period not found", body = ErrorResponse)
    ),
    tag = "periods"
)]
pub async fn get_period(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.periods.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/periods",
    request_body = PeriodInput,
    responses(
        (status = 201, description = "Period created", body = Period),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Period already exists", body = ErrorResponse)
    ),
    tag = "periods"
)]
pub async fn create_period(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PeriodInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.services.periods.create(payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/periods/{id}",
    request_body = PeriodInput,
    params(("id" = i32, Path, description = "Period ID")),
    responses(
        (status = 200, description = "Period updated", body = Period),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Period not found", body = ErrorResponse),
        (status = 409, description = "Period already exists", body = ErrorResponse)
    ),
    tag = "periods"
)]
pub async fn update_period(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<PeriodInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.periods.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/periods/{id}",
    params(("id" = i32, Path, description = "Period ID")),
    responses(
        (status = 204, description = "Period deleted"),
        (status = 404, description = "Period not found", body = ErrorResponse)
    ),
    tag = "periods"
)]
pub async fn delete_period(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.periods.delete(id).await?;
    Ok(no_content_response())
}

pub fn period_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_periods).post(create_period))
        .route("/:id", get(get_period).put(update_period).delete(delete_period))
}
