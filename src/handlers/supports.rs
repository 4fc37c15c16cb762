use super::common::{
    created_response, no_content_response, success_response, ApiPath, ApiQuery, ValidatedJson,
};
use crate::{
    entities::support::Model as Support,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::supports::{SupportFilter, SupportInput},
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};

#[utoipa::path(
    get,
    path = "/api/v1/supports",
    params(SupportFilter),
    responses((status = 200, description = "Supports", body = [Support])),
    tag = "supports"
)]
pub async fn list_supports(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<SupportFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.supports.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/supports/{id}",
    params(("id" = i32, Path, description = "Support ID")),
    responses(
        (status = 200, description = "Support", body = Support),
        (status = 404, description = "Support not found", body = ErrorResponse)
    ),
    tag = "supports"
)]
pub async fn get_support(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.supports.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/supports",
    request_body = SupportInput,
    responses(
        (status = 201, description = "Support created", body = Support),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Duplicate code", body = ErrorResponse)
    ),
    tag = "supports"
)]
pub async fn create_support(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SupportInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.services.supports.create(payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/supports/{id}",
    request_body = SupportInput,
    params(("id" = i32, Path, description = "Support ID")),
    responses(
        (status = 200, description = "Support updated", body = Support),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Support not found", body = ErrorResponse),
        (status = 409, description = "Duplicate code", body = ErrorResponse)
    ),
    tag = "supports"
)]
pub async fn update_support(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<SupportInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.supports.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/supports/{id}",
    params(("id" = i32, Path, description = "Support ID")),
    responses(
        (status = 204, description = "Support deleted"),
        (status = 404, description = "Support not found", body = ErrorResponse)
    ),
    tag = "supports"
)]
pub async fn delete_support(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.supports.delete(id).await?;
    Ok(no_content_response())
}

pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_supports).post(create_support))
        .route("/:id", get(get_support).put(update_support).delete(delete_support))
}
