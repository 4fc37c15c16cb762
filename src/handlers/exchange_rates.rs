use super::common::{
    created_response, no_content_response, success_response, ApiPath, ValidatedJson,
};
use crate::{
    entities::exchange_rate::Model as ExchangeRate,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::exchange_rates::ExchangeRateInput,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

/// List exchange rates ordered by year
#[utoipa::path(
    get,
    path = "/api/v1/exchange-rates",
    responses(
        (status = 200, description = "Exchange rates", body = [ExchangeRate])
    ),
    tag = "exchange-rates"
)]
pub async fn list_exchange_rates(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let rates = state.services.exchange_rates.list().await?;
    Ok(success_response(rates))
}

#[utoipa::path(
    get,
    path = "/api/v1/exchange-rates/year/{year}",
    params(("year" = i32, Path, description = "Calendar year")),
    responses(
        (status = 200, description = "Exchange rate for the year", body = ExchangeRate),
        (status = 404, description = "No rate for that year", body = ErrorResponse)
    ),
    tag = "exchange-rates"
)]
pub async fn get_exchange_rate_by_year(
    State(state): State<AppState>,
    ApiPath(year): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let rate = state.services.exchange_rates.get_by_year(year).await?;
    Ok(success_response(rate))
}

#[utoipa::path(
    post,
    path = "/api/v1/exchange-rates",
    request_body = ExchangeRateInput,
    responses(
        (status = 201, description = "Exchange rate created", body = ExchangeRate),
        (status = 400, description = "Invalid year or rate", body = ErrorResponse),
        (status = 409, description = "A rate for that year already exists", body = ErrorResponse)
    ),
    tag = "exchange-rates"
)]
pub async fn create_exchange_rate(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ExchangeRateInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let rate = state.services.exchange_rates.create(payload).await?;
    info!("Exchange rate created for {}", rate.year);
    Ok(created_response(rate))
}

#[utoipa::path(
    put,
    path = "/api/v1/exchange-rates/{id}",
    request_body = ExchangeRateInput,
    params(("id" = i32, Path, description = "Exchange rate ID")),
    responses(
        (status = 200, description = "Exchange rate updated", body = ExchangeRate),
        (status = 400, description = "Invalid year or rate", body = ErrorResponse),
        (status = 404, description = "Exchange rate not found", body = ErrorResponse),
        (status = 409, description = "A rate for that year already exists", body = ErrorResponse)
    ),
    tag = "exchange-rates"
)]
pub async fn update_exchange_rate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<ExchangeRateInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let rate = state.services.exchange_rates.update(id, payload).await?;
    Ok(success_response(rate))
}

#[utoipa::path(
    delete,
    path = "/api/v1/exchange-rates/{id}",
    params(("id" = i32, Path, description = "Exchange rate ID")),
    responses(
        (status = 204, description = "Exchange rate deleted"),
        (status = 404, description = "Exchange rate not found", body = ErrorResponse)
    ),
    tag = "exchange-rates"
)]
pub async fn delete_exchange_rate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.exchange_rates.delete(id).await?;
    Ok(no_content_response())
}

pub fn exchange_rate_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exchange_rates).post(create_exchange_rate))
        .route("/year/:year", get(get_exchange_rate_by_year))
        .route(
            "/:id",
            axum::routing::put(update_exchange_rate).delete(delete_exchange_rate),
        )
}
