use super::common::{
    created_response, no_content_response, success_response, ApiPath, ApiQuery, ValidatedJson,
};
use crate::{
    entities::budget_allocation::Model as BudgetAllocation,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::budgets::{BudgetFilter, BudgetInput},
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};

#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    params(BudgetFilter),
    responses((status = 200, description = "Budget allocations", body = [BudgetAllocation])),
    tag = "budgets"
)]
pub async fn list_budgets(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<BudgetFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.budgets.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/budgets/{id}",
    params(("id" = i32, Path, description = "Budget allocation ID")),
    responses(
        (status = 200, description = "Budget allocation", body = BudgetAllocation),
        (status = 404, description = "Budget allocation not found", body = ErrorResponse)
    ),
    tag = "budgets"
)]
pub async fn get_budget(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.budgets.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/budgets",
    request_body = BudgetInput,
    responses(
        (status = 201, description = "Budget allocation created", body = BudgetAllocation),
        (status = 400, description = "Invalid amount or unknown support/period", body = ErrorResponse),
        (status = 409, description = "Support already budgeted for the period", body = ErrorResponse)
    ),
    tag = "budgets"
)]
pub async fn create_budget(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<BudgetInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.services.budgets.create(payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/budgets/{id}",
    request_body = BudgetInput,
    params(("id" = i32, Path, description = "Budget allocation ID")),
    responses(
        (status = 200, description = "Budget allocation updated", body = BudgetAllocation),
        (status = 400, description = "Invalid amount or unknown support/period", body = ErrorResponse),
        (status = 404, description = "Budget allocation not found", body = ErrorResponse),
        (status = 409, description = "Support already budgeted for the period", body = ErrorResponse)
    ),
    tag = "budgets"
)]
pub async fn update_budget(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<BudgetInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.budgets.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{id}",
    params(("id" = i32, Path, description = "Budget allocation ID")),
    responses(
        (status = 204, description = "Budget allocation deleted"),
        (status = 404, description = "Budget allocation not found", body = ErrorResponse)
    ),
    tag = "budgets"
)]
pub async fn delete_budget(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.budgets.delete(id).await?;
    Ok(no_content_response())
}

pub fn budget_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_budgets).post(create_budget))
        .route("/:id", get(get_budget).put(update_budget).delete(delete_budget))
}
