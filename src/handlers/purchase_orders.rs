use super::common::{
    created_response, no_content_response, success_response, ApiPath, ApiQuery, ValidatedJson,
};
use crate::{
    entities::oc_status_history::Model as OcStatusHistoryEntry,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::purchase_orders::{
        PurchaseOrderFilter, PurchaseOrderInput, PurchaseOrderStatusChange, PurchaseOrderView,
    },
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PurchaseOrderFilter),
    responses((status = 200, description = "Purchase orders with resolved vendor", body = [PurchaseOrderView])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PurchaseOrderFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.purchase_orders.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order", body = PurchaseOrderView),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.purchase_orders.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = PurchaseOrderInput,
    responses(
        (status = 201, description = "Purchase order created in PENDING", body = PurchaseOrderView),
        (status = 400, description = "Invalid request or unknown vendor", body = ErrorResponse),
        (status = 409, description = "Duplicate number", body = ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PurchaseOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.purchase_orders.create(payload).await?;
    info!("Purchase order created: {} ({})", order.id, order.number);
    Ok(created_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    request_body = PurchaseOrderInput,
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order updated", body = PurchaseOrderView),
        (status = 400, description = "Invalid request or unknown vendor", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse),
        (status = 409, description = "Duplicate number", body = ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<PurchaseOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.purchase_orders.update(id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 204, description = "Purchase order and its history deleted"),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.purchase_orders.delete(id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    patch,
    path = "/api/v1/purchase-orders/{id}/status",
    request_body = PurchaseOrderStatusChange,
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Status changed", body = PurchaseOrderView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn change_purchase_order_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<PurchaseOrderStatusChange>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state
            .services
            .purchase_orders
            .change_status(id, payload)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}/history",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Status history, oldest first", body = [OcStatusHistoryEntry]),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.purchase_orders.history(id).await?,
    ))
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchase_orders).post(create_purchase_order))
        .route(
            "/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route("/:id/status", patch(change_purchase_order_status))
        .route("/:id/history", get(get_purchase_order_history))
}
