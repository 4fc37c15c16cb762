use super::common::{
    created_response, no_content_response, success_response, ApiPath, ApiQuery, ValidatedJson,
};
use crate::{
    entities::{invoice::Model as Invoice, invoice_status_history::Model as InvoiceStatusHistoryEntry},
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::invoices::{InvoiceFilter, InvoiceInput, InvoiceStatusChange},
};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use tracing::info;

pub const CSV_FILENAME: &str = "invoices.csv";

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(InvoiceFilter),
    responses((status = 200, description = "Invoices", body = [Invoice])),
    tag = "invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.invoices.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = Invoice),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.invoices.get(id).await?))
}

/// Register a received invoice
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = InvoiceInput,
    responses(
        (status = 201, description = "Invoice created in RECEIVED", body = Invoice),
        (status = 400, description = "Invalid request, unknown reference or missing exchange rate", body = ErrorResponse),
        (status = 409, description = "Invoice already registered for the vendor", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<InvoiceInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoice = state.services.invoices.create(payload).await?;
    info!("Invoice created: {} ({})", invoice.id, invoice.number_norm);
    Ok(created_response(invoice))
}

#[utoipa::path(
    put,
    path = "/api/v1/invoices/{id}",
    request_body = InvoiceInput,
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice updated", body = Invoice),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 409, description = "Invoice already registered for the vendor", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<InvoiceInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.invoices.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 204, description = "Invoice and its history deleted"),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.invoices.delete(id).await?;
    Ok(no_content_response())
}

/// Move an invoice through its approval workflow
#[utoipa::path(
    patch,
    path = "/api/v1/invoices/{id}/status",
    request_body = InvoiceStatusChange,
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Status changed", body = Invoice),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn change_invoice_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<InvoiceStatusChange>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.invoices.change_status(id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}/history",
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Status history, oldest first", body = [InvoiceStatusHistoryEntry]),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_invoice_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.invoices.history(id).await?))
}

/// Download invoices as CSV
#[utoipa::path(
    get,
    path = "/api/v1/invoices/export/csv",
    params(InvoiceFilter),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String)
    ),
    tag = "invoices"
)]
pub async fn export_invoices_csv(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let body = state.services.invoice_export.export_csv(&filter).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILENAME),
            ),
        ],
        body,
    ))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/export/csv", get(export_invoices_csv))
        .route("/:id", get(get_invoice).put(update_invoice).delete(delete_invoice))
        .route("/:id/status", patch(change_invoice_status))
        .route("/:id/history", get(get_invoice_history))
}
