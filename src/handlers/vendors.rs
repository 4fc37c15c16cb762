use super::common::{
    created_response, no_content_response, success_response, ApiPath, ValidatedJson,
};
use crate::{
    entities::vendor::Model as Vendor,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::vendors::VendorInput,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/v1/vendors",
    responses((status = 200, description = "Vendors ordered by name", body = [Vendor])),
    tag = "vendors"
)]
pub async fn list_vendors(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.vendors.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}",
    params(("id" = i32, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Vendor", body = Vendor),
        (status = 404, description = "Vendor not found", body = ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.vendors.get(id).await?))
}

/// Look a vendor up by tax id
#[utoipa::path(
    get,
    path = "/api/v1/vendors/ruc/{ruc}",
    params(("ruc" = String, Path, description = "11-digit tax id")),
    responses(
        (status = 200, description = "Vendor", body = Vendor),
        (status = 404, description = "No vendor with that ruc", body = ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn get_vendor_by_ruc(
    State(state): State<AppState>,
    ApiPath(ruc): ApiPath<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.vendors.get_by_ruc(&ruc).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/vendors",
    request_body = VendorInput,
    responses(
        (status = 201, description = "Vendor created", body = Vendor),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Duplicate ruc", body = ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VendorInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let vendor = state.services.vendors.create(payload).await?;
    info!("Vendor created: {} ({})", vendor.id, vendor.ruc);
    Ok(created_response(vendor))
}

#[utoipa::path(
    put,
    path = "/api/v1/vendors/{id}",
    request_body = VendorInput,
    params(("id" = i32, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Vendor updated", body = Vendor),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Vendor not found", body = ErrorResponse),
        (status = 409, description = "Duplicate ruc", body = ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<VendorInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.vendors.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}",
    params(("id" = i32, Path, description = "Vendor ID")),
    responses(
        (status = 204, description = "Vendor deleted"),
        (status = 400, description = "Vendor is still referenced", body = ErrorResponse),
        (status = 404, description = "Vendor not found", body = ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.vendors.delete(id).await?;
    Ok(no_content_response())
}

pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vendors).post(create_vendor))
        .route("/ruc/:ruc", get(get_vendor_by_ruc))
        .route("/:id", get(get_vendor).put(update_vendor).delete(delete_vendor))
}
