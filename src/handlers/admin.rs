use super::common::{success_response, ApiQuery};
use crate::{
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::vendor_backfill::BackfillReport,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BackfillParams {
    /// Compute the report and roll back
    #[serde(default)]
    pub dry_run: bool,
}

/// Link purchase orders to vendors created from their legacy columns
#[utoipa::path(
    post,
    path = "/api/v1/admin/vendors/backfill",
    params(BackfillParams),
    responses(
        (status = 200, description = "Backfill report", body = BackfillReport),
        (status = 500, description = "Backfill rolled back", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn backfill_vendors(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BackfillParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.vendor_backfill.run(params.dry_run).await?;
    Ok(success_response(report))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/vendors/backfill", post(backfill_vendors))
}
