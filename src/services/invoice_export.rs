use std::sync::Arc;

use sea_orm::{EntityTrait, QueryFilter, QueryOrder};
use tracing::{info, instrument};

use super::invoices::InvoiceFilter;
use crate::{
    db::DbPool,
    entities::{invoice, vendor},
    errors::ServiceError,
};

const HEADER: [&str; 10] = [
    "id",
    "vendor_ruc",
    "vendor_name",
    "doc_type",
    "number",
    "issue_date",
    "currency",
    "total_foreign",
    "total_local",
    "status",
];

/// Writes invoices with their vendor as CSV, header first.
pub fn write_invoice_csv(
    rows: &[(invoice::Model, Option<vendor::Model>)],
) -> Result<Vec<u8>, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for (invoice, vendor) in rows {
        let (ruc, name) = vendor
            .as_ref()
            .map(|v| (v.ruc.as_str(), v.razon_social.as_str()))
            .unwrap_or(("", ""));
        writer.write_record([
            invoice.id.to_string().as_str(),
            ruc,
            name,
            invoice.doc_type.to_string().as_str(),
            invoice.number_norm.as_str(),
            invoice.issue_date.format("%Y-%m-%d").to_string().as_str(),
            invoice.currency.to_string().as_str(),
            invoice.total_foreign.to_string().as_str(),
            invoice.total_local.to_string().as_str(),
            invoice.status_current.to_string().as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ServiceError::SerializationError(e.to_string()))
}

/// Read-only CSV projection of invoices
#[derive(Clone)]
pub struct InvoiceExportService {
    db: Arc<DbPool>,
}

impl InvoiceExportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn export_csv(&self, filter: &InvoiceFilter) -> Result<Vec<u8>, ServiceError> {
        let rows = invoice::Entity::find()
            .find_also_related(vendor::Entity)
            .filter(filter.condition())
            .order_by_asc(invoice::Column::Id)
            .all(&*self.db)
            .await?;

        let body = write_invoice_csv(&rows)?;
        info!(rows = rows.len(), bytes = body.len(), "Invoice CSV exported");
        Ok(body)
    }
}
