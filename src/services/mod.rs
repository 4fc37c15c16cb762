// Catalogs
pub mod exchange_rates;
pub mod periods;
pub mod supports;
pub mod vendors;

// Documents
pub mod budgets;
pub mod invoices;
pub mod purchase_orders;

// Status lifecycle shared by invoices and purchase orders
pub mod status_workflow;

// Batch jobs and projections
pub mod invoice_export;
pub mod vendor_backfill;

use crate::{db::DbPool, events::EventSender};
use rust_decimal::Decimal;
use std::sync::Arc;
use validator::ValidationError;

/// Services layer used by HTTP handlers and the CLI binaries
#[derive(Clone)]
pub struct AppServices {
    pub exchange_rates: Arc<exchange_rates::ExchangeRateService>,
    pub supports: Arc<supports::SupportService>,
    pub vendors: Arc<vendors::VendorService>,
    pub periods: Arc<periods::PeriodService>,
    pub budgets: Arc<budgets::BudgetService>,
    pub invoices: Arc<invoices::InvoiceService>,
    pub purchase_orders: Arc<purchase_orders::PurchaseOrderService>,
    pub vendor_backfill: Arc<vendor_backfill::VendorBackfillService>,
    pub invoice_export: Arc<invoice_export::InvoiceExportService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        strict_status_transitions: bool,
    ) -> Self {
        Self {
            exchange_rates: Arc::new(exchange_rates::ExchangeRateService::new(db_pool.clone())),
            supports: Arc::new(supports::SupportService::new(db_pool.clone())),
            vendors: Arc::new(vendors::VendorService::new(db_pool.clone())),
            periods: Arc::new(periods::PeriodService::new(db_pool.clone())),
            budgets: Arc::new(budgets::BudgetService::new(db_pool.clone())),
            invoices: Arc::new(invoices::InvoiceService::new(
                db_pool.clone(),
                event_sender.clone(),
                strict_status_transitions,
            )),
            purchase_orders: Arc::new(purchase_orders::PurchaseOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
                strict_status_transitions,
            )),
            vendor_backfill: Arc::new(vendor_backfill::VendorBackfillService::new(
                db_pool.clone(),
                event_sender,
            )),
            invoice_export: Arc::new(invoice_export::InvoiceExportService::new(db_pool)),
        }
    }
}

pub(crate) fn validate_decimal_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("amount must be non-negative".into());
        return Err(err);
    }
    Ok(())
}

/// Trims `value` and maps blank strings to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
