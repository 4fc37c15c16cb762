//! SeaORM entities, one module per table.

pub mod budget_allocation;
pub mod exchange_rate;
pub mod invoice;
pub mod invoice_status_history;
pub mod oc_status_history;
pub mod period;
pub mod purchase_order;
pub mod status;
pub mod support;
pub mod vendor;

pub use status::{Currency, DocType, InvoiceStatus, OcStatus};
