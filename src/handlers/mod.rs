pub mod admin;
pub mod budgets;
pub mod common;
pub mod exchange_rates;
pub mod invoices;
pub mod periods;
pub mod purchase_orders;
pub mod supports;
pub mod vendors;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
