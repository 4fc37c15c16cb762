use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::{
    entities, errors, handlers,
    services::{
        budgets, exchange_rates, invoices, periods, purchase_orders, supports, vendor_backfill,
        vendors,
    },
};

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Budget Admin API",
        version = "1.0.0",
        description = r#"
# Budget and procurement administration

Catalogs (exchange rates, supports, vendors, periods), budget allocations,
and the invoice and purchase order (OC) documents with their audited status
workflows.

## Errors

Every error has the same body. Validation failures carry an `issues` list:

```json
{
  "error": "Validation failed",
  "issues": [{ "path": "rate", "code": "range", "message": "rate must be greater than 0 and less than 100" }],
  "requestId": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Live updates

`GET /ws` upgrades to a WebSocket that pushes `invoice_status_change` and
`oc_status_change` messages after each committed status change.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "exchange-rates", description = "Yearly PEN/USD exchange rates"),
        (name = "supports", description = "Budget line catalog"),
        (name = "vendors", description = "Vendors keyed by RUC"),
        (name = "periods", description = "Budget periods"),
        (name = "budgets", description = "Budget allocations per support and period"),
        (name = "invoices", description = "Invoices and their approval workflow"),
        (name = "purchase-orders", description = "Purchase orders and their lifecycle"),
        (name = "admin", description = "Administrative jobs")
    ),
    paths(
        // Exchange rates
        handlers::exchange_rates::list_exchange_rates,
        handlers::exchange_rates::get_exchange_rate_by_year,
        handlers::exchange_rates::create_exchange_rate,
        handlers::exchange_rates::update_exchange_rate,
        handlers::exchange_rates::delete_exchange_rate,
        // Supports
        handlers::supports::list_supports,
        handlers::supports::get_support,
        handlers::supports::create_support,
        handlers::supports::update_support,
        handlers::supports::delete_support,
        // Vendors
        handlers::vendors::list_vendors,
        handlers::vendors::get_vendor,
        handlers::vendors::get_vendor_by_ruc,
        handlers::vendors::create_vendor,
        handlers::vendors::update_vendor,
        handlers::vendors::delete_vendor,
        // Periods
        handlers::periods::list_periods,
        handlers::periods::get_period,
        handlers::periods::create_period,
        handlers::periods::update_period,
        handlers::periods::delete_period,
        // Budgets
        handlers::budgets::list_budgets,
        handlers::budgets::get_budget,
        handlers::budgets::create_budget,
        handlers::budgets::update_budget,
        handlers::budgets::delete_budget,
        // Invoices
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::create_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
        handlers::invoices::change_invoice_status,
        handlers::invoices::get_invoice_history,
        handlers::invoices::export_invoices_csv,
        // Purchase orders
        handlers::purchase_orders::list_purchase_orders,
        handlers::purchase_orders::get_purchase_order,
        handlers::purchase_orders::create_purchase_order,
        handlers::purchase_orders::update_purchase_order,
        handlers::purchase_orders::delete_purchase_order,
        handlers::purchase_orders::change_purchase_order_status,
        handlers::purchase_orders::get_purchase_order_history,
        // Admin
        handlers::admin::backfill_vendors,
    ),
    components(
        schemas(
            // Entities
            entities::exchange_rate::Model,
            entities::support::Model,
            entities::vendor::Model,
            entities::period::Model,
            entities::budget_allocation::Model,
            entities::invoice::Model,
            entities::invoice_status_history::Model,
            entities::oc_status_history::Model,
            entities::InvoiceStatus,
            entities::OcStatus,
            entities::DocType,
            entities::Currency,
            // Request bodies and views
            exchange_rates::ExchangeRateInput,
            supports::SupportInput,
            vendors::VendorInput,
            periods::PeriodInput,
            budgets::BudgetInput,
            invoices::InvoiceInput,
            invoices::InvoiceStatusChange,
            purchase_orders::PurchaseOrderInput,
            purchase_orders::PurchaseOrderStatusChange,
            purchase_orders::PurchaseOrderView,
            vendor_backfill::BackfillReport,
            // Error types
            errors::ErrorResponse,
            errors::ValidationIssue,
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document as JSON
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(OPENAPI_JSON_PATH, get(|| async { Json(ApiDocV1::openapi()) }))
}
