//! Budget Admin API Library
//!
//! Budget and procurement administration backend: catalogs, budget
//! allocations, invoices and purchase orders with audited status workflows,
//! and a WebSocket relay that tells clients when to refetch.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod notifications;
pub mod openapi;
pub mod services;
pub mod tracing;

use std::sync::Arc;

use axum::{routing::get, Router};
use http::HeaderValue;
use tokio::sync::mpsc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::db::DbPool;
use crate::events::EventSender;
use crate::notifications::NotificationHub;
use crate::services::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: Arc<EventSender>,
    pub hub: Arc<NotificationHub>,
    pub services: AppServices,
}

impl AppState {
    /// Wires services, the event channel and the socket hub, and spawns the
    /// event processor that feeds the hub. Needs a running tokio runtime.
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let hub = Arc::new(NotificationHub::new(config.ws_broadcast_capacity));

        tokio::spawn(events::process_events(event_rx, hub.clone()));

        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            config.strict_status_transitions,
        );

        Self {
            db,
            config,
            event_sender,
            hub,
            services,
        }
    }
}

/// Versioned REST surface, mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/exchange-rates",
            handlers::exchange_rates::exchange_rate_routes(),
        )
        .nest("/supports", handlers::supports::support_routes())
        .nest("/vendors", handlers::vendors::vendor_routes())
        .nest("/periods", handlers::periods::period_routes())
        .nest("/budgets", handlers::budgets::budget_routes())
        .nest("/invoices", handlers::invoices::invoice_routes())
        .nest(
            "/purchase-orders",
            handlers::purchase_orders::purchase_order_routes(),
        )
        .nest("/admin", handlers::admin::admin_routes())
}

/// CORS from config: the explicit origin list when one is set, permissive
/// otherwise. Config validation has already rejected the case where neither
/// is allowed.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Full application router: health, socket relay, OpenAPI document and the
/// v1 API, with tracing, compression, CORS and request ids.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .route("/", get(|| async { "budget-admin-api up" }))
        .nest("/health", health::health_routes())
        .route("/ws", get(notifications::ws_handler))
        .merge(openapi::openapi_routes())
        .nest("/api/v1", api_v1_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
