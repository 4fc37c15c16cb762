#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use budget_admin_api::{build_router, config::AppConfig, db, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper harness for spinning up the application over an in-memory SQLite
/// database. The pool holds exactly one connection, which keeps the memory
/// database alive for the lifetime of the harness.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.db_idle_timeout_secs = 3_600;
        tweak(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON body. `Value::Null` for empty bodies.
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse response body")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        self.request(Method::DELETE, uri, None).await.status()
    }

    /// Serves the router on an ephemeral local port for socket tests.
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .expect("test server failed");
        });
        addr
    }

    pub async fn seed_vendor(&self, ruc: &str, razon_social: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/v1/vendors",
                json!({ "ruc": ruc, "razonSocial": razon_social }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed vendor: {body}");
        body["id"].as_i64().expect("vendor id")
    }

    pub async fn seed_rate(&self, year: i32, rate: f64) -> i64 {
        let (status, body) = self
            .post("/api/v1/exchange-rates", json!({ "year": year, "rate": rate }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed rate: {body}");
        body["id"].as_i64().expect("rate id")
    }

    /// Creates a PEN factura for `vendor_id` and returns its id.
    pub async fn seed_invoice(&self, vendor_id: i64, number: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/v1/invoices",
                json!({
                    "vendorId": vendor_id,
                    "docType": "FACTURA",
                    "number": number,
                    "issueDate": "2025-03-14",
                    "currency": "PEN",
                    "totalForeign": "118.00"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed invoice: {body}");
        body["id"].as_i64().expect("invoice id")
    }
}

/// Issue paths of a 400 body
pub fn issue_paths(body: &Value) -> Vec<String> {
    body["issues"]
        .as_array()
        .map(|issues| {
            issues
                .iter()
                .filter_map(|i| i["path"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
