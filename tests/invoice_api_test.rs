mod common;

use axum::http::{header, Method, StatusCode};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};
use std::str::FromStr;

use budget_admin_api::entities::invoice_status_history;
use common::{issue_paths, TestApp};

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("decimal")
}

fn invoice_body(vendor_id: i64, number: &str, currency: &str, total: &str) -> Value {
    json!({
        "vendorId": vendor_id,
        "docType": "FACTURA",
        "number": number,
        "issueDate": "2025-03-14",
        "currency": currency,
        "totalForeign": total
    })
}

async fn history_rows(app: &TestApp, invoice_id: i64) -> u64 {
    invoice_status_history::Entity::find()
        .filter(invoice_status_history::Column::InvoiceId.eq(invoice_id as i32))
        .count(&*app.state.db)
        .await
        .expect("count history")
}

#[tokio::test]
async fn create_normalizes_number_and_starts_received() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;

    let (status, invoice) = app
        .post(
            "/api/v1/invoices",
            invoice_body(vendor_id, " f001-000123 ", "PEN", "118.00"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(invoice["numberNorm"], "F001-123");
    assert_eq!(invoice["statusCurrent"], "RECEIVED");
    assert_eq!(decimal(&invoice["totalLocal"]), decimal(&invoice["totalForeign"]));

    let id = invoice["id"].as_i64().unwrap();
    let (status, history) = app.get(&format!("/api/v1/invoices/{id}/history")).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "RECEIVED");
    assert!(history[0]["previousStatus"].is_null());
}

#[tokio::test]
async fn duplicate_after_normalization_conflicts() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;
    let other_vendor = app.seed_vendor("20100000002", "Beta SAC").await;

    app.seed_invoice(vendor_id, "F001-000123").await;

    let (status, body) = app
        .post(
            "/api/v1/invoices",
            invoice_body(vendor_id, "f001-123", "PEN", "10.00"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Same printed number from another vendor is a different document
    let (status, _) = app
        .post(
            "/api/v1/invoices",
            invoice_body(other_vendor, "F001-123", "PEN", "10.00"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // So is a different document type from the same vendor
    let mut boleta = invoice_body(vendor_id, "F001-123", "PEN", "10.00");
    boleta["docType"] = json!("BOLETA");
    let (status, _) = app.post("/api/v1/invoices", boleta).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn usd_totals_convert_with_the_issue_year_rate() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;

    let (status, body) = app
        .post(
            "/api/v1/invoices",
            invoice_body(vendor_id, "F001-1", "USD", "100.00"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(issue_paths(&body), ["issueDate"]);

    app.seed_rate(2025, 3.745).await;

    let (status, invoice) = app
        .post(
            "/api/v1/invoices",
            invoice_body(vendor_id, "F001-1", "USD", "10.01"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(
        decimal(&invoice["totalLocal"]),
        Decimal::from_str("37.49").unwrap()
    );

    let mut explicit = invoice_body(vendor_id, "F001-2", "USD", "10.00");
    explicit["totalLocal"] = json!("40.00");
    let (status, invoice) = app.post("/api/v1/invoices", explicit).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        decimal(&invoice["totalLocal"]),
        Decimal::from_str("40").unwrap()
    );
}

#[tokio::test]
async fn unknown_references_and_blank_numbers_are_rejected() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;

    let (status, body) = app
        .post("/api/v1/invoices", invoice_body(999, "F001-1", "PEN", "1.00"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(issue_paths(&body), ["vendorId"]);

    let mut with_oc = invoice_body(vendor_id, "F001-1", "PEN", "1.00");
    with_oc["ocId"] = json!(77);
    let (status, body) = app.post("/api/v1/invoices", with_oc).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(issue_paths(&body), ["ocId"]);

    let (status, body) = app
        .post(
            "/api/v1/invoices",
            invoice_body(vendor_id, "   ", "PEN", "1.00"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(issue_paths(&body), ["number"]);

    let (status, body) = app
        .post(
            "/api/v1/invoices",
            invoice_body(vendor_id, "F001-9", "PEN", "-5"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(issue_paths(&body), ["totalForeign"]);
}

#[tokio::test]
async fn status_walks_the_workflow_with_history() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;
    let id = app.seed_invoice(vendor_id, "F001-7").await;
    let uri = format!("/api/v1/invoices/{id}/status");

    for status in [
        "IN_APPROVAL",
        "IN_ACCOUNTING",
        "IN_TREASURY",
        "AWAITING_PAYMENT",
        "PAID",
    ] {
        let (code, invoice) = app
            .patch(&uri, json!({ "status": status, "note": "ok" }))
            .await;
        assert_eq!(code, StatusCode::OK, "{status}: {invoice}");
        assert_eq!(invoice["statusCurrent"], status);
    }

    let (_, history) = app.get(&format!("/api/v1/invoices/{id}/history")).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 6);
    assert_eq!(history[5]["status"], "PAID");
    assert_eq!(history[5]["previousStatus"], "AWAITING_PAYMENT");
    assert_eq!(history[5]["note"], "ok");

    // PAID is terminal
    let (code, body) = app.patch(&uri, json!({ "status": "REJECTED" })).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("terminal"));
    assert_eq!(history_rows(&app, id).await, 6);
}

#[tokio::test]
async fn illegal_transition_leaves_no_history_row() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;
    let id = app.seed_invoice(vendor_id, "F001-8").await;
    let uri = format!("/api/v1/invoices/{id}/status");

    let (code, _) = app.patch(&uri, json!({ "status": "PAID" })).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, _) = app.patch(&uri, json!({ "status": "RECEIVED" })).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, _) = app.patch(&uri, json!({ "status": "SHIPPED" })).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    assert_eq!(history_rows(&app, id).await, 1);
    let (_, invoice) = app.get(&format!("/api/v1/invoices/{id}")).await;
    assert_eq!(invoice["statusCurrent"], "RECEIVED");

    // Reject then reopen
    let (code, _) = app.patch(&uri, json!({ "status": "REJECTED" })).await;
    assert_eq!(code, StatusCode::OK);
    let (code, _) = app.patch(&uri, json!({ "status": "RECEIVED" })).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(history_rows(&app, id).await, 3);

    let (code, _) = app
        .patch("/api/v1/invoices/999/status", json!({ "status": "IN_APPROVAL" }))
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lenient_mode_allows_jumps_but_not_repeats() {
    let app = TestApp::with_config(|cfg| cfg.strict_status_transitions = false).await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;
    let id = app.seed_invoice(vendor_id, "F001-9").await;
    let uri = format!("/api/v1/invoices/{id}/status");

    let (code, _) = app.patch(&uri, json!({ "status": "PAID" })).await;
    assert_eq!(code, StatusCode::OK);
    let (code, _) = app.patch(&uri, json!({ "status": "PAID" })).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(history_rows(&app, id).await, 2);
}

#[tokio::test]
async fn update_keeps_status_and_delete_removes_history() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;
    let id = app.seed_invoice(vendor_id, "F001-10").await;

    app.patch(
        &format!("/api/v1/invoices/{id}/status"),
        json!({ "status": "IN_APPROVAL" }),
    )
    .await;

    let mut body = invoice_body(vendor_id, "F001-0011", "PEN", "200.00");
    body["status"] = json!("PAID");
    let (code, invoice) = app.put(&format!("/api/v1/invoices/{id}"), body).await;
    assert_eq!(code, StatusCode::OK, "{invoice}");
    assert_eq!(invoice["numberNorm"], "F001-11");
    assert_eq!(invoice["statusCurrent"], "IN_APPROVAL");

    assert_eq!(
        app.delete(&format!("/api/v1/invoices/{id}")).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(history_rows(&app, id).await, 0);
    let (code, _) = app.get(&format!("/api/v1/invoices/{id}/history")).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(
        app.delete(&format!("/api/v1/invoices/{id}")).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn list_filters_by_status_and_vendor() {
    let app = TestApp::new().await;
    let acme = app.seed_vendor("20100000001", "Acme SAC").await;
    let beta = app.seed_vendor("20100000002", "Beta SAC").await;
    let first = app.seed_invoice(acme, "F001-1").await;
    app.seed_invoice(acme, "F001-2").await;
    app.seed_invoice(beta, "F001-1").await;

    app.patch(
        &format!("/api/v1/invoices/{first}/status"),
        json!({ "status": "IN_APPROVAL" }),
    )
    .await;

    let (_, all) = app.get("/api/v1/invoices").await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, acme_only) = app.get(&format!("/api/v1/invoices?vendorId={acme}")).await;
    assert_eq!(acme_only.as_array().unwrap().len(), 2);

    let (_, approving) = app.get("/api/v1/invoices?status=IN_APPROVAL").await;
    let approving = approving.as_array().unwrap();
    assert_eq!(approving.len(), 1);
    assert_eq!(approving[0]["id"].as_i64(), Some(first));
}

#[tokio::test]
async fn unknown_status_filter_is_a_json_validation_error() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/invoices?status=BOGUS", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let (status, body) = app.get("/api/v1/invoices?status=BOGUS").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(issue_paths(&body), ["query"]);
}

#[tokio::test]
async fn csv_export_has_header_and_one_row_per_invoice() {
    let app = TestApp::new().await;
    let acme = app.seed_vendor("20100000001", "Acme, Peru SAC").await;
    let beta = app.seed_vendor("20100000002", "Beta SAC").await;
    app.seed_invoice(acme, "F001-1").await;
    app.seed_invoice(beta, "F001-2").await;

    let response = app
        .request(Method::GET, "/api/v1/invoices/export/csv", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("attachment"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let mut reader = csv::Reader::from_reader(bytes.as_ref());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "id");
    assert_eq!(&headers[1], "vendor_ruc");
    assert_eq!(&headers[9], "status");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "20100000001");
    assert_eq!(&rows[0][2], "Acme, Peru SAC");
    assert_eq!(&rows[0][4], "F001-1");
    assert_eq!(&rows[0][9], "RECEIVED");

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/invoices/export/csv?vendorId={beta}"),
            None,
        )
        .await;
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(body.lines().count(), 2);
    assert!(body.contains("Beta SAC"));
}
