mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{issue_paths, TestApp};

async fn legacy_order(app: &TestApp, number: &str, proveedor: Option<&str>, ruc: Option<&str>) -> i64 {
    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            json!({
                "number": number,
                "description": "Servicio de mantenimiento",
                "proveedor": proveedor,
                "ruc": ruc,
                "amount": "2500.00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "legacy order: {body}");
    body["id"].as_i64().unwrap()
}

async fn backfill(app: &TestApp, dry_run: bool) -> Value {
    let (status, report) = app
        .post(
            &format!("/api/v1/admin/vendors/backfill?dryRun={dry_run}"),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{report}");
    report
}

#[tokio::test]
async fn linked_orders_report_the_vendor_not_legacy_columns() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme SAC").await;

    let legacy_id = legacy_order(&app, "OC-1", Some("Acme antiguo"), Some("20100000001")).await;
    let (_, legacy) = app.get(&format!("/api/v1/purchase-orders/{legacy_id}")).await;
    assert_eq!(legacy["vendorLinked"], false);
    assert_eq!(legacy["proveedor"], "Acme antiguo");
    assert!(legacy["proveedorId"].is_null());
    assert_eq!(legacy["estado"], "PENDING");
    assert_eq!(legacy["currency"], "PEN");

    let (status, linked) = app
        .post(
            "/api/v1/purchase-orders",
            json!({
                "number": "OC-2",
                "proveedorId": vendor_id,
                "proveedor": "Ignored SAC",
                "ruc": "20999999999",
                "currency": "USD",
                "amount": "10.00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{linked}");
    assert_eq!(linked["vendorLinked"], true);
    assert_eq!(linked["proveedor"], "Acme SAC");
    assert_eq!(linked["ruc"], "20100000001");
    assert_eq!(linked["currency"], "USD");

    let (status, orders) = app
        .get(&format!("/api/v1/purchase-orders?proveedorId={vendor_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["number"], "OC-2");
}

#[tokio::test]
async fn updating_a_linked_order_ignores_legacy_fields() {
    let app = TestApp::new().await;
    let acme = app.seed_vendor("20100000001", "Acme SAC").await;
    let beta = app.seed_vendor("20100000002", "Beta SAC").await;

    let (_, created) = app
        .post(
            "/api/v1/purchase-orders",
            json!({ "number": "OC-7", "proveedorId": acme, "amount": "50" }),
        )
        .await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/v1/purchase-orders/{id}");

    let (status, updated) = app
        .put(
            &uri,
            json!({ "number": "OC-7", "proveedor": "Other SAC", "ruc": "20555555555", "amount": "75" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["proveedorId"].as_i64(), Some(acme));
    assert_eq!(updated["proveedor"], "Acme SAC");
    assert_eq!(updated["ruc"], "20100000001");

    let (status, moved) = app
        .put(
            &uri,
            json!({ "number": "OC-7", "proveedorId": beta, "amount": "75" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["proveedor"], "Beta SAC");
}

#[tokio::test]
async fn unknown_vendor_and_duplicate_numbers_are_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            json!({ "number": "OC-1", "proveedorId": 404, "amount": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(issue_paths(&body), ["proveedorId"]);

    legacy_order(&app, "OC-1", None, None).await;
    let (status, _) = app
        .post(
            "/api/v1/purchase-orders",
            json!({ "number": "OC-1", "amount": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            json!({ "number": "OC-2", "amount": "-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(issue_paths(&body), ["amount"]);
}

#[tokio::test]
async fn status_changes_are_audited() {
    let app = TestApp::new().await;
    let id = legacy_order(&app, "OC-5", Some("Acme"), Some("20100000001")).await;
    let uri = format!("/api/v1/purchase-orders/{id}/status");

    let (status, order) = app
        .patch(&uri, json!({ "status": "APPROVED", "note": "visto bueno" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["estado"], "APPROVED");

    let (status, _) = app.patch(&uri, json!({ "status": "CLOSED" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.patch(&uri, json!({ "status": "CANCELLED" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, history) = app
        .get(&format!("/api/v1/purchase-orders/{id}/history"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let statuses: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, ["PENDING", "APPROVED", "CANCELLED"]);
    assert_eq!(history[1]["note"], "visto bueno");
    assert_eq!(history[2]["previousStatus"], "APPROVED");

    let (_, cancelled) = app.get("/api/v1/purchase-orders?estado=CANCELLED").await;
    assert_eq!(cancelled.as_array().unwrap().len(), 1);

    assert_eq!(
        app.delete(&format!("/api/v1/purchase-orders/{id}")).await,
        StatusCode::NO_CONTENT
    );
    let (status, _) = app
        .get(&format!("/api/v1/purchase-orders/{id}/history"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn backfill_dry_run_changes_nothing() {
    let app = TestApp::new().await;
    let id = legacy_order(&app, "OC-1", Some("Acme SAC"), Some("20100000001")).await;

    let report = backfill(&app, true).await;
    assert_eq!(report["dryRun"], true);
    assert_eq!(report["scanned"], 1);
    assert_eq!(report["vendorsCreated"], 1);
    assert_eq!(report["ordersLinked"], 1);

    let (_, vendors) = app.get("/api/v1/vendors").await;
    assert!(vendors.as_array().unwrap().is_empty());
    let (_, order) = app.get(&format!("/api/v1/purchase-orders/{id}")).await;
    assert_eq!(order["vendorLinked"], false);
}

#[tokio::test]
async fn backfill_creates_links_and_is_idempotent() {
    let app = TestApp::new().await;
    let first = legacy_order(&app, "OC-1", Some("Acme SAC"), Some("20100000001")).await;
    let second = legacy_order(&app, "OC-2", None, Some(" 20100000001 ")).await;
    let third = legacy_order(&app, "OC-3", Some("Beta SAC"), Some("20100000002")).await;
    let orphan = legacy_order(&app, "OC-4", Some("Sin RUC"), None).await;

    let report = backfill(&app, false).await;
    assert_eq!(report["dryRun"], false);
    assert_eq!(report["scanned"], 4);
    assert_eq!(report["vendorsCreated"], 2);
    assert_eq!(report["vendorsReused"], 0);
    assert_eq!(report["ordersLinked"], 3);
    assert_eq!(report["skippedWithoutRuc"], 1);

    let (status, acme) = app.get("/api/v1/vendors/ruc/20100000001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acme["razonSocial"], "Acme SAC");

    for id in [first, second] {
        let (_, order) = app.get(&format!("/api/v1/purchase-orders/{id}")).await;
        assert_eq!(order["proveedorId"], acme["id"]);
        assert_eq!(order["vendorLinked"], true);
    }
    let (_, order) = app.get(&format!("/api/v1/purchase-orders/{third}")).await;
    assert_eq!(order["proveedor"], "Beta SAC");
    let (_, order) = app.get(&format!("/api/v1/purchase-orders/{orphan}")).await;
    assert_eq!(order["vendorLinked"], false);

    let again = backfill(&app, false).await;
    assert_eq!(again["vendorsCreated"], 0);
    assert_eq!(again["ordersLinked"], 0);
    assert_eq!(again["scanned"], 1);
    assert_eq!(again["skippedWithoutRuc"], 1);
}

#[tokio::test]
async fn backfill_reuses_existing_vendors() {
    let app = TestApp::new().await;
    let vendor_id = app.seed_vendor("20100000001", "Acme Registrada SAC").await;
    let id = legacy_order(&app, "OC-1", Some("Acme"), Some("20100000001")).await;

    let report = backfill(&app, false).await;
    assert_eq!(report["vendorsCreated"], 0);
    assert_eq!(report["vendorsReused"], 1);
    assert_eq!(report["ordersLinked"], 1);

    let (_, order) = app.get(&format!("/api/v1/purchase-orders/{id}")).await;
    assert_eq!(order["proveedorId"].as_i64(), Some(vendor_id));
    assert_eq!(order["proveedor"], "Acme Registrada SAC");
}

#[tokio::test]
async fn blank_numbers_are_rejected_after_trimming() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            json!({ "number": "   ", "amount": "10" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(issue_paths(&body), ["number"]);

    let (_, orders) = app.get("/api/v1/purchase-orders").await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn backfill_skips_malformed_rucs() {
    let app = TestApp::new().await;
    let id = legacy_order(&app, "OC-1", Some("Letras SAC"), Some("ABC")).await;

    let report = backfill(&app, false).await;
    assert_eq!(report["scanned"], 1);
    assert_eq!(report["vendorsCreated"], 0);
    assert_eq!(report["ordersLinked"], 0);
    assert_eq!(report["skippedInvalidRuc"], 1);
    assert_eq!(report["skippedWithoutRuc"], 0);

    let (_, vendors) = app.get("/api/v1/vendors").await;
    assert!(vendors.as_array().unwrap().is_empty());
    let (_, order) = app.get(&format!("/api/v1/purchase-orders/{id}")).await;
    assert_eq!(order["vendorLinked"], false);
    assert_eq!(order["ruc"], "ABC");
}
