//! Local web dashboard routes, served in-process over the mock API.

mod common;

use std::time::Duration;

use common::MockBackend;
use enviro_console::dashboard::router;
use serde_json::{json, Value};

async fn start_dashboard(backend: &MockBackend) -> String {
    let app = router(backend.client(), Duration::from_secs(10), None);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ─── Read views ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_healthz_reports_api_url() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;

    let body: Value = reqwest::get(format!("{base}/healthz")).await.unwrap().json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["api_base_url"], backend.base_url.as_str());
}

#[tokio::test]
async fn test_complaints_view_filters_by_query() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;

    let resp = reqwest::get(format!("{base}/view/complaints?q=noise")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["citizen"], "Bob");
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_failed_load_answers_bad_gateway() {
    let backend = MockBackend::start().await;
    backend.with(|s| s.fail_complaints = true);
    let base = start_dashboard(&backend).await;

    let resp = reqwest::get(format!("{base}/view/admin")).await.unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to load complaints. Please try again.");
}

#[tokio::test]
async fn test_stats_view_has_five_cards() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;

    let body: Value = reqwest::get(format!("{base}/view/stats")).await.unwrap().json().await.unwrap();
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["cards"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["cards"][0]["label"], "Pending");
    assert_eq!(body["data"]["cards"][0]["percent"], 50.0);
}

#[tokio::test]
async fn test_audit_detail_and_missing_entry() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;

    let body: Value = reqwest::get(format!("{base}/view/audit/1")).await.unwrap().json().await.unwrap();
    assert_eq!(body["data"]["view"]["kind"], "diff");

    let resp = reqwest::get(format!("{base}/view/audit/99")).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_database_view_omits_audit_table() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;

    let body: Value = reqwest::get(format!("{base}/view/database")).await.unwrap().json().await.unwrap();
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(!names.contains(&"auditlog"));
}

// ─── Actions and forms ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_change_route() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;
    let http = reqwest::Client::new();

    let resp = http
        .put(format!("{base}/view/admin/1/status"))
        .json(&json!({"status": "in progress"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(backend.complaint_status(1).as_deref(), Some("In Progress"));

    let resp = http
        .put(format!("{base}/view/admin/1/status"))
        .json(&json!({"status": "Archived"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_overlapping_status_changes_conflict() {
    let backend = MockBackend::start().await;
    backend.with(|s| s.status_delay = Duration::from_millis(300));
    let base = start_dashboard(&backend).await;
    let http = reqwest::Client::new();

    let first = tokio::spawn({
        let http = http.clone();
        let url = format!("{base}/view/admin/2/status");
        async move { http.put(url).json(&json!({"status": "Resolved"})).send().await.unwrap() }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let before = backend.hits();
    let second = http
        .put(format!("{base}/view/admin/2/status"))
        .json(&json!({"status": "Closed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
    assert_eq!(backend.hits(), before);

    assert_eq!(first.await.unwrap().status(), 200);
    assert_eq!(backend.complaint_status(2).as_deref(), Some("Resolved"));

    // Released once the first update finished.
    let third = http
        .put(format!("{base}/view/admin/2/status"))
        .json(&json!({"status": "Closed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(third.status(), 200);
}

#[tokio::test]
async fn test_delete_route_reports_failure() {
    let backend = MockBackend::start().await;
    backend.with(|s| s.fail_delete = true);
    let base = start_dashboard(&backend).await;

    let resp = reqwest::Client::new()
        .delete(format!("{base}/view/admin/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to delete complaint.");
}

#[tokio::test]
async fn test_form_rejection_sends_nothing_upstream() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;

    let before = backend.hits();
    let resp = reqwest::Client::new()
        .post(format!("{base}/forms/feedback"))
        .json(&json!({"user_id": 7, "complaint_id": 1, "rating": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["message"], "comments is required");
    assert_eq!(backend.hits(), before);
}

#[tokio::test]
async fn test_user_form_created() {
    let backend = MockBackend::start().await;
    let base = start_dashboard(&backend).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/forms/user"))
        .json(&json!({"name": "Dan", "email": "dan@example.org", "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully!");
}
