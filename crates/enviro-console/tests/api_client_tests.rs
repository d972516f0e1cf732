//! ApiClient against an in-process mock of the complaint API.

mod common;

use std::time::Duration;

use common::MockBackend;
use enviro_console::{ApiClient, ApiError};
use enviro_protocol::{NewComplaint, UserRegistration};

// ─── Collections ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_complaints_decodes_every_record() {
    let backend = MockBackend::start().await;
    let complaints = backend.client().list_complaints().await.unwrap();
    assert_eq!(complaints.len(), 3);
    assert_eq!(complaints[1].status.as_deref(), Some("In Progress"));
}

#[tokio::test]
async fn test_enveloped_users_are_unwrapped() {
    let backend = MockBackend::start().await;
    let users = backend.client().list_users().await.unwrap();
    let names: Vec<_> = users.iter().filter_map(|u| u.name.as_deref()).collect();
    assert_eq!(names, ["Alice", "Bob", "Carol"]);
}

#[tokio::test]
async fn test_malformed_record_is_skipped_not_fatal() {
    let backend = MockBackend::start().await;
    backend.with(|s| s.complaints.push(serde_json::json!({"category": "no id"})));
    let complaints = backend.client().list_complaints().await.unwrap();
    assert_eq!(complaints.len(), 3);
}

#[tokio::test]
async fn test_database_returns_every_table() {
    let backend = MockBackend::start().await;
    let tables = backend.client().database_tables().await.unwrap();
    let names: Vec<_> = tables.iter().map(|(n, _)| n.as_str()).collect();
    assert!(names.contains(&"auditlog"));
    assert!(names.contains(&"users"));
}

// ─── Mutations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_complaint_returns_created_record() {
    let backend = MockBackend::start().await;
    let created = backend
        .client()
        .create_complaint(&NewComplaint {
            user_id: 7,
            category: "Air Pollution".into(),
            description: "Smoke from factory".into(),
            location: "Ward 1".into(),
        })
        .await
        .unwrap()
        .expect("created record in body");
    assert_eq!(created.category.as_deref(), Some("Air Pollution"));
    assert_eq!(created.status.as_deref(), Some("Pending"));
}

#[tokio::test]
async fn test_status_update_and_delete() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let updated = client.update_complaint_status(1, "Resolved").await.unwrap().unwrap();
    assert_eq!(updated.status.as_deref(), Some("Resolved"));
    assert_eq!(backend.complaint_status(1).as_deref(), Some("Resolved"));

    client.delete_complaint(1).await.unwrap();
    assert_eq!(backend.complaint_status(1), None);
}

#[tokio::test]
async fn test_acknowledgement_body_still_counts_as_success() {
    let backend = MockBackend::start().await;
    backend.with(|s| s.bare_status_ack = true);

    let updated = backend.client().update_complaint_status(2, "Closed").await.unwrap();
    assert!(updated.is_none());
    assert_eq!(backend.complaint_status(2).as_deref(), Some("Closed"));
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_server_detail_is_carried_in_error() {
    let backend = MockBackend::start().await;
    let err = backend
        .client()
        .register_user(&UserRegistration {
            name: "Alice Again".into(),
            email: "alice@example.org".into(),
            phone: None,
            role: "citizen".into(),
            password: "pw".into(),
        })
        .await
        .unwrap_err();
    match err {
        ApiError::Server { status, ref message } => {
            assert_eq!(status, 400);
            assert_eq!(message.as_deref(), Some("Email already registered"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_detail_becomes_user_message() {
    let backend = MockBackend::start().await;
    backend.with(|s| s.fail_status = true);
    let err = backend.client().update_complaint_status(1, "Closed").await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert_eq!(err.user_message("Failed to update status."), "update failed");
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let err = client.list_complaints().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(err.user_message("Failed to load complaints. Please try again."), "Failed to load complaints. Please try again.");
}
