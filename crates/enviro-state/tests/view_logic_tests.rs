//! End-to-end checks of the view logic over realistic API payloads.

use enviro_protocol::{decode_collection, Complaint, User};
use enviro_state::*;
use serde_json::json;

fn complaints() -> Vec<Complaint> {
    decode_collection(json!([
        {"complaint_id": 1, "user_id": 7, "category": "Water Leakage",
         "description": "Main pipe burst", "location": "Ward 3", "status": "Pending"},
        {"complaint_id": 2, "user_id": 8, "category": "Noise",
         "description": "Generator at night", "location": "Ward 9", "status": "Resolved"}
    ]))
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[test]
fn test_search_is_case_insensitive() {
    let items = complaints();
    for query in ["water", "WATER", "Water"] {
        let hits = filter(&items, query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].complaint_id, 1);
    }
}

// ─── Cross-reference ─────────────────────────────────────────────────────────

#[test]
fn test_resolve_citizen_names() {
    let users: Vec<User> = decode_collection(json!([{"user_id": 7, "name": "Alice"}]));
    assert_eq!(resolve_label(7, &users), "Alice");
    let fallback = resolve_label(8, &users);
    assert!(fallback.contains('8'));

    let none: Vec<User> = Vec::new();
    assert!(resolve_label(7, &none).contains('7'));
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[test]
fn test_same_payload_renders_same_rows() {
    let render = |items: &[Complaint]| -> Vec<String> {
        filter(items, "")
            .iter()
            .map(|c| format!("{}|{:?}|{:?}", c.complaint_id, c.category, c.status))
            .collect()
    };
    assert_eq!(render(&complaints()), render(&complaints()));
}

// ─── Forms ───────────────────────────────────────────────────────────────────

#[test]
fn test_complaint_form_missing_location_rejected() {
    let form = ComplaintForm {
        user_id: "7".into(),
        category: "Water Leakage".into(),
        description: "Main pipe burst".into(),
        location: String::new(),
    };
    assert_eq!(form.validate(), Err(FormError::Missing("location")));
}

// ─── Audit diff ──────────────────────────────────────────────────────────────

#[test]
fn test_update_record_diff() {
    let payload = json!({
        "old": {"complaint_id": 1, "status": "Pending"},
        "new": {"complaint_id": 1, "status": "Closed"}
    });
    match render_payload(&payload) {
        AuditView::Diff { rows } => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].field, "status");
        }
        AuditView::Raw { .. } => panic!("update payload should diff"),
    }
}
