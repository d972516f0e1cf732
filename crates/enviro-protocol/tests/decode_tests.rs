use enviro_protocol::*;
use serde_json::json;

#[test]
fn test_bare_array_and_envelope_decode_identically() {
    let bare = json!([{"audit_id": 1, "table_name": "complaints"}]);
    let wrapped = json!({"data": [{"audit_id": 1, "table_name": "complaints"}]});

    let a: Vec<AuditRecord> = decode_collection(bare);
    let b: Vec<AuditRecord> = decode_collection(wrapped);
    assert_eq!(a, b);
    assert_eq!(a.len(), 1);
}

#[test]
fn test_envelope_without_data_is_empty() {
    let records: Vec<AuditRecord> = decode_collection(json!({"detail": "oops"}));
    assert!(records.is_empty());
}

#[test]
fn test_scalar_body_is_empty() {
    let users: Vec<User> = decode_collection(json!("not a list"));
    assert!(users.is_empty());
}

#[test]
fn test_malformed_records_are_skipped() {
    let body = json!([
        {"complaint_id": 1, "category": "Noise"},
        {"category": "missing id"},
        {"complaint_id": "seven"},
        {"complaint_id": 3, "status": null}
    ]);
    let complaints: Vec<Complaint> = decode_collection(body);
    let ids: Vec<i64> = complaints.iter().map(|c| c.complaint_id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_summary_rows_never_rejected() {
    let rows: Vec<ComplaintSummaryRow> = decode_collection(json!([{}, {"status": "Pending"}]));
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_decode_record_reports_entity() {
    let err = decode_record::<Complaint>("complaint", json!({"category": "x"})).unwrap_err();
    assert!(err.to_string().contains("complaint"));
}

#[test]
fn test_decode_tables() {
    let body = json!({
        "users": [{"user_id": 1}],
        "broken": {"not": "rows"}
    });
    let tables = decode_tables(body).unwrap();
    assert_eq!(tables.len(), 2);
    let broken = tables.iter().find(|(name, _)| name == "broken").unwrap();
    assert!(broken.1.is_empty());
    assert!(decode_tables(json!([1, 2])).is_err());
}

#[test]
fn test_endpoint_paths() {
    assert_eq!(complaint_path(12), "/api/complaints/12");
    assert_eq!(complaint_status_path(12), "/api/complaints/12/status");
}
