/// Default API base URL used when neither config nor environment provide one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable carrying the deployment-time API base URL.
pub const API_URL_ENV: &str = "ENVIRO_API_URL";

pub const COMPLAINTS_PATH: &str = "/api/complaints";
pub const USERS_PATH: &str = "/api/users";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const FEEDBACK_PATH: &str = "/api/feedback";
pub const AUDIT_PATH: &str = "/api/audit";
pub const DATABASE_PATH: &str = "/api/database";
pub const COMPLAINT_SUMMARY_PATH: &str = "/api/views/complaint_summary";

/// Table hidden from the raw database view; it has its own audit screen.
pub const AUDIT_TABLE_NAME: &str = "auditlog";

/// Placeholder rendered for absent or null values.
pub const MISSING_PLACEHOLDER: &str = "-";

/// Bucket for complaints whose status is missing or not one of the known five.
pub const UNKNOWN_STATUS_LABEL: &str = "Unknown";

/// Path of a single complaint: `/api/complaints/{id}`.
pub fn complaint_path(complaint_id: i64) -> String {
    format!("{COMPLAINTS_PATH}/{complaint_id}")
}

/// Path of a complaint's status resource: `/api/complaints/{id}/status`.
pub fn complaint_status_path(complaint_id: i64) -> String {
    format!("{COMPLAINTS_PATH}/{complaint_id}/status")
}
