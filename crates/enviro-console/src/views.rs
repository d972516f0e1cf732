//! Screen controllers.
//!
//! Each controller is mounted when its screen opens, fetches what it needs
//! straight from the API, and keeps the results in its own [`ViewSlot`]s.
//! Controllers are cheap to clone so fetches can run on spawned tasks.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use enviro_protocol::*;
use enviro_state::audit_diff::display_value;
use enviro_state::display::{format_date, format_timestamp, or_placeholder, stars};
use enviro_state::xref::{find_label, resolve_optional};
use enviro_state::*;

use crate::api::{ApiClient, ApiError};
use crate::view_slot::{MountToken, ViewSlot};

pub const LOAD_COMPLAINTS_FAILED: &str = "Failed to load complaints. Please try again.";
pub const UPDATE_STATUS_FAILED: &str = "Failed to update status.";
pub const DELETE_FAILED: &str = "Failed to delete complaint.";

/// Screens of the console, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Dashboard,
    Complaints,
    Admin,
    Stats,
    Audit,
    Database,
    Feedback,
    Users,
}

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Dashboard,
        Screen::Complaints,
        Screen::Admin,
        Screen::Stats,
        Screen::Audit,
        Screen::Database,
        Screen::Feedback,
        Screen::Users,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Complaints => "complaints",
            Self::Admin => "admin",
            Self::Stats => "stats",
            Self::Audit => "audit",
            Self::Database => "database",
            Self::Feedback => "feedback",
            Self::Users => "users",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Environmental Portal",
            Self::Complaints => "Complaints",
            Self::Admin => "Admin Complaint Manager",
            Self::Stats => "Complaint Statistics",
            Self::Audit => "Audit Logs",
            Self::Database => "Database Viewer",
            Self::Feedback => "Citizen Feedback",
            Self::Users => "Users",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dashboard => "Overview of every screen and command.",
            Self::Complaints => "Browse complaints with the citizen who filed them.",
            Self::Admin => "Search, update status of, and delete complaints.",
            Self::Stats => "Complaint counts by status, refreshed periodically.",
            Self::Audit => "Track system changes and inspect before/after values.",
            Self::Database => "Direct access to raw database tables.",
            Self::Feedback => "Rate resolutions and read citizen feedback.",
            Self::Users => "Registered citizens, officers and admins.",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('/').to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn next(&self) -> Self {
        let i = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let i = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

// ─── Complaints ──────────────────────────────────────────────────────────────

/// A complaint as displayed in list screens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintRow {
    pub complaint_id: EntityId,
    pub category: String,
    pub description: String,
    pub location: String,
    pub status: String,
    pub submitted: String,
    pub citizen: String,
}

fn complaint_row(complaint: &Complaint, users: &[User]) -> ComplaintRow {
    ComplaintRow {
        complaint_id: complaint.complaint_id,
        category: or_placeholder(complaint.category.as_deref()),
        description: or_placeholder(complaint.description.as_deref()),
        location: or_placeholder(complaint.location.as_deref()),
        status: or_placeholder(complaint.status.as_deref()),
        submitted: format_date(complaint.submitted_at.as_deref()),
        citizen: resolve_optional(complaint.user_id, users),
    }
}

/// Complaints joined with the users who filed them.
#[derive(Debug, Clone)]
pub struct ComplaintListView {
    api: ApiClient,
    token: MountToken,
    pub complaints: ViewSlot<Vec<Complaint>>,
    pub users: ViewSlot<Vec<User>>,
}

impl ComplaintListView {
    pub fn mount(api: ApiClient) -> Self {
        let token = MountToken::new();
        Self {
            complaints: ViewSlot::new(&token),
            users: ViewSlot::new(&token),
            api,
            token,
        }
    }

    pub async fn load(&self) {
        let (complaints, users) = tokio::join!(self.api.list_complaints(), self.api.list_users());
        self.complaints.apply(complaints, LOAD_COMPLAINTS_FAILED).await;
        self.users.apply(users, "Failed to load users.").await;
    }

    pub async fn rows(&self, query: &str) -> Vec<ComplaintRow> {
        let complaints = self.complaints.data_or_default().await;
        let users = self.users.data_or_default().await;
        filter(&complaints, query)
            .into_iter()
            .map(|c| complaint_row(c, &users))
            .collect()
    }

    pub fn unmount(&self) {
        self.token.unmount();
    }
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminActionError {
    #[error("complaint #{0} is already being updated")]
    Busy(EntityId),

    #[error("{0}")]
    Failed(String),
}

/// Complaint ids with a status update on the wire. Share one set between
/// views that must not update the same complaint concurrently.
pub type InFlight = Arc<Mutex<HashSet<EntityId>>>;

/// Marks a complaint as updating; the mark is cleared on drop, including
/// when the request future is cancelled.
struct UpdateClaim {
    set: InFlight,
    complaint_id: EntityId,
}

impl UpdateClaim {
    fn acquire(set: &InFlight, complaint_id: EntityId) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(complaint_id);
        inserted.then(|| Self {
            set: Arc::clone(set),
            complaint_id,
        })
    }
}

impl Drop for UpdateClaim {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.complaint_id);
    }
}

/// Complaint manager: search, status changes, deletion. Local rows change
/// only after the server confirms.
#[derive(Debug, Clone)]
pub struct AdminView {
    api: ApiClient,
    token: MountToken,
    pub complaints: ViewSlot<Vec<Complaint>>,
    updating: InFlight,
}

impl AdminView {
    pub fn mount(api: ApiClient) -> Self {
        Self::mount_with(api, InFlight::default())
    }

    /// Mount against an in-flight set that outlives this view.
    pub fn mount_with(api: ApiClient, updating: InFlight) -> Self {
        let token = MountToken::new();
        Self {
            complaints: ViewSlot::new(&token),
            updating,
            api,
            token,
        }
    }

    pub async fn load(&self) {
        let result = self.api.list_complaints().await;
        self.complaints.apply(result, LOAD_COMPLAINTS_FAILED).await;
    }

    pub async fn rows(&self, query: &str) -> Vec<ComplaintRow> {
        let complaints = self.complaints.data_or_default().await;
        filter(&complaints, query)
            .into_iter()
            .map(|c| complaint_row(c, &[]))
            .collect()
    }

    pub fn is_updating(&self, complaint_id: EntityId) -> bool {
        self.updating
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&complaint_id)
    }

    pub async fn set_status(&self, complaint_id: EntityId, status: ComplaintStatus) -> Result<(), AdminActionError> {
        let claim = UpdateClaim::acquire(&self.updating, complaint_id).ok_or(AdminActionError::Busy(complaint_id))?;
        let result = self.api.update_complaint_status(complaint_id, status.label()).await;
        drop(claim);

        match result {
            Ok(_) => {
                self.complaints
                    .update(|list| {
                        for c in list.iter_mut().filter(|c| c.complaint_id == complaint_id) {
                            c.status = Some(status.label().to_string());
                        }
                    })
                    .await;
                tracing::info!(complaint_id, status = status.label(), "complaint status updated");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(complaint_id, error = %e, "status update failed");
                Err(AdminActionError::Failed(UPDATE_STATUS_FAILED.to_string()))
            }
        }
    }

    pub async fn delete(&self, complaint_id: EntityId) -> Result<(), AdminActionError> {
        match self.api.delete_complaint(complaint_id).await {
            Ok(()) => {
                self.complaints
                    .update(|list| list.retain(|c| c.complaint_id != complaint_id))
                    .await;
                tracing::info!(complaint_id, "complaint deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(complaint_id, error = %e, "delete failed");
                Err(AdminActionError::Failed(DELETE_FAILED.to_string()))
            }
        }
    }

    pub fn unmount(&self) {
        self.token.unmount();
    }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Status counts from the complaint summary view, refreshed on a timer.
#[derive(Debug, Clone)]
pub struct StatsView {
    api: ApiClient,
    token: MountToken,
    pub summary: ViewSlot<StatusSummary>,
    refresh_every: Duration,
}

impl StatsView {
    pub fn mount(api: ApiClient, refresh_every: Duration) -> Self {
        let token = MountToken::new();
        Self {
            summary: ViewSlot::new(&token),
            api,
            token,
            refresh_every,
        }
    }

    pub async fn refresh(&self) {
        let result = self
            .api
            .complaint_summary()
            .await
            .map(|rows| StatusSummary::from_summary_rows(&rows));
        self.summary.apply(result, "Failed to load complaint statistics.").await;
    }

    /// Refresh now and then every period until unmounted. A tick may overlap
    /// a slow request from the previous one; whichever finishes last wins.
    pub fn spawn_refresh(&self) -> tokio::task::JoinHandle<()> {
        let view = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(view.refresh_every);
            loop {
                ticker.tick().await;
                if !view.token.is_mounted() {
                    break;
                }
                let tick_view = view.clone();
                tokio::spawn(async move { tick_view.refresh().await });
            }
            tracing::debug!("stats refresh loop stopped");
        })
    }

    pub fn unmount(&self) {
        self.token.unmount();
    }
}

// ─── Audit log ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub audit_id: EntityId,
    pub time: String,
    pub operation: String,
    pub kind: AuditOperation,
    pub table: String,
    pub primary_key: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditDetail {
    pub row: AuditRow,
    pub view: AuditView,
}

/// `{"complaint_id": 4}` shows as `4`; composite keys as `a, b`.
pub fn format_primary_key(key: &Value) -> String {
    match key {
        Value::Object(map) if !map.is_empty() => map
            .values()
            .map(|v| display_value(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => display_value(Some(other)),
    }
}

fn audit_row(record: &AuditRecord) -> AuditRow {
    AuditRow {
        audit_id: record.audit_id,
        time: format_timestamp(record.changed_at.as_deref()),
        operation: or_placeholder(record.operation.as_deref()),
        kind: record.operation_kind(),
        table: or_placeholder(record.table_name.as_deref()),
        primary_key: format_primary_key(&record.primary_key),
        user: match &record.changed_by {
            None | Some(Value::Null) => "System".to_string(),
            Some(v) => display_value(Some(v)),
        },
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogView {
    api: ApiClient,
    token: MountToken,
    pub records: ViewSlot<Vec<AuditRecord>>,
}

impl AuditLogView {
    pub fn mount(api: ApiClient) -> Self {
        let token = MountToken::new();
        Self {
            records: ViewSlot::new(&token),
            api,
            token,
        }
    }

    pub async fn load(&self) {
        let result = self.api.list_audit().await;
        self.records.apply(result, "Failed to load audit logs.").await;
    }

    pub async fn rows(&self, query: &str) -> Vec<AuditRow> {
        let records = self.records.data_or_default().await;
        filter(&records, query).into_iter().map(audit_row).collect()
    }

    pub async fn detail(&self, audit_id: EntityId) -> Option<AuditDetail> {
        let records = self.records.data_or_default().await;
        records
            .iter()
            .find(|r| r.audit_id == audit_id)
            .map(|r| AuditDetail {
                row: audit_row(r),
                view: render_payload(&r.row_data),
            })
    }

    pub fn unmount(&self) {
        self.token.unmount();
    }
}

// ─── Database ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DatabaseView {
    api: ApiClient,
    token: MountToken,
    pub tables: ViewSlot<Vec<TableView>>,
}

impl DatabaseView {
    pub fn mount(api: ApiClient) -> Self {
        let token = MountToken::new();
        Self {
            tables: ViewSlot::new(&token),
            api,
            token,
        }
    }

    pub async fn load(&self) {
        let result = self.api.database_tables().await.map(visible_tables);
        self.tables.apply(result, "Failed to load database tables.").await;
    }

    pub fn unmount(&self) {
        self.token.unmount();
    }
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackEntry {
    pub feedback_id: EntityId,
    pub citizen: String,
    pub regarding: String,
    pub rating: String,
    pub comments: String,
    pub date: String,
}

/// A selectable option for a form picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: EntityId,
    pub label: String,
}

fn feedback_entry(fb: &Feedback, users: &[User], complaints: &[Complaint]) -> FeedbackEntry {
    let citizen = fb
        .citizen_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| resolve_optional(fb.user_id, users));
    let regarding = fb
        .complaint_category
        .clone()
        .filter(|c| !c.trim().is_empty())
        .or_else(|| {
            fb.complaint_id
                .and_then(|id| find_label(id, complaints))
                .map(str::to_string)
        })
        .unwrap_or_else(|| match fb.complaint_id {
            Some(id) => format!("Complaint #{id}"),
            None => "Complaint".to_string(),
        });
    FeedbackEntry {
        feedback_id: fb.feedback_id,
        citizen,
        regarding,
        rating: stars(fb.rating),
        comments: or_placeholder(fb.comments.as_deref()),
        date: format_date(fb.submitted_at.as_deref()),
    }
}

/// Feedback list plus the pickers of the feedback form. The three fetches
/// are independent: one failing leaves only its own collection empty.
#[derive(Debug, Clone)]
pub struct FeedbackView {
    api: ApiClient,
    token: MountToken,
    pub feedback: ViewSlot<Vec<Feedback>>,
    pub users: ViewSlot<Vec<User>>,
    pub complaints: ViewSlot<Vec<Complaint>>,
}

impl FeedbackView {
    pub fn mount(api: ApiClient) -> Self {
        let token = MountToken::new();
        Self {
            feedback: ViewSlot::new(&token),
            users: ViewSlot::new(&token),
            complaints: ViewSlot::new(&token),
            api,
            token,
        }
    }

    pub async fn load(&self) {
        let (feedback, users, complaints) = tokio::join!(
            self.api.list_feedback(),
            self.api.list_users(),
            self.api.list_complaints()
        );
        self.feedback.apply(feedback, "Failed to load feedback.").await;
        self.users.apply(users, "Failed to load users.").await;
        self.complaints.apply(complaints, LOAD_COMPLAINTS_FAILED).await;
    }

    pub async fn entries(&self, query: &str) -> Vec<FeedbackEntry> {
        let feedback = self.feedback.data_or_default().await;
        let users = self.users.data_or_default().await;
        let complaints = self.complaints.data_or_default().await;
        filter(&feedback, query)
            .into_iter()
            .map(|fb| feedback_entry(fb, &users, &complaints))
            .collect()
    }

    /// Users with the citizen role, for the "who" picker.
    pub async fn citizen_choices(&self) -> Vec<Choice> {
        self.users
            .data_or_default()
            .await
            .iter()
            .filter(|u| u.parsed_role() == Some(UserRole::Citizen))
            .map(|u| Choice {
                id: u.user_id,
                label: or_placeholder(u.name.as_deref()),
            })
            .collect()
    }

    /// `#<id> - <category> (<first 20 chars of description>...)`.
    pub async fn complaint_choices(&self) -> Vec<Choice> {
        self.complaints
            .data_or_default()
            .await
            .iter()
            .map(|c| {
                let description: String = c.description.as_deref().unwrap_or("").chars().take(20).collect();
                Choice {
                    id: c.complaint_id,
                    label: format!(
                        "#{} - {} ({}...)",
                        c.complaint_id,
                        or_placeholder(c.category.as_deref()),
                        description
                    ),
                }
            })
            .collect()
    }

    pub fn unmount(&self) {
        self.token.unmount();
    }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub user_id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub created: String,
}

#[derive(Debug, Clone)]
pub struct UserListView {
    api: ApiClient,
    token: MountToken,
    pub users: ViewSlot<Vec<User>>,
}

impl UserListView {
    pub fn mount(api: ApiClient) -> Self {
        let token = MountToken::new();
        Self {
            users: ViewSlot::new(&token),
            api,
            token,
        }
    }

    pub async fn load(&self) {
        let result = self.api.list_users().await;
        self.users.apply(result, "Failed to load users.").await;
    }

    pub async fn rows(&self, query: &str) -> Vec<UserRow> {
        let users = self.users.data_or_default().await;
        filter(&users, query)
            .into_iter()
            .map(|u| UserRow {
                user_id: u.user_id,
                name: or_placeholder(u.name.as_deref()),
                email: or_placeholder(u.email.as_deref()),
                phone: or_placeholder(u.phone.as_deref()),
                role: or_placeholder(u.role.as_deref()),
                created: format_date(u.created_at.as_deref()),
            })
            .collect()
    }

    pub fn unmount(&self) {
        self.token.unmount();
    }
}

// ─── Forms ───────────────────────────────────────────────────────────────────

/// Validate, send, and report. Nothing is sent when validation fails; the
/// form is cleared only when the server accepts.
pub async fn submit_form<F, T, Fut, S>(form: &mut F, send: S) -> FormOutcome
where
    F: Form,
    S: FnOnce(F::Request) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let request = match form.validate() {
        Ok(request) => request,
        Err(e) => return FormOutcome::Rejected(e.to_string()),
    };
    match send(request).await {
        Ok(_) => {
            form.clear();
            FormOutcome::Submitted(F::SUCCESS_MESSAGE.to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, "form submission failed");
            FormOutcome::Failed(e.user_message(F::FAILURE_FALLBACK))
        }
    }
}

pub async fn submit_complaint(api: &ApiClient, form: &mut ComplaintForm) -> FormOutcome {
    submit_form(form, |req| async move { api.create_complaint(&req).await }).await
}

pub async fn submit_user(api: &ApiClient, form: &mut UserForm) -> FormOutcome {
    submit_form(form, |req| async move { api.register_user(&req).await }).await
}

pub async fn submit_feedback(api: &ApiClient, form: &mut FeedbackForm) -> FormOutcome {
    submit_form(form, |req| async move { api.submit_feedback(&req).await }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn screen_navigation_wraps() {
        assert_eq!(Screen::Users.next(), Screen::Dashboard);
        assert_eq!(Screen::Dashboard.previous(), Screen::Users);
        assert_eq!(Screen::parse("/Audit"), Some(Screen::Audit));
        assert_eq!(Screen::parse("reports"), None);
    }

    #[test]
    fn primary_key_formats() {
        assert_eq!(format_primary_key(&json!({"complaint_id": 4})), "4");
        assert_eq!(format_primary_key(&json!(12)), "12");
        assert_eq!(format_primary_key(&json!(null)), "-");
    }

    #[test]
    fn feedback_entry_falls_back_to_complaint_reference() {
        let fb = Feedback {
            feedback_id: 1,
            user_id: Some(9),
            complaint_id: Some(4),
            rating: Some(4),
            comments: Some("Quick fix".into()),
            submitted_at: None,
            citizen_name: None,
            complaint_category: None,
        };
        let entry = feedback_entry(&fb, &[], &[]);
        assert_eq!(entry.citizen, "Unknown (ID: 9)");
        assert_eq!(entry.regarding, "Complaint #4");
        assert_eq!(entry.rating, "★★★★☆");
    }

    #[test]
    fn audit_row_without_actor_is_system() {
        let record: AuditRecord = serde_json::from_value(json!({
            "audit_id": 3,
            "table_name": "complaints",
            "operation": "UPDATE",
            "primary_key": {"complaint_id": 8},
            "changed_by": null
        }))
        .unwrap();
        let row = audit_row(&record);
        assert_eq!(row.user, "System");
        assert_eq!(row.primary_key, "8");
        assert_eq!(row.kind, AuditOperation::Update);
    }
}
