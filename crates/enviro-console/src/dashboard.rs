//! Local web dashboard.
//!
//! Serves each console screen as JSON under `/view/...` plus the form and
//! admin actions, and optionally a static web UI from `web_root`. Every
//! request mounts a fresh controller, loads it, and tears it down.

use std::path::PathBuf;
use std::time::Duration;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::services::{ServeDir, ServeFile};

use enviro_protocol::{ComplaintStatus, EntityId};
use enviro_state::{ComplaintForm, FeedbackForm, FormOutcome, UserForm};

use crate::api::ApiClient;
use crate::config::ConsoleConfig;
use crate::view_slot::ViewSlot;
use crate::views::{
    self, AdminActionError, AdminView, AuditLogView, ComplaintListView, DatabaseView, FeedbackView, InFlight,
    StatsView, UserListView,
};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Action(#[from] AdminActionError),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Action(AdminActionError::Busy(_)) => StatusCode::CONFLICT,
            Self::Action(AdminActionError::Failed(_)) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Clone)]
struct WebState {
    api: ApiClient,
    stats_refresh: Duration,
    /// Status updates on the wire, shared by every request.
    updating: InFlight,
}

pub struct Dashboard {
    bind_addr: String,
    api: ApiClient,
    stats_refresh: Duration,
    web_root: Option<PathBuf>,
}

impl Dashboard {
    pub fn new(config: &ConsoleConfig, api: ApiClient) -> Self {
        Self {
            bind_addr: config.dashboard_bind.clone(),
            api,
            stats_refresh: config.stats_refresh(),
            web_root: config.web_root.clone(),
        }
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        let app = router(self.api.clone(), self.stats_refresh, self.web_root.clone());
        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(
            addr = %self.bind_addr,
            api = %self.api.base_url(),
            web_root = ?self.web_root,
            "web dashboard listening"
        );
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Build the dashboard routes. `web_root`, when set, serves a static UI
/// with `index.html` as the fallback page.
pub fn router(api: ApiClient, stats_refresh: Duration, web_root: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/view/complaints", get(view_complaints))
        .route("/view/admin", get(view_admin))
        .route("/view/admin/:id/status", put(admin_set_status))
        .route("/view/admin/:id", delete(admin_delete))
        .route("/view/stats", get(view_stats))
        .route("/view/audit", get(view_audit))
        .route("/view/audit/:id", get(view_audit_detail))
        .route("/view/database", get(view_database))
        .route("/view/feedback", get(view_feedback))
        .route("/view/users", get(view_users))
        .route("/forms/complaint", post(form_complaint))
        .route("/forms/user", post(form_user))
        .route("/forms/feedback", post(form_feedback));

    let app = match web_root {
        Some(root) => {
            let index_file = root.join("index.html");
            app.fallback_service(ServeDir::new(root).not_found_service(ServeFile::new(index_file)))
        }
        None => app.fallback(not_found),
    };

    app.with_state(WebState {
        api,
        stats_refresh,
        updating: InFlight::default(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// A screen's data plus the error its screen would show. A failed load
/// answers 502 with whatever data is available (usually none).
#[derive(Debug, Serialize)]
struct ViewBody<T> {
    data: T,
    error: Option<String>,
}

fn respond<T: Serialize>(data: T, error: Option<String>) -> Response {
    let status = if error.is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (status, Json(ViewBody { data, error })).into_response()
}

async fn slot_error<T: Clone>(slot: &ViewSlot<T>) -> Option<String> {
    slot.snapshot().await.error
}

async fn healthz(State(web): State<WebState>) -> Json<Value> {
    Json(json!({ "ok": true, "api_base_url": web.api.base_url() }))
}

async fn not_found() -> DashboardError {
    DashboardError::NotFound("no such route".to_string())
}

async fn view_complaints(State(web): State<WebState>, Query(params): Query<SearchParams>) -> Response {
    let view = ComplaintListView::mount(web.api.clone());
    view.load().await;
    let error = slot_error(&view.complaints).await;
    let rows = view.rows(&params.q).await;
    view.unmount();
    respond(rows, error)
}

async fn view_admin(State(web): State<WebState>, Query(params): Query<SearchParams>) -> Response {
    let view = AdminView::mount(web.api.clone());
    view.load().await;
    let error = slot_error(&view.complaints).await;
    let rows = view.rows(&params.q).await;
    view.unmount();
    respond(rows, error)
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

async fn admin_set_status(
    State(web): State<WebState>,
    AxumPath(id): AxumPath<EntityId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Value>, DashboardError> {
    let status = ComplaintStatus::parse(&body.status)
        .ok_or_else(|| DashboardError::BadRequest(format!("unknown status '{}'", body.status)))?;
    let view = AdminView::mount_with(web.api.clone(), web.updating.clone());
    let result = view.set_status(id, status).await;
    view.unmount();
    result?;
    Ok(Json(json!({ "complaint_id": id, "status": status.label() })))
}

async fn admin_delete(
    State(web): State<WebState>,
    AxumPath(id): AxumPath<EntityId>,
) -> Result<StatusCode, DashboardError> {
    let view = AdminView::mount(web.api.clone());
    let result = view.delete(id).await;
    view.unmount();
    result?;
    Ok(StatusCode::NO_CONTENT)
}

async fn view_stats(State(web): State<WebState>) -> Response {
    let view = StatsView::mount(web.api.clone(), web.stats_refresh);
    view.refresh().await;
    let snap = view.summary.snapshot().await;
    view.unmount();
    let summary = snap.data.unwrap_or_default();
    let body = json!({
        "total": summary.total,
        "unknown": summary.unknown(),
        "cards": summary.cards(),
    });
    respond(body, snap.error)
}

async fn view_audit(State(web): State<WebState>, Query(params): Query<SearchParams>) -> Response {
    let view = AuditLogView::mount(web.api.clone());
    view.load().await;
    let error = slot_error(&view.records).await;
    let rows = view.rows(&params.q).await;
    view.unmount();
    respond(rows, error)
}

async fn view_audit_detail(
    State(web): State<WebState>,
    AxumPath(id): AxumPath<EntityId>,
) -> Result<Response, DashboardError> {
    let view = AuditLogView::mount(web.api.clone());
    view.load().await;
    let error = slot_error(&view.records).await;
    let detail = view.detail(id).await;
    view.unmount();
    match (detail, error) {
        (Some(detail), _) => Ok(respond(detail, None)),
        (None, Some(error)) => Ok(respond(Value::Null, Some(error))),
        (None, None) => Err(DashboardError::NotFound(format!("no audit entry #{id}"))),
    }
}

async fn view_database(State(web): State<WebState>) -> Response {
    let view = DatabaseView::mount(web.api.clone());
    view.load().await;
    let error = slot_error(&view.tables).await;
    let tables = view.tables.data_or_default().await;
    view.unmount();
    respond(tables, error)
}

async fn view_feedback(State(web): State<WebState>, Query(params): Query<SearchParams>) -> Response {
    let view = FeedbackView::mount(web.api.clone());
    view.load().await;
    let error = slot_error(&view.feedback).await;
    let body = json!({
        "entries": view.entries(&params.q).await,
        "citizens": view.citizen_choices().await,
        "complaints": view.complaint_choices().await,
    });
    view.unmount();
    respond(body, error)
}

async fn view_users(State(web): State<WebState>, Query(params): Query<SearchParams>) -> Response {
    let view = UserListView::mount(web.api.clone());
    view.load().await;
    let error = slot_error(&view.users).await;
    let rows = view.rows(&params.q).await;
    view.unmount();
    respond(rows, error)
}

/// Form field as typed: strings verbatim, numbers as digits, null as blank.
fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn outcome_response(outcome: FormOutcome) -> (StatusCode, Json<FormOutcome>) {
    let status = match &outcome {
        FormOutcome::Submitted(_) => StatusCode::CREATED,
        FormOutcome::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FormOutcome::Failed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComplaintFormBody {
    user_id: Value,
    category: Value,
    description: Value,
    location: Value,
}

async fn form_complaint(
    State(web): State<WebState>,
    Json(body): Json<ComplaintFormBody>,
) -> (StatusCode, Json<FormOutcome>) {
    let mut form = ComplaintForm {
        user_id: text(&body.user_id),
        category: text(&body.category),
        description: text(&body.description),
        location: text(&body.location),
    };
    outcome_response(views::submit_complaint(&web.api, &mut form).await)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserFormBody {
    name: Value,
    email: Value,
    phone: Value,
    role: Value,
    password: Value,
}

async fn form_user(State(web): State<WebState>, Json(body): Json<UserFormBody>) -> (StatusCode, Json<FormOutcome>) {
    let mut form = UserForm {
        name: text(&body.name),
        email: text(&body.email),
        phone: text(&body.phone),
        role: text(&body.role),
        password: text(&body.password),
    };
    outcome_response(views::submit_user(&web.api, &mut form).await)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedbackFormBody {
    user_id: Value,
    complaint_id: Value,
    rating: Value,
    comments: Value,
}

async fn form_feedback(
    State(web): State<WebState>,
    Json(body): Json<FeedbackFormBody>,
) -> (StatusCode, Json<FormOutcome>) {
    let mut form = FeedbackForm {
        user_id: text(&body.user_id),
        complaint_id: text(&body.complaint_id),
        comments: text(&body.comments),
        ..FeedbackForm::default()
    };
    if let Err(e) = form.set_rating(&text(&body.rating)) {
        return outcome_response(FormOutcome::Rejected(e.to_string()));
    }
    outcome_response(views::submit_feedback(&web.api, &mut form).await)
}
