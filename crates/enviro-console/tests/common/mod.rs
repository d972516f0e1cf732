//! In-process stand-in for the complaint API.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use enviro_console::ApiClient;

#[derive(Debug, Default)]
pub struct MockState {
    pub complaints: Vec<Value>,
    pub users: Vec<Value>,
    pub feedback: Vec<Value>,
    pub audit: Vec<Value>,
    pub tables: Value,
    pub summary: Vec<Value>,
    pub fail_complaints: bool,
    pub fail_users: bool,
    pub fail_status: bool,
    pub fail_delete: bool,
    /// Feedback POST answers 500 with an empty body.
    pub fail_feedback: bool,
    /// Status PUT answers `{"message": ...}` instead of the updated record.
    pub bare_status_ack: bool,
    pub list_delay: Duration,
    pub status_delay: Duration,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockBackend {
    pub base_url: String,
    pub state: Shared,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(seed()));
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let app = Router::new()
            .route("/api/complaints", get(list_complaints).post(create_complaint))
            .route("/api/complaints/:id", axum::routing::delete(delete_complaint))
            .route("/api/complaints/:id/status", put(update_status))
            .route("/api/users", get(list_users))
            .route("/api/auth/register", post(register))
            .route("/api/feedback", get(list_feedback).post(create_feedback))
            .route("/api/audit", get(list_audit))
            .route("/api/database", get(database))
            .route("/api/views/complaint_summary", get(summary))
            .layer(middleware::from_fn(move |req: Request, next: Next| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    next.run(req).await
                }
            }))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            hits,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(5)).unwrap()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn complaint_status(&self, id: i64) -> Option<String> {
        self.with(|s| {
            s.complaints
                .iter()
                .find(|c| c["complaint_id"] == id)
                .and_then(|c| c["status"].as_str().map(str::to_string))
        })
    }
}

fn seed() -> MockState {
    MockState {
        users: vec![
            json!({"user_id": 7, "name": "Alice", "email": "alice@example.org", "role": "citizen"}),
            json!({"user_id": 8, "name": "Bob", "email": "bob@example.org", "role": "officer"}),
            json!({"user_id": 9, "name": "Carol", "email": "carol@example.org", "phone": "555-0101", "role": "citizen"}),
        ],
        complaints: vec![
            json!({"complaint_id": 1, "user_id": 7, "category": "Water Leakage",
                   "description": "Pipe burst near school", "location": "Ward 3", "status": "Pending",
                   "submitted_at": "2024-03-01T10:05:00"}),
            json!({"complaint_id": 2, "user_id": 8, "category": "Noise",
                   "description": "Loud music at night", "location": "Ward 5", "status": "In Progress"}),
            json!({"complaint_id": 3, "user_id": 42, "category": "Garbage",
                   "description": "Overflowing bins", "location": "Water Street", "status": "Resolved"}),
        ],
        feedback: vec![
            json!({"feedback_id": 1, "user_id": 7, "complaint_id": 1, "rating": 4,
                   "comments": "Fixed quickly", "citizen_name": "Alice", "complaint_category": "Water Leakage"}),
            json!({"feedback_id": 2, "user_id": 99, "complaint_id": 3, "rating": 2, "comments": "Took weeks"}),
        ],
        audit: vec![
            json!({"audit_id": 1, "table_name": "complaints", "operation": "UPDATE",
                   "primary_key": {"complaint_id": 2}, "changed_by": 7, "changed_at": "2024-03-02T08:00:00",
                   "row_data": {"old": {"status": "Pending", "category": "Noise"},
                                "new": {"status": "Resolved", "category": "Noise"}}}),
            json!({"audit_id": 2, "table_name": "users", "operation": "INSERT",
                   "primary_key": {"user_id": 10}, "changed_by": null,
                   "row_data": {"old": null, "new": {"name": "Dan"}}}),
            json!({"audit_id": 3, "table_name": "complaints", "operation": "DELETE",
                   "primary_key": {"complaint_id": 5}, "row_data": {"note": "legacy"}}),
        ],
        tables: json!({
            "users": [{"user_id": 7, "name": "Alice"}],
            "complaints": [{"complaint_id": 1, "status": "Pending"}, {"complaint_id": 2, "location": null}],
            "auditlog": [{"audit_id": 1}],
        }),
        summary: vec![
            json!({"complaint_id": 1, "status": "Pending"}),
            json!({"complaint_id": 2, "status": "Pending"}),
            json!({"complaint_id": 3, "status": "Resolved"}),
            json!({"complaint_id": 4, "status": null}),
        ],
        ..MockState::default()
    }
}

fn server_error(detail: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": detail }))).into_response()
}

async fn list_complaints(State(s): State<Shared>) -> Response {
    let delay = s.lock().unwrap().list_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let s = s.lock().unwrap();
    if s.fail_complaints {
        return server_error("database unavailable");
    }
    Json(Value::Array(s.complaints.clone())).into_response()
}

async fn create_complaint(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut s = s.lock().unwrap();
    let id = s.complaints.len() as i64 + 100;
    let mut record = body;
    record["complaint_id"] = json!(id);
    record["status"] = json!("Pending");
    s.complaints.push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update_status(State(s): State<Shared>, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    let delay = s.lock().unwrap().status_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let mut s = s.lock().unwrap();
    if s.fail_status {
        return server_error("update failed");
    }
    let ack_only = s.bare_status_ack;
    match s.complaints.iter_mut().find(|c| c["complaint_id"] == id) {
        Some(c) => {
            c["status"] = body["status"].clone();
            if ack_only {
                return Json(json!({"message": "Status updated"})).into_response();
            }
            Json(c.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Complaint not found"}))).into_response(),
    }
}

async fn delete_complaint(State(s): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut s = s.lock().unwrap();
    if s.fail_delete {
        return server_error("delete failed");
    }
    s.complaints.retain(|c| c["complaint_id"] != id);
    Json(json!({"message": "Complaint deleted"})).into_response()
}

async fn list_users(State(s): State<Shared>) -> Response {
    let s = s.lock().unwrap();
    if s.fail_users {
        return server_error("users unavailable");
    }
    // Enveloped on purpose: both shapes must decode.
    Json(json!({ "data": s.users })).into_response()
}

async fn register(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut s = s.lock().unwrap();
    if s.users.iter().any(|u| u["email"] == body["email"]) {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Email already registered"}))).into_response();
    }
    let mut user = body;
    user["user_id"] = json!(s.users.len() as i64 + 100);
    if let Some(obj) = user.as_object_mut() {
        obj.remove("password");
    }
    s.users.push(user.clone());
    Json(user).into_response()
}

async fn list_feedback(State(s): State<Shared>) -> Response {
    Json(Value::Array(s.lock().unwrap().feedback.clone())).into_response()
}

async fn create_feedback(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut s = s.lock().unwrap();
    if s.fail_feedback {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let mut record = body;
    record["feedback_id"] = json!(s.feedback.len() as i64 + 1);
    s.feedback.push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn list_audit(State(s): State<Shared>) -> Response {
    Json(Value::Array(s.lock().unwrap().audit.clone())).into_response()
}

async fn database(State(s): State<Shared>) -> Response {
    Json(s.lock().unwrap().tables.clone()).into_response()
}

async fn summary(State(s): State<Shared>) -> Response {
    Json(Value::Array(s.lock().unwrap().summary.clone())).into_response()
}
