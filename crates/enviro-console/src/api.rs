//! HTTP client for the complaint API.
//!
//! Plain JSON over HTTP: no retries, no caching, no auth headers. Every
//! method maps one row of the endpoint table and returns typed records,
//! decoded defensively so a malformed row never fails a whole screen.

use std::time::Duration;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use enviro_protocol::*;

use crate::config::ConsoleConfig;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("server responded {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("invalid response body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ApiError {
    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// What the operator sees: the server's own message verbatim, or
    /// `fallback` when the server gave none.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response, ApiError> {
        let url = self.url(path);
        tracing::debug!(%method, url = %url, "api request");
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, url = %url, error = %e, "api request failed");
            ApiError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;
        check_status(response).await
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        read_json(response).await
    }

    async fn send_json<B: Serialize>(&self, method: Method, path: &str, body: &B) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
        let response = self.execute(method, path, Some(body)).await?;
        read_json(response).await
    }

    async fn get_collection<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        Ok(decode_collection(self.get_json(path).await?))
    }

    pub async fn list_complaints(&self) -> Result<Vec<Complaint>, ApiError> {
        self.get_collection(COMPLAINTS_PATH).await
    }

    /// File a complaint. Any 2xx is success; the created record comes back
    /// only when the body decodes as one.
    pub async fn create_complaint(&self, complaint: &NewComplaint) -> Result<Option<Complaint>, ApiError> {
        let body = self.send_json(Method::POST, COMPLAINTS_PATH, complaint).await?;
        Ok(acknowledged_record("complaint", body))
    }

    pub async fn update_complaint_status(
        &self,
        complaint_id: EntityId,
        status: &str,
    ) -> Result<Option<Complaint>, ApiError> {
        let update = StatusUpdate {
            status: status.to_string(),
        };
        let body = self
            .send_json(Method::PUT, &complaint_status_path(complaint_id), &update)
            .await?;
        Ok(acknowledged_record("complaint", body))
    }

    pub async fn delete_complaint(&self, complaint_id: EntityId) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &complaint_path(complaint_id), None)
            .await
            .map(|_| ())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get_collection(USERS_PATH).await
    }

    /// Register a user. A success status whose body is an `{error}` object
    /// still counts as a failure.
    pub async fn register_user(&self, registration: &UserRegistration) -> Result<User, ApiError> {
        let body = self.send_json(Method::POST, REGISTER_PATH, registration).await?;
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(ApiError::Server {
                status: 200,
                message: Some(message.to_string()),
            });
        }
        Ok(decode_record("user", body)?)
    }

    pub async fn list_feedback(&self) -> Result<Vec<Feedback>, ApiError> {
        self.get_collection(FEEDBACK_PATH).await
    }

    pub async fn submit_feedback(&self, feedback: &NewFeedback) -> Result<Option<Feedback>, ApiError> {
        let body = self.send_json(Method::POST, FEEDBACK_PATH, feedback).await?;
        Ok(acknowledged_record("feedback", body))
    }

    pub async fn list_audit(&self) -> Result<Vec<AuditRecord>, ApiError> {
        self.get_collection(AUDIT_PATH).await
    }

    pub async fn database_tables(&self) -> Result<Vec<(String, Vec<Value>)>, ApiError> {
        Ok(decode_tables(self.get_json(DATABASE_PATH).await?)?)
    }

    pub async fn complaint_summary(&self) -> Result<Vec<ComplaintSummaryRow>, ApiError> {
        self.get_collection(COMPLAINT_SUMMARY_PATH).await
    }
}

/// Body of a mutation the server already accepted. A body that is not the
/// entity (an empty body, a `{message}` acknowledgement) is not a failure.
fn acknowledged_record<T: DeserializeOwned>(entity: &'static str, body: Value) -> Option<T> {
    if body.is_null() {
        return None;
    }
    match decode_record(entity, body) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, "mutation accepted but response body is not a record");
            None
        }
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message());
    tracing::warn!(status = status.as_u16(), message = ?message, "api returned error status");
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn read_json(response: Response) -> Result<Value, ApiError> {
    let text = response.text().await.map_err(|e| ApiError::InvalidBody(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/ ", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url(COMPLAINTS_PATH), "http://localhost:8000/api/complaints");
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = ApiError::Server {
            status: 400,
            message: Some("Email already registered".into()),
        };
        assert_eq!(err.user_message("Registration failed"), "Email already registered");

        let err = ApiError::Server { status: 500, message: None };
        assert_eq!(err.user_message("Registration failed"), "Registration failed");

        let err = ApiError::Transport {
            url: "http://x".into(),
            reason: "refused".into(),
        };
        assert_eq!(err.user_message("Unknown Error"), "Unknown Error");
    }

    #[test]
    fn acknowledgement_without_record_is_none() {
        let ack: Option<Complaint> = acknowledged_record("complaint", serde_json::json!({"message": "Status updated"}));
        assert!(ack.is_none());
        let empty: Option<Feedback> = acknowledged_record("feedback", Value::Null);
        assert!(empty.is_none());
        let full: Option<Complaint> = acknowledged_record("complaint", serde_json::json!({"complaint_id": 4}));
        assert_eq!(full.map(|c| c.complaint_id), Some(4));
    }
}
