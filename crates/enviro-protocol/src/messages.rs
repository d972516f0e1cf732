use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Body of `POST /api/complaints`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComplaint {
    pub user_id: EntityId,
    pub category: String,
    pub description: String,
    pub location: String,
}

/// Body of `PUT /api/complaints/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRegistration {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: String,
    pub password: String,
}

/// Body of `POST /api/feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeedback {
    pub user_id: EntityId,
    pub complaint_id: EntityId,
    pub rating: u8,
    pub comments: String,
}

/// Error payload the backend returns on failure. Registration uses
/// `{"error": ...}`; validation failures use `{"detail": ...}` where
/// `detail` is either a string or a list of field errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable message, if the server supplied one.
    pub fn message(&self) -> Option<String> {
        if let Some(error) = self.error.as_deref().filter(|e| !e.trim().is_empty()) {
            return Some(error.to_string());
        }
        match &self.detail {
            Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => {
                Some(detail.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_error_field() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "Email already registered", "detail": "x"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Email already registered"));
    }

    #[test]
    fn error_body_ignores_structured_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": [{"loc": ["body", "rating"], "msg": "bad"}]}"#)
                .unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn registration_omits_missing_phone() {
        let reg = UserRegistration {
            name: "Alice".into(),
            email: "alice@example.org".into(),
            phone: None,
            role: "citizen".into(),
            password: "pw".into(),
        };
        let json = serde_json::to_value(&reg).unwrap();
        assert!(json.get("phone").is_none());
    }
}
