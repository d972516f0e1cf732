//! Input forms and their client-side presence checks.
//!
//! A form holds raw operator input. `validate` turns it into the request
//! body or a [`FormError`] before any network call is made.

use serde::Serialize;
use thiserror::Error;

use enviro_protocol::{EntityId, NewComplaint, NewFeedback, UserRegistration, UserRole};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be one of {allowed}, got '{value}'")]
    InvalidChoice {
        field: &'static str,
        allowed: &'static str,
        value: String,
    },
}

/// Shared behavior of the three forms.
pub trait Form: Default {
    type Request: Serialize;

    /// Message shown after the server accepted the submission.
    const SUCCESS_MESSAGE: &'static str;
    /// Message shown when the server failed without explaining why.
    const FAILURE_FALLBACK: &'static str;

    fn validate(&self) -> Result<Self::Request, FormError>;

    /// Reset every field to its default after a successful submission.
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Result of a submission attempt, as surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum FormOutcome {
    /// Server accepted; fields were cleared.
    Submitted(String),
    /// Client-side validation failed; nothing was sent.
    Rejected(String),
    /// Server or transport failure; fields kept.
    Failed(String),
}

impl FormOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Submitted(m) | Self::Rejected(m) | Self::Failed(m) => m,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintForm {
    pub user_id: String,
    pub category: String,
    pub description: String,
    pub location: String,
}

impl Form for ComplaintForm {
    type Request = NewComplaint;

    const SUCCESS_MESSAGE: &'static str = "Complaint registered successfully!";
    const FAILURE_FALLBACK: &'static str = "Failed to register complaint. Please try again.";

    fn validate(&self) -> Result<NewComplaint, FormError> {
        Ok(NewComplaint {
            user_id: required_id("user_id", &self.user_id)?,
            category: required("category", &self.category)?,
            description: required("description", &self.description)?,
            location: required("location", &self.location)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub password: String,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            role: UserRole::default().as_str().to_string(),
            password: String::new(),
        }
    }
}

impl Form for UserForm {
    type Request = UserRegistration;

    const SUCCESS_MESSAGE: &'static str = "User registered successfully!";
    const FAILURE_FALLBACK: &'static str = "Registration failed";

    fn validate(&self) -> Result<UserRegistration, FormError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        let password = required("password", &self.password)?;
        let role = if self.role.trim().is_empty() {
            UserRole::default()
        } else {
            UserRole::parse(&self.role).ok_or_else(|| FormError::InvalidChoice {
                field: "role",
                allowed: "citizen, officer, admin",
                value: self.role.clone(),
            })?
        };
        let phone = Some(self.phone.trim().to_string()).filter(|p| !p.is_empty());
        Ok(UserRegistration {
            name,
            email,
            phone,
            role: role.as_str().to_string(),
            password,
        })
    }
}

/// Default star rating preselected on the feedback form.
pub const DEFAULT_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackForm {
    pub user_id: String,
    pub complaint_id: String,
    pub rating: u8,
    pub comments: String,
}

impl Default for FeedbackForm {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            complaint_id: String::new(),
            rating: DEFAULT_RATING,
            comments: String::new(),
        }
    }
}

impl FeedbackForm {
    /// Set the rating from operator input. Blank keeps the current value.
    pub fn set_rating(&mut self, raw: &str) -> Result<(), FormError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        match trimmed.parse::<u8>() {
            Ok(r) if (1..=5).contains(&r) => {
                self.rating = r;
                Ok(())
            }
            _ => Err(FormError::InvalidChoice {
                field: "rating",
                allowed: "1-5",
                value: trimmed.to_string(),
            }),
        }
    }
}

impl Form for FeedbackForm {
    type Request = NewFeedback;

    const SUCCESS_MESSAGE: &'static str = "Feedback submitted successfully!";
    const FAILURE_FALLBACK: &'static str = "Unknown Error";

    fn validate(&self) -> Result<NewFeedback, FormError> {
        Ok(NewFeedback {
            user_id: required_id("user_id", &self.user_id)?,
            complaint_id: required_id("complaint_id", &self.complaint_id)?,
            rating: self.rating,
            comments: required("comments", &self.comments)?,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing(field));
    }
    Ok(trimmed.to_string())
}

fn required_id(field: &'static str, value: &str) -> Result<EntityId, FormError> {
    let raw = required(field, value)?;
    raw.parse::<EntityId>().map_err(|_| FormError::NotANumber { field, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complaint_form_requires_location() {
        let form = ComplaintForm {
            user_id: "3".into(),
            category: "Water Leakage".into(),
            description: "Pipe burst".into(),
            location: "   ".into(),
        };
        assert_eq!(form.validate(), Err(FormError::Missing("location")));
    }

    #[test]
    fn complaint_form_rejects_non_numeric_user() {
        let form = ComplaintForm {
            user_id: "alice".into(),
            category: "Noise".into(),
            description: "Loud".into(),
            location: "Ward 2".into(),
        };
        assert!(matches!(form.validate(), Err(FormError::NotANumber { field: "user_id", .. })));
    }

    #[test]
    fn user_form_defaults_to_citizen() {
        let form = UserForm {
            name: "Bob".into(),
            email: "bob@example.org".into(),
            password: "secret".into(),
            role: String::new(),
            ..Default::default()
        };
        let req = form.validate().unwrap();
        assert_eq!(req.role, "citizen");
        assert_eq!(req.phone, None);
    }

    #[test]
    fn user_form_rejects_unknown_role() {
        let form = UserForm {
            name: "Bob".into(),
            email: "bob@example.org".into(),
            password: "secret".into(),
            role: "mayor".into(),
            ..Default::default()
        };
        assert!(matches!(form.validate(), Err(FormError::InvalidChoice { .. })));
    }

    #[test]
    fn feedback_form_clear_restores_default_rating() {
        let mut form = FeedbackForm {
            user_id: "1".into(),
            complaint_id: "2".into(),
            rating: 2,
            comments: "slow".into(),
        };
        form.clear();
        assert_eq!(form, FeedbackForm::default());
        assert_eq!(form.rating, DEFAULT_RATING);
    }

    #[test]
    fn rating_outside_one_to_five_is_rejected() {
        let mut form = FeedbackForm::default();
        assert!(form.set_rating("0").is_err());
        assert!(form.set_rating("six").is_err());
        assert_eq!(form.rating, DEFAULT_RATING);
        form.set_rating(" 3 ").unwrap();
        assert_eq!(form.rating, 3);
        form.set_rating("").unwrap();
        assert_eq!(form.rating, 3);
    }
}
