use serde::{Deserialize, Serialize};

/// Integer primary key used by every backend table.
pub type EntityId = i64;

/// Lifecycle status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl ComplaintStatus {
    /// The five known statuses in display order.
    pub const ALL: [ComplaintStatus; 5] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Closed,
        ComplaintStatus::Rejected,
    ];

    /// Label as the backend stores it.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
            Self::Rejected => "Rejected",
        }
    }

    /// Parse a status label, ignoring case and `_`/`-` separators.
    /// Returns `None` for anything outside the five known labels.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        match normalized.as_str() {
            "pending" => Some(Self::Pending),
            "in progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Role tag carried by a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Citizen,
    Officer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Officer => "officer",
            Self::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "citizen" => Some(Self::Citizen),
            "officer" => Some(Self::Officer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutation kind recorded in an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditOperation {
    Insert,
    Update,
    Delete,
}

impl AuditOperation {
    /// Classify an operation tag by its first letter: `I*` insert,
    /// `U*` update, anything else (including empty) delete.
    pub fn classify(raw: &str) -> Self {
        match raw.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('I') => Self::Insert,
            Some('U') => Self::Update,
            _ => Self::Delete,
        }
    }
}

/// A citizen complaint as returned by `/api/complaints`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub complaint_id: EntityId,
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Raw status label; may fall outside [`ComplaintStatus`].
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub last_updated_at: Option<String>,
}

impl Complaint {
    pub fn parsed_status(&self) -> Option<ComplaintStatus> {
        self.status.as_deref().and_then(ComplaintStatus::parse)
    }
}

/// A row of the `complaint_summary` view. Only `status` is needed for
/// counting, so every field is optional and no row is ever rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplaintSummaryRow {
    #[serde(default)]
    pub complaint_id: Option<EntityId>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub citizen_name: Option<String>,
    #[serde(default)]
    pub officer_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// A registered user as returned by `/api/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn parsed_role(&self) -> Option<UserRole> {
        self.role.as_deref().and_then(UserRole::parse)
    }
}

/// Feedback left by a citizen on a complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub feedback_id: EntityId,
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub complaint_id: Option<EntityId>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    /// Denormalized by some backend versions.
    #[serde(default)]
    pub citizen_name: Option<String>,
    #[serde(default)]
    pub complaint_category: Option<String>,
}

/// One database mutation captured by the backend's audit trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: EntityId,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub primary_key: serde_json::Value,
    #[serde(default)]
    pub changed_by: Option<serde_json::Value>,
    #[serde(default)]
    pub changed_at: Option<String>,
    /// `{old, new}` snapshots for updates, a single row snapshot otherwise.
    #[serde(default)]
    pub row_data: serde_json::Value,
}

impl AuditRecord {
    pub fn operation_kind(&self) -> AuditOperation {
        AuditOperation::classify(self.operation.as_deref().unwrap_or(""))
    }
}
