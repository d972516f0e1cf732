//! Free-text filtering of list views.
//!
//! Case-insensitive substring match over the fields a view displays.
//! Every query rescans the whole collection.

use enviro_protocol::{AuditRecord, Complaint, Feedback, User};

/// Fields of a record that free-text search looks at.
pub trait Searchable {
    fn search_fields(&self) -> Vec<Option<&str>>;
}

impl Searchable for Complaint {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.category.as_deref(),
            self.description.as_deref(),
            self.location.as_deref(),
            self.status.as_deref(),
        ]
    }
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![self.name.as_deref(), self.email.as_deref(), self.role.as_deref()]
    }
}

impl Searchable for Feedback {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.comments.as_deref(),
            self.citizen_name.as_deref(),
            self.complaint_category.as_deref(),
        ]
    }
}

impl Searchable for AuditRecord {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.table_name.as_deref(),
            self.operation.as_deref(),
            self.changed_at.as_deref(),
        ]
    }
}

/// Whether any searchable field contains `query`, ignoring case.
/// An empty query matches everything.
pub fn matches<T: Searchable>(item: &T, query: &str) -> bool {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_fields()
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Items matching `query`, in their original order.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    items.iter().filter(|item| matches(*item, query)).collect()
}
