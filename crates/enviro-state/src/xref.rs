//! Foreign-key label lookup against separately fetched collections.

use enviro_protocol::{Complaint, EntityId, User};

/// An entity that can stand in for its identifier in a table cell.
pub trait Labeled {
    fn label_id(&self) -> EntityId;
    fn label(&self) -> Option<&str>;
}

impl Labeled for User {
    fn label_id(&self) -> EntityId {
        self.user_id
    }

    fn label(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Labeled for Complaint {
    fn label_id(&self) -> EntityId {
        self.complaint_id
    }

    fn label(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Label of the first entity whose id matches, if it has a non-blank one.
pub fn find_label<T: Labeled>(id: EntityId, entities: &[T]) -> Option<&str> {
    entities
        .iter()
        .find(|e| e.label_id() == id)
        .and_then(Labeled::label)
        .filter(|label| !label.trim().is_empty())
}

/// Resolve `id` to a display label, never blank. Falls back to
/// `Unknown (ID: <id>)` when the collection is empty, the id is missing,
/// or the matching entity has no label.
pub fn resolve_label<T: Labeled>(id: EntityId, entities: &[T]) -> String {
    find_label(id, entities)
        .map(str::to_string)
        .unwrap_or_else(|| unknown_label(id))
}

/// Same as [`resolve_label`] for an optional foreign key.
pub fn resolve_optional<T: Labeled>(id: Option<EntityId>, entities: &[T]) -> String {
    match id {
        Some(id) => resolve_label(id, entities),
        None => "Unknown".to_string(),
    }
}

pub fn unknown_label(id: EntityId) -> String {
    format!("Unknown (ID: {id})")
}
