//! Before/after comparison of audit payloads.
//!
//! Entries carry `{"old": {...}, "new": {...}}` snapshots, either of which
//! may be null. The diff lists only the fields whose serialized values
//! differ. Payloads without snapshots are shown as a pretty-printed dump.

use serde::Serialize;
use serde_json::{Map, Value};

use enviro_protocol::MISSING_PLACEHOLDER;

/// One changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// How an audit payload should be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditView {
    /// Changed fields of an update, possibly empty.
    Diff { rows: Vec<DiffRow> },
    /// Whole payload as indented JSON.
    Raw { dump: String },
}

/// Choose between diff and raw display for an audit payload.
///
/// The diff is used when the payload has a non-null `old` or `new` entry.
pub fn render_payload(payload: &Value) -> AuditView {
    let old = snapshot(payload, "old");
    let new = snapshot(payload, "new");
    if old.is_none() && new.is_none() {
        let dump = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        return AuditView::Raw { dump };
    }
    AuditView::Diff {
        rows: diff_snapshots(old.and_then(Value::as_object), new.and_then(Value::as_object)),
    }
}

/// Rows for every field whose JSON serialization differs between the two
/// snapshots. A field absent on one side compares as absent, which differs
/// from an explicit `null`. Field order is the old snapshot's keys followed
/// by keys that only appear in the new one.
pub fn diff_snapshots(old: Option<&Map<String, Value>>, new: Option<&Map<String, Value>>) -> Vec<DiffRow> {
    let mut fields: Vec<&String> = Vec::new();
    for key in old.into_iter().flat_map(|m| m.keys()).chain(new.into_iter().flat_map(|m| m.keys())) {
        if !fields.contains(&key) {
            fields.push(key);
        }
    }

    fields
        .into_iter()
        .filter_map(|field| {
            let before = old.and_then(|m| m.get(field));
            let after = new.and_then(|m| m.get(field));
            if serialized(before) == serialized(after) {
                return None;
            }
            Some(DiffRow {
                field: field.clone(),
                old_value: display_value(before),
                new_value: display_value(after),
            })
        })
        .collect()
}

/// Render a JSON value for a table cell: strings verbatim, absent and null
/// as the placeholder, everything else as compact JSON.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn snapshot<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|v| !v.is_null())
}

fn serialized(value: Option<&Value>) -> Option<String> {
    value.map(Value::to_string)
}
