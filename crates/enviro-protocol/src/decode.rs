//! Defensive decoding of API responses.
//!
//! Collection endpoints answer either with a bare array or with a
//! `{"data": [...]}` envelope. Records are decoded one at a time so a single
//! malformed row never hides the rest of the collection.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ProtocolError;

/// Extract the item list from a bare array or a `{data: [...]}` envelope.
/// Any other shape yields an empty list.
pub fn collection_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::warn!("collection response has no data array; treating as empty");
                Vec::new()
            }
        },
        other => {
            tracing::warn!(kind = value_kind(&other), "unexpected collection response; treating as empty");
            Vec::new()
        }
    }
}

/// Decode every well-formed record of a collection, skipping the rest.
pub fn decode_collection<T: DeserializeOwned>(body: Value) -> Vec<T> {
    let items = collection_items(body);
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        tracing::debug!(kept = decoded.len(), total, "collection partially decoded");
    }
    decoded
}

/// Decode a single entity response strictly.
pub fn decode_record<T: DeserializeOwned>(entity: &'static str, body: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(body).map_err(|e| ProtocolError::Decode {
        entity,
        reason: e.to_string(),
    })
}

/// Decode the `/api/database` mapping of table name to rows. Tables whose
/// value is not an array come back empty; a non-object body is an error.
pub fn decode_tables(body: Value) -> Result<Vec<(String, Vec<Value>)>, ProtocolError> {
    match body {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(table, rows)| match rows {
                Value::Array(rows) => (table, rows),
                other => {
                    tracing::warn!(table = %table, kind = value_kind(&other), "table rows are not an array");
                    (table, Vec::new())
                }
            })
            .collect()),
        other => Err(ProtocolError::UnexpectedShape(format!(
            "expected table mapping, got {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
