//! Raw table dump for the database screen.

use serde::Serialize;
use serde_json::Value;

use enviro_protocol::{AUDIT_TABLE_NAME, MISSING_PLACEHOLDER};

/// A table ready for grid display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build grid views for every table except the audit log.
pub fn visible_tables(tables: Vec<(String, Vec<Value>)>) -> Vec<TableView> {
    tables
        .into_iter()
        .filter(|(name, _)| name != AUDIT_TABLE_NAME)
        .map(|(name, rows)| table_view(name, &rows))
        .collect()
}

/// Columns are the first row's keys, followed by keys first seen in later
/// rows. Rows that are not objects show up under a `value` column.
pub fn table_view(name: String, rows: &[Value]) -> TableView {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        match row {
            Value::Object(map) => {
                for key in map.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
            _ => {
                if !columns.iter().any(|c| c == "value") {
                    columns.push("value".to_string());
                }
            }
        }
    }

    let rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| match row {
                    Value::Object(map) => map
                        .get(col)
                        .map(render_cell)
                        .unwrap_or_else(|| MISSING_PLACEHOLDER.to_string()),
                    other if col == "value" => render_cell(other),
                    _ => MISSING_PLACEHOLDER.to_string(),
                })
                .collect()
        })
        .collect();

    TableView { name, columns, rows }
}

/// Strings verbatim, null as `null`, scalars by their JSON text, nested
/// values as indented JSON.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}
