//! Screen contents as plain grids.
//!
//! Both the TUI and the one-shot CLI commands render through [`Tabular`],
//! so a screen looks the same whether it is drawn with ratatui or printed.

use serde::Serialize;

use enviro_state::display::truncate;
use enviro_state::status_summary::format_percent;
use enviro_state::{AuditView, StatusSummary, TableView};

use crate::views::{AuditDetail, AuditRow, Choice, ComplaintRow, FeedbackEntry, Screen, UserRow};

/// Widest a cell gets in plain-text output before it is cut.
pub const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tabular {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub empty_message: String,
}

impl Tabular {
    pub fn new(title: impl Into<String>, header: &[&str]) -> Self {
        Self {
            title: title.into(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            empty_message: "No rows.".to_string(),
        }
    }

    pub fn with_empty_message(mut self, message: &str) -> Self {
        self.empty_message = message.to_string();
        self
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Character width of every column, capped at `max`.
    pub fn column_widths(&self, max: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths.into_iter().map(|w| w.clamp(1, max)).collect()
    }

    /// Render as aligned text, one line per row.
    pub fn render_text(&self, max_cell: usize) -> String {
        let mut out = format!("{}\n", self.title);
        if self.rows.is_empty() {
            out.push_str(&format!("  {}\n", self.empty_message));
            return out;
        }
        let widths = self.column_widths(max_cell);
        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    let cell = if cell.chars().count() > w {
                        truncate(cell, w.saturating_sub(3))
                    } else {
                        cell.to_string()
                    };
                    format!("{cell:<w$}")
                })
                .collect();
            format!("  {}\n", padded.join("  ").trim_end())
        };
        out.push_str(&line(&self.header));
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        out.push_str(&format!("  {}\n", rule.join("  ")));
        for row in &self.rows {
            out.push_str(&line(row));
        }
        out
    }
}

pub fn screens_table() -> Tabular {
    let mut t = Tabular::new("Environmental Portal", &["Screen", "Description"]);
    for screen in Screen::ALL.iter().filter(|s| **s != Screen::Dashboard) {
        t.push(vec![screen.name().to_string(), screen.description().to_string()]);
    }
    t
}

pub fn complaints_table(rows: &[ComplaintRow]) -> Tabular {
    let mut t = Tabular::new(
        format!("Complaints ({})", rows.len()),
        &["ID", "Category", "Description", "Location", "Status", "Submitted", "Citizen"],
    )
    .with_empty_message("No complaints found.");
    for r in rows {
        t.push(vec![
            r.complaint_id.to_string(),
            r.category.clone(),
            r.description.clone(),
            r.location.clone(),
            r.status.clone(),
            r.submitted.clone(),
            r.citizen.clone(),
        ]);
    }
    t
}

pub fn admin_table(rows: &[ComplaintRow]) -> Tabular {
    let mut t = Tabular::new(
        format!("Admin Complaint Manager ({})", rows.len()),
        &["ID", "Category", "Description", "Location", "Status"],
    )
    .with_empty_message("No complaints found.");
    for r in rows {
        t.push(vec![
            r.complaint_id.to_string(),
            r.category.clone(),
            r.description.clone(),
            r.location.clone(),
            r.status.clone(),
        ]);
    }
    t
}

pub fn stats_table(summary: &StatusSummary) -> Tabular {
    let mut t = Tabular::new(
        format!("Complaint Statistics (total {})", summary.total),
        &["Status", "Count", "Percent", "Share"],
    );
    for card in summary.cards() {
        t.push(vec![
            card.label.to_string(),
            card.count.to_string(),
            format!("{}%", format_percent(card.percent)),
            share_bar(card.percent),
        ]);
    }
    t
}

/// One block per 5%, so a full bar is 20 wide.
pub fn share_bar(percent: f64) -> String {
    let blocks = (percent.clamp(0.0, 100.0) / 5.0).round() as usize;
    "█".repeat(blocks)
}

pub fn audit_table(rows: &[AuditRow]) -> Tabular {
    let mut t = Tabular::new(
        format!("Audit Logs ({})", rows.len()),
        &["ID", "Time", "Operation", "Table", "Record", "User"],
    )
    .with_empty_message("No audit logs found.");
    for r in rows {
        t.push(vec![
            r.audit_id.to_string(),
            r.time.clone(),
            r.operation.clone(),
            r.table.clone(),
            format!("#{}", r.primary_key),
            r.user.clone(),
        ]);
    }
    t
}

/// Body of the audit detail panel: a field/old/new grid, or the raw dump.
pub fn audit_detail_text(detail: &AuditDetail, max_cell: usize) -> String {
    let heading = format!(
        "Audit #{} {} on {} #{} by {} at {}",
        detail.row.audit_id,
        detail.row.operation,
        detail.row.table,
        detail.row.primary_key,
        detail.row.user,
        detail.row.time
    );
    match &detail.view {
        AuditView::Diff { rows } => {
            let mut t = Tabular::new(heading, &["Field", "Old Value", "New Value"])
                .with_empty_message("No fields changed.");
            for r in rows {
                t.push(vec![r.field.clone(), r.old_value.clone(), r.new_value.clone()]);
            }
            t.render_text(max_cell)
        }
        AuditView::Raw { dump } => format!("{heading}\n{dump}\n"),
    }
}

pub fn database_table(table: &TableView) -> Tabular {
    let header: Vec<&str> = table.columns.iter().map(String::as_str).collect();
    let mut t = Tabular::new(format!("{} ({} rows)", table.name, table.rows.len()), &header)
        .with_empty_message("Empty table");
    for row in &table.rows {
        t.push(row.clone());
    }
    t
}

pub fn feedback_table(entries: &[FeedbackEntry]) -> Tabular {
    let mut t = Tabular::new(
        format!("Citizen Feedback ({})", entries.len()),
        &["ID", "Citizen", "Regarding", "Rating", "Comments", "Date"],
    )
    .with_empty_message("No feedback yet.");
    for e in entries {
        t.push(vec![
            e.feedback_id.to_string(),
            e.citizen.clone(),
            e.regarding.clone(),
            e.rating.clone(),
            e.comments.clone(),
            e.date.clone(),
        ]);
    }
    t
}

pub fn users_table(rows: &[UserRow]) -> Tabular {
    let mut t = Tabular::new(
        format!("Users ({})", rows.len()),
        &["ID", "Name", "Email", "Phone", "Role", "Joined"],
    )
    .with_empty_message("No users found.");
    for r in rows {
        t.push(vec![
            r.user_id.to_string(),
            r.name.clone(),
            r.email.clone(),
            r.phone.clone(),
            r.role.clone(),
            r.created.clone(),
        ]);
    }
    t
}

pub fn choices_table(title: &str, choices: &[Choice]) -> Tabular {
    let mut t = Tabular::new(title, &["ID", "Label"]);
    for c in choices {
        t.push(vec![c.id.to_string(), c.label.clone()]);
    }
    t
}
