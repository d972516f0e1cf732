//! Per-status complaint counts for the statistics screen.

use std::collections::BTreeMap;

use serde::Serialize;

use enviro_protocol::{Complaint, ComplaintStatus, ComplaintSummaryRow, UNKNOWN_STATUS_LABEL};

/// Counts of complaints by status.
///
/// `raw` maps each observed label to its count; unrecognized or missing
/// statuses land under [`UNKNOWN_STATUS_LABEL`]. The five known statuses
/// always have a card even when their count is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSummary {
    pub raw: BTreeMap<String, usize>,
    pub total: usize,
}

/// One summary card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCard {
    pub status: ComplaintStatus,
    pub label: &'static str,
    pub count: usize,
    pub percent: f64,
}

impl StatusSummary {
    pub fn from_statuses<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut summary = Self::default();
        for status in statuses {
            let label = status
                .and_then(ComplaintStatus::parse)
                .map(|s| s.label())
                .unwrap_or(UNKNOWN_STATUS_LABEL);
            *summary.raw.entry(label.to_string()).or_insert(0) += 1;
            summary.total += 1;
        }
        summary
    }

    pub fn from_complaints(complaints: &[Complaint]) -> Self {
        Self::from_statuses(complaints.iter().map(|c| c.status.as_deref()))
    }

    pub fn from_summary_rows(rows: &[ComplaintSummaryRow]) -> Self {
        Self::from_statuses(rows.iter().map(|r| r.status.as_deref()))
    }

    pub fn count(&self, status: ComplaintStatus) -> usize {
        self.raw.get(status.label()).copied().unwrap_or(0)
    }

    pub fn unknown(&self) -> usize {
        self.raw.get(UNKNOWN_STATUS_LABEL).copied().unwrap_or(0)
    }

    /// Share of the total, rounded to one decimal. 0/0 is 0.0.
    pub fn percent(&self, status: ComplaintStatus) -> f64 {
        percent_of(self.count(status), self.total)
    }

    /// The five known statuses in display order.
    pub fn cards(&self) -> Vec<StatusCard> {
        ComplaintStatus::ALL
            .iter()
            .map(|&status| StatusCard {
                status,
                label: status.label(),
                count: self.count(status),
                percent: self.percent(status),
            })
            .collect()
    }
}

/// `count / total * 100` rounded to one decimal place, 0.0 when `total` is 0.
pub fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Percentage formatted with one decimal, e.g. `66.7`.
pub fn format_percent(pct: f64) -> String {
    format!("{pct:.1}")
}
