//! Small formatting helpers shared by every screen.

use chrono::{DateTime, NaiveDateTime};

use enviro_protocol::MISSING_PLACEHOLDER;

/// The value or the placeholder when absent or blank.
pub fn or_placeholder(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(MISSING_PLACEHOLDER)
        .to_string()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// `Mar 01, 2024 10:05`, the raw text if unparseable, the placeholder if absent.
pub fn format_timestamp(raw: Option<&str>) -> String {
    match raw.filter(|r| !r.trim().is_empty()) {
        None => MISSING_PLACEHOLDER.to_string(),
        Some(r) => parse_timestamp(r)
            .map(|dt| dt.format("%b %d, %Y %H:%M").to_string())
            .unwrap_or_else(|| r.to_string()),
    }
}

/// `Mar 01, 2024`.
pub fn format_date(raw: Option<&str>) -> String {
    match raw.filter(|r| !r.trim().is_empty()) {
        None => MISSING_PLACEHOLDER.to_string(),
        Some(r) => parse_timestamp(r)
            .map(|dt| dt.format("%b %d, %Y").to_string())
            .unwrap_or_else(|| r.to_string()),
    }
}

/// Shorten to `max` characters, appending `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

/// Five-star rating bar, e.g. `★★★☆☆`.
pub fn stars(rating: Option<i64>) -> String {
    let filled = rating.unwrap_or(0).clamp(0, 5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}
