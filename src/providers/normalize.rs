//! Normalization rules shared by every provider.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Parse a provider date, falling back to now when absent or malformed.
pub fn parse_posted_date(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(try_parse_date).unwrap_or_else(Utc::now)
}

fn try_parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // `%.f` also accepts a missing fraction, covering `2024-01-15T10:00:00`.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Use the provider's remote flag when given, else look for "remote" in the text.
pub fn infer_remote(explicit: Option<bool>, title: &str, description: &str) -> bool {
    explicit.unwrap_or_else(|| {
        title.to_lowercase().contains("remote") || description.to_lowercase().contains("remote")
    })
}

/// Render a JSON id (string or number) as text.
pub fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Non-empty, trimmed text or `None`.
pub fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// Collapse runs of whitespace, which HTML snippets are full of.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
