use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Best-effort parse of a `Date:` header into a UTC timestamp.
///
/// Accepts RFC 2822 (with or without a trailing `(TZ)` comment), RFC 3339,
/// and plain `YYYY-MM-DD[ HH:MM[:SS]]` values read as UTC.
pub fn parse_message_date(raw: &str) -> Option<i64> {
    let trimmed = strip_trailing_comment(raw.trim());
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

pub fn format_timestamp_date(ts: i64) -> String {
    let dt = DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default();
    dt.format("%Y-%m-%d").to_string()
}

fn strip_trailing_comment(value: &str) -> &str {
    if value.ends_with(')') {
        if let Some(open) = value.rfind('(') {
            return value[..open].trim_end();
        }
    }
    value
}
