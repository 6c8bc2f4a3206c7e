//! Timestamp parsing and formatting.
//!
//! Timestamps are stored as local-time `YYYY-MM-DD HH:MM:SS` text so that
//! lexical order in the database equals chronological order.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Storage format for every timestamp column.
pub const STORED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used for list rows.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Date-time layouts accepted from users and uploaded files.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %I:%M %p",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only layouts, read as midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y", "%Y%m%d"];

/// Parse a timestamp permissively.
///
/// Returns `None` for blank or unrecognized input instead of failing, so the
/// caller decides whether a missing value is an error.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Parse a value read back from the database.
pub fn parse_stored(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, STORED_FORMAT)
}

/// Render a timestamp in storage format.
pub fn format_stored(dt: &NaiveDateTime) -> String {
    dt.format(STORED_FORMAT).to_string()
}

/// Render a timestamp for listings.
pub fn format_display(dt: &NaiveDateTime) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

/// First and last second of a day, both inclusive.
pub fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    (day.and_time(NaiveTime::MIN), day.and_time(end))
}

/// The current local date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
