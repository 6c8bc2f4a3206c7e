//! Text utilities.

/// Convert Windows (`\r\n`) and old Mac (`\r`) line endings to `\n`.
pub fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Trim a value and map blank strings to `None`.
pub fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Shorten a string to `max` characters for table output.
///
/// Line breaks are flattened so each incident stays on one table row.
pub fn truncate(s: &str, max: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() > max {
        let keep = max.saturating_sub(3);
        format!("{}...", flat.chars().take(keep).collect::<String>())
    } else {
        flat
    }
}
