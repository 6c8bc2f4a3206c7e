//! Filter request model.

use super::incident::CategoricalField;
use crate::utils::time;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default look-back window for the date range.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Smallest row limit a listing accepts.
pub const MIN_ROW_LIMIT: u32 = 50;

/// Largest row limit a listing accepts.
pub const MAX_ROW_LIMIT: u32 = 5000;

/// Row limit used when none is given.
pub const DEFAULT_ROW_LIMIT: u32 = 500;

/// Selection value meaning "no restriction".
pub const ALL_SENTINEL: &str = "ALL";

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    /// First day of the range (inclusive).
    pub date_from: NaiveDate,
    /// Last day of the range (inclusive).
    pub date_to: NaiveDate,
    /// Selected platforms; empty means all.
    pub platforms: Vec<String>,
    /// Selected locales; empty means all.
    pub locales: Vec<String>,
    /// Selected categories; empty means all.
    pub categories: Vec<String>,
    /// Substring searched in description, cause, response and note.
    pub keyword: Option<String>,
    /// Maximum number of list rows.
    pub limit: u32,
}

impl Default for FilterRequest {
    fn default() -> Self {
        Self::ending_on(time::today())
    }
}

impl FilterRequest {
    /// The default window: the last 30 days through `today`.
    pub fn ending_on(today: NaiveDate) -> Self {
        Self {
            date_from: today - Duration::days(DEFAULT_LOOKBACK_DAYS),
            date_to: today,
            platforms: Vec::new(),
            locales: Vec::new(),
            categories: Vec::new(),
            keyword: None,
            limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Selected values for a categorical field.
    pub fn selection(&self, field: CategoricalField) -> &[String] {
        match field {
            CategoricalField::Platform => &self.platforms,
            CategoricalField::Locale => &self.locales,
            CategoricalField::Category => &self.categories,
        }
    }

    /// Date range with the end clamped to the start when it precedes it.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.date_from, self.date_to.max(self.date_from))
    }

    /// Whether `date_to` precedes `date_from` and will be clamped.
    pub fn needs_date_correction(&self) -> bool {
        self.date_to < self.date_from
    }

    /// Apply the end-date clamp in place. Returns true if anything changed.
    pub fn correct_dates(&mut self) -> bool {
        if self.needs_date_correction() {
            tracing::debug!(
                "End date {} precedes start date {}, clamping",
                self.date_to,
                self.date_from
            );
            self.date_to = self.date_from;
            true
        } else {
            false
        }
    }

    /// Trimmed keyword, or `None` when blank.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Row limit clamped to the accepted range.
    pub fn row_limit(&self) -> u32 {
        self.limit.clamp(MIN_ROW_LIMIT, MAX_ROW_LIMIT)
    }
}

/// Clean a categorical selection.
///
/// Values are trimmed; blanks and the `ALL` sentinel are dropped and
/// duplicates removed, keeping first-seen order.
pub fn clean_selection(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let v = value.trim();
        if v.is_empty() || v.eq_ignore_ascii_case(ALL_SENTINEL) {
            continue;
        }
        if !cleaned.iter().any(|c| c == v) {
            cleaned.push(v.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_window_is_thirty_days() {
        let req = FilterRequest::ending_on(day(2024, 3, 31));
        assert_eq!(req.date_from, day(2024, 3, 1));
        assert_eq!(req.date_to, day(2024, 3, 31));
        assert_eq!(req.limit, DEFAULT_ROW_LIMIT);
    }

    #[test]
    fn test_end_before_start_is_clamped() {
        let mut req = FilterRequest::ending_on(day(2024, 3, 31));
        req.date_from = day(2024, 3, 10);
        req.date_to = day(2024, 3, 5);
        assert_eq!(req.date_range(), (day(2024, 3, 10), day(2024, 3, 10)));
        assert!(req.correct_dates());
        assert_eq!(req.date_to, day(2024, 3, 10));
        assert!(!req.correct_dates());
    }

    #[test]
    fn test_blank_keyword_is_none() {
        let mut req = FilterRequest::default();
        req.keyword = Some("   ".to_string());
        assert_eq!(req.keyword(), None);
        req.keyword = Some("  timeout ".to_string());
        assert_eq!(req.keyword(), Some("timeout"));
    }

    #[test]
    fn test_row_limit_is_clamped() {
        let mut req = FilterRequest::default();
        req.limit = 1;
        assert_eq!(req.row_limit(), MIN_ROW_LIMIT);
        req.limit = 100_000;
        assert_eq!(req.row_limit(), MAX_ROW_LIMIT);
        req.limit = 750;
        assert_eq!(req.row_limit(), 750);
    }

    #[test]
    fn test_clean_selection() {
        let values = vec![
            " iOS ".to_string(),
            "".to_string(),
            "all".to_string(),
            "Android".to_string(),
            "iOS".to_string(),
        ];
        assert_eq!(clean_selection(&values), vec!["iOS", "Android"]);
        assert!(clean_selection(&["ALL".to_string()]).is_empty());
    }
}
