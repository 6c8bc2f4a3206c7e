//! Filter-to-query builder.
//!
//! Turns a [`FilterRequest`] into a SQL boolean expression over the
//! `incidents i` alias plus named parameters. User input only ever reaches
//! the database as bound values.

use crate::models::filter::{clean_selection, FilterRequest};
use crate::models::incident::CategoricalField;
use crate::utils::time;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, Value};

const DATE_CLAUSE: &str = "i.started_at BETWEEN :date_from AND :date_to";

/// Text columns searched by the keyword filter.
pub const KEYWORD_COLUMNS: [&str; 4] = ["description", "cause", "response", "note"];

/// A WHERE-clause body with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    date_from: NaiveDateTime,
    date_to: NaiveDateTime,
    clauses: Vec<String>,
    params: Vec<(String, Value)>,
}

impl Predicate {
    /// Build a predicate from a filter request.
    ///
    /// The date range clause is always present. Empty categorical selections
    /// and a blank keyword add nothing.
    pub fn build(filter: &FilterRequest) -> Self {
        let (from, to) = filter.date_range();
        let mut predicate = Self::for_range(from, to);

        for field in CategoricalField::ALL {
            predicate.push_selection(field, &clean_selection(filter.selection(field)));
        }

        if let Some(keyword) = filter.keyword() {
            predicate.push_keyword(keyword);
        }

        tracing::debug!("Built predicate: {}", predicate.sql());
        predicate
    }

    /// A predicate restricting only the date range.
    pub fn for_range(from: NaiveDate, to: NaiveDate) -> Self {
        let to = to.max(from);
        Self {
            date_from: time::day_bounds(from).0,
            date_to: time::day_bounds(to).1,
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Same clauses, date bounds replaced by a single day.
    pub fn for_day(&self, day: NaiveDate) -> Self {
        let (date_from, date_to) = time::day_bounds(day);
        Self {
            date_from,
            date_to,
            ..self.clone()
        }
    }

    fn push_selection(&mut self, field: CategoricalField, values: &[String]) {
        if values.is_empty() {
            return;
        }
        let column = field.column();
        let placeholders: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let name = format!(":{}_{}", column, i);
                self.params.push((name.clone(), Value::Text(value.clone())));
                name
            })
            .collect();
        self.clauses
            .push(format!("i.{} IN ({})", column, placeholders.join(", ")));
    }

    fn push_keyword(&mut self, keyword: &str) {
        let ors: Vec<String> = KEYWORD_COLUMNS
            .iter()
            .map(|col| format!("i.{} LIKE :kw ESCAPE '\\'", col))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        self.params.push((
            ":kw".to_string(),
            Value::Text(format!("%{}%", escape_like(keyword))),
        ));
    }

    /// The boolean expression, clauses joined with AND.
    pub fn sql(&self) -> String {
        std::iter::once(DATE_CLAUSE.to_string())
            .chain(self.clauses.iter().cloned())
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// All bound parameters, date bounds first.
    pub fn params(&self) -> Vec<(String, Value)> {
        let mut params = vec![
            (
                ":date_from".to_string(),
                Value::Text(time::format_stored(&self.date_from)),
            ),
            (
                ":date_to".to_string(),
                Value::Text(time::format_stored(&self.date_to)),
            ),
        ];
        params.extend(self.params.iter().cloned());
        params
    }

    /// Inclusive date bounds.
    pub fn date_bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.date_from, self.date_to)
    }

    /// Number of clauses beyond the date range.
    pub fn extra_clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Stable fingerprint of SQL text and parameter values.
    pub fn cache_key(&self) -> String {
        let params: Vec<String> = self
            .params()
            .into_iter()
            .map(|(name, value)| format!("{}={:?}", name, value))
            .collect();
        format!("{}|{}", self.sql(), params.join(","))
    }
}

/// Parameters in the shape rusqlite's named binding expects.
pub fn named_params(params: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    params
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

/// Escape LIKE wildcards so the keyword matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request() -> FilterRequest {
        FilterRequest::ending_on(day(2024, 6, 30))
    }

    fn param(p: &Predicate, name: &str) -> Option<Value> {
        p.params()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    #[test]
    fn test_date_clause_always_present() {
        let p = Predicate::build(&request());
        assert_eq!(p.sql(), DATE_CLAUSE);
        assert_eq!(p.extra_clause_count(), 0);
        assert_eq!(
            param(&p, ":date_from"),
            Some(Value::Text("2024-05-31 00:00:00".to_string()))
        );
        assert_eq!(
            param(&p, ":date_to"),
            Some(Value::Text("2024-06-30 23:59:59".to_string()))
        );
    }

    #[test]
    fn test_selection_adds_in_clause() {
        let mut req = request();
        req.platforms = vec!["iOS".to_string(), "Android".to_string()];
        let p = Predicate::build(&req);
        assert!(p.sql().contains("i.platform IN (:platform_0, :platform_1)"));
        assert_eq!(param(&p, ":platform_1"), Some(Value::Text("Android".to_string())));
        assert!(!p.sql().contains("i.locale"));
    }

    #[test]
    fn test_sentinel_selection_is_unrestricted() {
        let mut req = request();
        req.categories = vec!["ALL".to_string(), " ".to_string()];
        let p = Predicate::build(&req);
        assert_eq!(p.extra_clause_count(), 0);
    }

    #[test]
    fn test_keyword_clause() {
        let mut req = request();
        req.keyword = Some("  timeout  ".to_string());
        let p = Predicate::build(&req);
        let sql = p.sql();
        for col in KEYWORD_COLUMNS {
            assert!(sql.contains(&format!("i.{} LIKE :kw", col)));
        }
        assert!(sql.contains(" OR "));
        assert_eq!(param(&p, ":kw"), Some(Value::Text("%timeout%".to_string())));
    }

    #[test]
    fn test_blank_keyword_adds_nothing() {
        let mut req = request();
        req.keyword = Some("   ".to_string());
        assert_eq!(Predicate::build(&req).extra_clause_count(), 0);
    }

    #[test]
    fn test_keyword_wildcards_are_escaped() {
        let mut req = request();
        req.keyword = Some("50%_off".to_string());
        let p = Predicate::build(&req);
        assert_eq!(
            param(&p, ":kw"),
            Some(Value::Text("%50\\%\\_off%".to_string()))
        );
    }

    #[test]
    fn test_user_values_never_reach_sql_text() {
        let mut req = request();
        req.locales = vec!["ko'); DROP TABLE incidents; --".to_string()];
        req.keyword = Some("x' OR '1'='1".to_string());
        let sql = Predicate::build(&req).sql();
        assert!(!sql.contains("DROP"));
        assert!(!sql.contains("'1'='1"));
    }

    #[test]
    fn test_end_before_start_is_clamped() {
        let mut req = request();
        req.date_from = day(2024, 6, 10);
        req.date_to = day(2024, 6, 1);
        let p = Predicate::build(&req);
        let (from, to) = p.date_bounds();
        assert_eq!(from.date(), day(2024, 6, 10));
        assert_eq!(to.date(), day(2024, 6, 10));
    }

    #[test]
    fn test_for_day_keeps_other_clauses() {
        let mut req = request();
        req.categories = vec!["Login".to_string()];
        let p = Predicate::build(&req);
        let today = p.for_day(day(2024, 7, 4));
        assert_eq!(today.sql(), p.sql());
        assert_eq!(
            param(&today, ":date_from"),
            Some(Value::Text("2024-07-04 00:00:00".to_string()))
        );
        assert_eq!(param(&today, ":category_0"), param(&p, ":category_0"));
    }

    #[test]
    fn test_cache_key_distinguishes_values() {
        let mut a = request();
        a.platforms = vec!["iOS".to_string()];
        let mut b = request();
        b.platforms = vec!["Android".to_string()];
        assert_ne!(
            Predicate::build(&a).cache_key(),
            Predicate::build(&b).cache_key()
        );
        assert_eq!(
            Predicate::build(&a).cache_key(),
            Predicate::build(&a.clone()).cache_key()
        );
    }
}
