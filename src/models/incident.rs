//! Incident data model.

use crate::utils::{text, time};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Row id assigned by storage.
    pub id: i64,
    /// When the disruption started.
    pub started_at: NaiveDateTime,
    /// When the disruption ended, if it has.
    pub ended_at: Option<NaiveDateTime>,
    /// Free-text duration (e.g. "1h 20m").
    pub duration: Option<String>,
    /// Affected platform.
    pub platform: Option<String>,
    /// Affected locale.
    pub locale: Option<String>,
    /// Number of customer inquiries received.
    pub inquiry_count: Option<i64>,
    /// Incident category.
    pub category: String,
    /// What happened.
    pub description: String,
    /// Root cause.
    pub cause: Option<String>,
    /// What was done about it.
    pub response: Option<String>,
    /// Anything else.
    pub note: Option<String>,
    /// Set by storage on insert.
    pub created_at: NaiveDateTime,
    /// Set by storage on insert and update.
    pub updated_at: NaiveDateTime,
}

/// The user-supplied part of an incident, validated.
///
/// Used for both inserts and whole-record updates.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDraft {
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub platform: Option<String>,
    pub locale: Option<String>,
    pub inquiry_count: Option<i64>,
    pub category: String,
    pub description: String,
    pub cause: Option<String>,
    pub response: Option<String>,
    pub note: Option<String>,
}

/// Raw form input for an incident, before validation.
#[derive(Debug, Clone, Default)]
pub struct IncidentInput {
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration: Option<String>,
    pub platform: Option<String>,
    pub locale: Option<String>,
    pub inquiry_count: Option<i64>,
    pub category: String,
    pub description: String,
    pub cause: Option<String>,
    pub response: Option<String>,
    pub note: Option<String>,
}

impl IncidentDraft {
    /// Validate raw input.
    ///
    /// Category and description must be non-blank and the start timestamp
    /// must parse. A non-blank end timestamp must parse too; everything else
    /// becomes `None` when blank.
    pub fn from_input(input: IncidentInput) -> Result<Self> {
        let category = input.category.trim();
        if category.is_empty() {
            return Err(Error::validation("category is required"));
        }
        if input.description.trim().is_empty() {
            return Err(Error::validation("description is required"));
        }

        let started_at = time::parse_timestamp(&input.started_at).ok_or_else(|| {
            Error::validation(format!(
                "start time '{}' is not a valid timestamp",
                input.started_at
            ))
        })?;

        let ended_at = match text::non_blank(input.ended_at.as_deref()) {
            Some(raw) => Some(time::parse_timestamp(&raw).ok_or_else(|| {
                Error::validation(format!("end time '{}' is not a valid timestamp", raw))
            })?),
            None => None,
        };

        Ok(Self {
            started_at,
            ended_at,
            duration: text::non_blank(input.duration.as_deref()),
            platform: text::non_blank(input.platform.as_deref()),
            locale: text::non_blank(input.locale.as_deref()),
            inquiry_count: input.inquiry_count,
            category: category.to_string(),
            description: input.description,
            cause: blank_to_none(input.cause),
            response: blank_to_none(input.response),
            note: blank_to_none(input.note),
        })
    }

    /// Whether the end time precedes the start time.
    pub fn ends_before_start(&self) -> bool {
        self.ended_at.is_some_and(|end| end < self.started_at)
    }
}

/// Long text keeps its own whitespace; only all-blank values become `None`.
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// An incident shaped for listings.
///
/// Timestamps are pre-formatted and line endings in the long text fields
/// are normalized to `\n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentListRow {
    pub id: i64,
    pub started_at: String,
    pub ended_at: String,
    pub duration: Option<String>,
    pub platform: Option<String>,
    pub locale: Option<String>,
    pub inquiry_count: Option<i64>,
    pub category: String,
    pub description: String,
    pub cause: Option<String>,
    pub response: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Incident> for IncidentListRow {
    fn from(incident: Incident) -> Self {
        let normalize = |v: Option<String>| v.map(|s| text::normalize_newlines(&s));
        Self {
            id: incident.id,
            started_at: time::format_display(&incident.started_at),
            ended_at: incident
                .ended_at
                .as_ref()
                .map(time::format_display)
                .unwrap_or_default(),
            duration: incident.duration,
            platform: incident.platform,
            locale: incident.locale,
            inquiry_count: incident.inquiry_count,
            category: incident.category,
            description: text::normalize_newlines(&incident.description),
            cause: normalize(incident.cause),
            response: normalize(incident.response),
            note: normalize(incident.note),
            created_at: time::format_stored(&incident.created_at),
            updated_at: time::format_stored(&incident.updated_at),
        }
    }
}

/// Categorical incident fields that can be filtered and grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalField {
    Platform,
    Locale,
    Category,
}

impl CategoricalField {
    /// All categorical fields, in display order.
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Platform,
        CategoricalField::Locale,
        CategoricalField::Category,
    ];

    /// Column name in the `incidents` table.
    pub fn column(&self) -> &'static str {
        match self {
            CategoricalField::Platform => "platform",
            CategoricalField::Locale => "locale",
            CategoricalField::Category => "category",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> IncidentInput {
        IncidentInput {
            started_at: "2024-05-01 09:00".to_string(),
            category: "Payment".to_string(),
            description: "Card payments failing".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_defaults_optional_fields_to_none() {
        let draft = IncidentDraft::from_input(IncidentInput {
            platform: Some("  ".to_string()),
            cause: Some("".to_string()),
            ..input()
        })
        .unwrap();
        assert_eq!(draft.platform, None);
        assert_eq!(draft.cause, None);
        assert_eq!(draft.ended_at, None);
        assert_eq!(draft.category, "Payment");
    }

    #[test]
    fn test_draft_requires_category_and_description() {
        let err = IncidentDraft::from_input(IncidentInput {
            category: "   ".to_string(),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = IncidentDraft::from_input(IncidentInput {
            description: "\n".to_string(),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_draft_rejects_bad_timestamps() {
        let err = IncidentDraft::from_input(IncidentInput {
            started_at: "soon".to_string(),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = IncidentDraft::from_input(IncidentInput {
            ended_at: Some("later".to_string()),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_draft_keeps_multiline_text() {
        let draft = IncidentDraft::from_input(IncidentInput {
            description: "line 1\nline 2\n".to_string(),
            ..input()
        })
        .unwrap();
        assert_eq!(draft.description, "line 1\nline 2\n");
    }

    #[test]
    fn test_ends_before_start() {
        let draft = IncidentDraft::from_input(IncidentInput {
            ended_at: Some("2024-04-30 23:00".to_string()),
            ..input()
        })
        .unwrap();
        assert!(draft.ends_before_start());
    }
}
