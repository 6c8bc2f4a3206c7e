//! Insert, update and delete handlers.
//!
//! Every write runs in its own transaction; an error drops the transaction
//! uncommitted, so nothing is partially applied.

use crate::models::incident::IncidentDraft;
use crate::utils::time;
use crate::{Error, Result};
use regex::Regex;
use rusqlite::{params, params_from_iter, Connection, Transaction};
use std::collections::HashSet;

/// Columns written by inserts, in bind order.
pub const INSERT_COLUMNS: [&str; 11] = [
    "started_at",
    "ended_at",
    "duration",
    "platform",
    "locale",
    "inquiry_count",
    "category",
    "description",
    "cause",
    "response",
    "note",
];

const INSERT_SQL: &str = "INSERT INTO incidents (started_at, ended_at, duration, platform, \
     locale, inquiry_count, category, description, cause, response, note) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

const UPDATE_SQL: &str = "UPDATE incidents SET started_at = ?1, ended_at = ?2, duration = ?3, \
     platform = ?4, locale = ?5, inquiry_count = ?6, category = ?7, description = ?8, \
     cause = ?9, response = ?10, note = ?11, updated_at = datetime('now', 'localtime') \
     WHERE id = ?12";

/// Ids bound per DELETE statement, well under the engine's variable limit.
const DELETE_CHUNK: usize = 500;

fn id_separator() -> Result<Regex> {
    Regex::new(r"[,\s]+").map_err(|e| Error::validation(e.to_string()))
}

/// Parse a comma or whitespace separated id list such as `"101, 102 120"`.
///
/// Blank entries are skipped; any other non-integer entry is rejected.
/// Duplicates are dropped, keeping first-seen order.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    parse_id_entries(&[raw])
}

/// Parse ids given as separate entries; each entry may itself be a list.
pub fn parse_id_entries<S: AsRef<str>>(entries: &[S]) -> Result<Vec<i64>> {
    let separator = id_separator()?;
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        for token in separator.split(entry.as_ref()) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let id: i64 = token
                .parse()
                .map_err(|_| Error::validation(format!("'{}' is not a valid id", token)))?;
            if seen.insert(id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

/// Delete every incident whose id is listed. Returns the rows removed.
///
/// An empty list is a validation error and nothing is sent to storage.
pub fn delete_by_ids(conn: &mut Connection, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Err(Error::validation("no ids given"));
    }

    let tx = conn.transaction().map_err(Error::mutation)?;
    let mut removed = 0;
    for chunk in ids.chunks(DELETE_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!("DELETE FROM incidents WHERE id IN ({})", placeholders);
        removed += tx
            .execute(&sql, params_from_iter(chunk.iter()))
            .map_err(Error::mutation)?;
    }
    tx.commit().map_err(Error::mutation)?;

    tracing::info!("Deleted {} of {} requested incidents", removed, ids.len());
    Ok(removed)
}

/// Insert one incident. Returns the new id.
pub fn insert(conn: &mut Connection, draft: &IncidentDraft) -> Result<i64> {
    let tx = conn.transaction().map_err(Error::mutation)?;
    let id = insert_draft(&tx, draft)?;
    tx.commit().map_err(Error::mutation)?;

    tracing::info!("Inserted incident {}", id);
    Ok(id)
}

/// Overwrite every user field of an existing incident.
pub fn update(conn: &mut Connection, id: i64, draft: &IncidentDraft) -> Result<()> {
    let tx = conn.transaction().map_err(Error::mutation)?;
    let changed = tx
        .execute(
            UPDATE_SQL,
            params![
                time::format_stored(&draft.started_at),
                draft.ended_at.as_ref().map(time::format_stored),
                draft.duration,
                draft.platform,
                draft.locale,
                draft.inquiry_count,
                draft.category,
                draft.description,
                draft.cause,
                draft.response,
                draft.note,
                id,
            ],
        )
        .map_err(Error::mutation)?;
    if changed == 0 {
        return Err(Error::NotFound(id));
    }
    tx.commit().map_err(Error::mutation)?;

    tracing::info!("Updated incident {}", id);
    Ok(())
}

/// Insert a validated draft inside an open transaction.
pub(crate) fn insert_draft(tx: &Transaction<'_>, draft: &IncidentDraft) -> Result<i64> {
    tx.execute(
        INSERT_SQL,
        params![
            time::format_stored(&draft.started_at),
            draft.ended_at.as_ref().map(time::format_stored),
            draft.duration,
            draft.platform,
            draft.locale,
            draft.inquiry_count,
            draft.category,
            draft.description,
            draft.cause,
            draft.response,
            draft.note,
        ],
    )
    .map_err(Error::mutation)?;
    Ok(tx.last_insert_rowid())
}

/// SQL for inserting one row with [`INSERT_COLUMNS`] bound positionally.
pub(crate) fn insert_sql() -> &'static str {
    INSERT_SQL
}
