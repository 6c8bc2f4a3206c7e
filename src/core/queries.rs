//! Read queries over the `incidents` table.
//!
//! Every executor takes a [`Predicate`] and is side-effect free. Storage
//! faults surface as [`Error::Query`].

use super::predicate::{named_params, Predicate};
use crate::models::incident::{CategoricalField, Incident, IncidentListRow};
use crate::utils::time;
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Label used for groups with no value.
pub const NO_VALUE: &str = "-";

const INCIDENT_COLUMNS: &str = "i.id, i.started_at, i.ended_at, i.duration, i.platform, \
     i.locale, i.inquiry_count, i.category, i.description, i.cause, i.response, i.note, \
     i.created_at, i.updated_at";

/// A value of a categorical field and how many incidents carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub value: String,
    pub count: i64,
}

/// Incidents started on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

/// KPI figures for a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Incidents matching the predicate.
    pub total: i64,
    /// Incidents matching the predicate that started today.
    pub today: i64,
    /// Most frequent category, `("-", 0)` when nothing matches.
    pub top_category: GroupCount,
    /// Counts per platform, largest first.
    pub by_platform: Vec<GroupCount>,
}

/// Count incidents matching the predicate.
pub fn count(conn: &Connection, predicate: &Predicate) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM incidents i WHERE {}", predicate.sql());
    let params = predicate.params();
    conn.query_row(&sql, named_params(&params).as_slice(), |row| row.get(0))
        .map_err(Error::query)
}

/// Count incidents matching the predicate on one day.
pub fn count_on_day(conn: &Connection, predicate: &Predicate, day: NaiveDate) -> Result<i64> {
    count(conn, &predicate.for_day(day))
}

/// Count incidents matching the predicate that started today.
pub fn count_today(conn: &Connection, predicate: &Predicate) -> Result<i64> {
    count_on_day(conn, predicate, time::today())
}

/// Count incidents per value of a categorical field.
///
/// Sorted by count descending, ties broken by value. `top` keeps only the
/// first N groups.
pub fn grouped_count(
    conn: &Connection,
    predicate: &Predicate,
    field: CategoricalField,
    top: Option<usize>,
) -> Result<Vec<GroupCount>> {
    let column = field.column();
    let mut sql = format!(
        "SELECT COALESCE(NULLIF(TRIM(i.{col}), ''), '{none}') AS grp, COUNT(*) AS cnt \
         FROM incidents i WHERE {pred} GROUP BY grp ORDER BY cnt DESC, grp ASC",
        col = column,
        none = NO_VALUE,
        pred = predicate.sql()
    );
    let mut params = predicate.params();
    if let Some(n) = top {
        sql.push_str(" LIMIT :top");
        params.push((":top".to_string(), Value::Integer(n as i64)));
    }

    let mut stmt = conn.prepare(&sql).map_err(Error::query)?;
    let rows = stmt
        .query_map(named_params(&params).as_slice(), |row| {
            Ok(GroupCount {
                value: row.get(0)?,
                count: row.get(1)?,
            })
        })
        .map_err(Error::query)?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::query)
}

/// The most frequent category, or `("-", 0)` when nothing matches.
pub fn top_category(conn: &Connection, predicate: &Predicate) -> Result<GroupCount> {
    let top = grouped_count(conn, predicate, CategoricalField::Category, Some(1))?;
    Ok(top.into_iter().next().unwrap_or(GroupCount {
        value: NO_VALUE.to_string(),
        count: 0,
    }))
}

/// Incidents per start day, oldest first.
pub fn daily_counts(conn: &Connection, predicate: &Predicate) -> Result<Vec<DailyCount>> {
    let sql = format!(
        "SELECT date(i.started_at) AS d, COUNT(*) AS cnt FROM incidents i \
         WHERE {} GROUP BY d ORDER BY d",
        predicate.sql()
    );
    let params = predicate.params();
    let mut stmt = conn.prepare(&sql).map_err(Error::query)?;
    let rows = stmt
        .query_map(named_params(&params).as_slice(), |row| {
            let raw: String = row.get(0)?;
            let day = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
            Ok(DailyCount {
                day,
                count: row.get(1)?,
            })
        })
        .map_err(Error::query)?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::query)
}

/// KPI bundle: total, today, top category and platform breakdown.
pub fn summary(conn: &Connection, predicate: &Predicate) -> Result<Summary> {
    Ok(Summary {
        total: count(conn, predicate)?,
        today: count_today(conn, predicate)?,
        top_category: top_category(conn, predicate)?,
        by_platform: grouped_count(conn, predicate, CategoricalField::Platform, None)?,
    })
}

/// Fetch matching incidents, newest first, at most `limit` rows.
pub fn list(conn: &Connection, predicate: &Predicate, limit: u32) -> Result<Vec<IncidentListRow>> {
    let sql = format!(
        "SELECT {} FROM incidents i WHERE {} ORDER BY i.started_at DESC, i.id DESC LIMIT :limit",
        INCIDENT_COLUMNS,
        predicate.sql()
    );
    let mut params = predicate.params();
    params.push((":limit".to_string(), Value::Integer(i64::from(limit))));

    let mut stmt = conn.prepare(&sql).map_err(Error::query)?;
    let rows = stmt
        .query_map(named_params(&params).as_slice(), map_incident)
        .map_err(Error::query)?;

    let incidents = rows
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::query)?;
    tracing::debug!("Listed {} incidents (limit {})", incidents.len(), limit);
    Ok(incidents.into_iter().map(IncidentListRow::from).collect())
}

/// Fetch one incident by id.
pub fn get(conn: &Connection, id: i64) -> Result<Option<Incident>> {
    let sql = format!("SELECT {} FROM incidents i WHERE i.id = :id", INCIDENT_COLUMNS);
    conn.query_row(&sql, rusqlite::named_params! { ":id": id }, map_incident)
        .optional()
        .map_err(Error::query)
}

/// Sorted distinct non-blank values of a categorical field.
pub fn distinct_values(conn: &Connection, field: CategoricalField) -> Result<Vec<String>> {
    let column = field.column();
    let sql = format!(
        "SELECT DISTINCT {col} FROM incidents WHERE {col} IS NOT NULL AND {col} <> '' ORDER BY {col}",
        col = column
    );
    let mut stmt = conn.prepare(&sql).map_err(Error::query)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(Error::query)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::query)
}

fn map_incident(row: &Row<'_>) -> rusqlite::Result<Incident> {
    Ok(Incident {
        id: row.get(0)?,
        started_at: timestamp(row, 1)?,
        ended_at: optional_timestamp(row, 2)?,
        duration: row.get(3)?,
        platform: row.get(4)?,
        locale: row.get(5)?,
        inquiry_count: row.get(6)?,
        category: row.get(7)?,
        description: row.get(8)?,
        cause: row.get(9)?,
        response: row.get(10)?,
        note: row.get(11)?,
        created_at: timestamp(row, 12)?,
        updated_at: timestamp(row, 13)?,
    })
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    time::parse_stored(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.trim().is_empty() => time::parse_stored(&raw)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        _ => Ok(None),
    }
}
