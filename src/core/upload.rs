//! Bulk upload of delimited incident files.
//!
//! The whole file is validated before anything is written, then every row
//! is appended in a single transaction.

use super::mutations::{insert_sql, INSERT_COLUMNS};
use crate::utils::time;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Columns a file must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["started_at", "category", "description"];

/// One parsed file row. Unparseable values are already `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRow {
    pub started_at: Option<NaiveDateTime>,
    pub ended_at: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub platform: Option<String>,
    pub locale: Option<String>,
    pub inquiry_count: Option<i64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cause: Option<String>,
    pub response: Option<String>,
    pub note: Option<String>,
}

/// A validated file, ready to append.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    /// Parsed rows in file order.
    pub rows: Vec<UploadRow>,
    /// Header names that are not incident columns.
    pub ignored_columns: Vec<String>,
    /// Optional incident columns absent from the file (stored as NULL).
    pub missing_columns: Vec<String>,
    /// Timestamp cells that did not parse and became NULL.
    pub unparsed_timestamps: usize,
    /// Inquiry count cells that did not parse and became NULL.
    pub unparsed_counts: usize,
}

/// Delimiter for a file, picked from its extension.
///
/// Spreadsheet formats are rejected; export them as CSV first.
pub fn delimiter_for(path: &Path) -> Result<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "tsv" | "tab" => Ok(b'\t'),
        "xlsx" | "xls" => Err(Error::validation(format!(
            "{}: spreadsheet files are not supported, save it as CSV",
            path.display()
        ))),
        _ => Ok(b','),
    }
}

/// Read and validate an upload file.
pub fn read_upload(path: &Path) -> Result<UploadBatch> {
    let delimiter = delimiter_for(path)?;
    let file = std::fs::File::open(path)?;
    tracing::debug!("Reading upload {}", path.display());
    parse_delimited(file, delimiter)
}

/// Parse delimited text with a header row.
///
/// Header names are trimmed and lowercased. A file missing any of
/// [`REQUIRED_COLUMNS`] is rejected as a whole.
pub fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> Result<UploadBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ignored_columns = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        match INSERT_COLUMNS.iter().find(|c| **c == header.as_str()) {
            Some(column) => {
                index.entry(*column).or_insert(i);
            }
            None => ignored_columns.push(header.clone()),
        }
    }

    let missing_required: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !index.contains_key(c))
        .collect();
    if !missing_required.is_empty() {
        return Err(Error::validation(format!(
            "missing required columns: {}",
            missing_required.join(", ")
        )));
    }

    let missing_columns: Vec<String> = INSERT_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(*c))
        .map(|c| c.to_string())
        .collect();

    let mut batch = UploadBatch {
        ignored_columns,
        missing_columns,
        ..Default::default()
    };

    for record in rdr.records() {
        let record = record?;
        let cell = |column: &str| {
            index
                .get(column)
                .and_then(|i| record.get(*i))
                .filter(|v| !v.trim().is_empty())
        };

        let mut timestamp = |column: &str| -> Option<NaiveDateTime> {
            let raw = cell(column)?;
            let parsed = time::parse_timestamp(raw);
            if parsed.is_none() {
                batch.unparsed_timestamps += 1;
            }
            parsed
        };
        let started_at = timestamp("started_at");
        let ended_at = timestamp("ended_at");

        let inquiry_count = match cell("inquiry_count") {
            Some(raw) => {
                let parsed = coerce_count(raw);
                if parsed.is_none() {
                    batch.unparsed_counts += 1;
                }
                parsed
            }
            None => None,
        };

        let short = |column: &str| cell(column).map(|v| v.trim().to_string());
        let long = |column: &str| cell(column).map(str::to_string);

        batch.rows.push(UploadRow {
            started_at,
            ended_at,
            duration: short("duration"),
            platform: short("platform"),
            locale: short("locale"),
            inquiry_count,
            category: short("category"),
            description: long("description"),
            cause: long("cause"),
            response: long("response"),
            note: long("note"),
        });
    }

    tracing::debug!(
        "Parsed {} rows ({} ignored columns, {} unparsed timestamps)",
        batch.rows.len(),
        batch.ignored_columns.len(),
        batch.unparsed_timestamps
    );
    Ok(batch)
}

/// Permissive integer coercion: `"12"` and `"12.0"` both give 12.
fn coerce_count(raw: &str) -> Option<i64> {
    let s = raw.trim().replace(',', "");
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

/// Append every row of a batch in one transaction. Returns rows written.
///
/// A row the storage rejects (for example one whose start time did not
/// parse) aborts the whole batch.
pub fn append(conn: &mut Connection, batch: &UploadBatch) -> Result<usize> {
    let tx = conn.transaction().map_err(Error::mutation)?;
    {
        let mut stmt = tx.prepare(insert_sql()).map_err(Error::mutation)?;
        for (i, row) in batch.rows.iter().enumerate() {
            stmt.execute(params![
                row.started_at.as_ref().map(time::format_stored),
                row.ended_at.as_ref().map(time::format_stored),
                row.duration,
                row.platform,
                row.locale,
                row.inquiry_count,
                row.category,
                row.description,
                row.cause,
                row.response,
                row.note,
            ])
            .map_err(|e| {
                Error::Mutation(format!("row {}: {}", i + 1, crate::error::storage_message(&e)))
            })?;
        }
    }
    tx.commit().map_err(Error::mutation)?;

    tracing::info!("Appended {} uploaded incidents", batch.rows.len());
    Ok(batch.rows.len())
}
