//! Incident storage.
//!
//! Owns the SQLite connection and the `incidents` schema.

use crate::models::config::{DbSettings, DbTarget};
use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;

const SCHEMA: &str = "
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=NORMAL;
    CREATE TABLE IF NOT EXISTS incidents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        duration TEXT,
        platform TEXT,
        locale TEXT,
        inquiry_count INTEGER,
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        cause TEXT,
        response TEXT,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
    );
    CREATE INDEX IF NOT EXISTS idx_incidents_started_at ON incidents(started_at);
    CREATE INDEX IF NOT EXISTS idx_incidents_category ON incidents(category);
";

/// Handle to the incident database.
pub struct IncidentStore {
    conn: Connection,
    target: DbTarget,
}

impl IncidentStore {
    /// Open the database described by resolved settings.
    pub fn open(settings: &DbSettings) -> Result<Self> {
        tracing::debug!("Opening database with {:?}", settings);
        match settings.target() {
            DbTarget::Memory => Self::open_in_memory(),
            DbTarget::File(path) => Self::open_path(&path),
        }
    }

    /// Open (or create) a database file.
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Connection(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::Connection(format!("{}: {}", path.display(), e)))?;
        Self::init(conn, DbTarget::File(path.to_path_buf()))
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Connection(e.to_string()))?;
        Self::init(conn, DbTarget::Memory)
    }

    fn init(conn: Connection, target: DbTarget) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::Connection(format!("schema setup failed: {}", e)))?;
        let store = Self { conn, target };
        store.ping()?;
        tracing::info!("Database ready: {}", store.target);
        Ok(store)
    }

    /// Round-trip a trivial query to prove the database answers.
    pub fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|e| Error::Connection(e.to_string()))
    }

    /// Total rows in the table, ignoring any filter.
    pub fn row_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))
            .map_err(Error::query)
    }

    /// Where this store lives.
    pub fn target(&self) -> &DbTarget {
        &self.target
    }

    /// Connection for reads.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Connection for writes (transactions need `&mut`).
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
