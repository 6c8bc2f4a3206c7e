//! Error types for the incident board.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the incident board.
#[derive(Error, Debug)]
pub enum Error {
    // Startup errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database connection failed: {0}")]
    Connection(String),

    // Read errors
    #[error("Query failed: {0}")]
    Query(String),

    // Input errors
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Incident not found: {0}")]
    NotFound(i64),

    // Write errors
    #[error("Write failed, nothing was changed: {0}")]
    Mutation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Upload parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Config file errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error from a string.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Wrap a storage error raised while reading.
    pub fn query(err: rusqlite::Error) -> Self {
        Error::Query(storage_message(&err))
    }

    /// Wrap a storage error raised while writing.
    pub fn mutation(err: rusqlite::Error) -> Self {
        Error::Mutation(storage_message(&err))
    }

    /// Whether the error should stop the program before any command runs.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Connection(_))
    }
}

/// User-facing text for a storage error. Statement text is never included.
pub fn storage_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
        other => match other.sqlite_error() {
            Some(code) => code.to_string(),
            None => other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_message_omits_statement() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let placeholders = vec!["?"; 40_000].join(", ");
        let sql = format!("SELECT 1 WHERE 1 IN ({})", placeholders);
        let err = conn.prepare(&sql).map(|_| ()).unwrap_err();
        let msg = storage_message(&err);
        assert!(!msg.contains("?, ?"), "{}", msg);
        assert!(msg.len() < 200);
    }

    #[test]
    fn test_startup_errors_are_fatal() {
        assert!(Error::Config("name missing".into()).is_fatal());
        assert!(Error::Connection("refused".into()).is_fatal());
        assert!(!Error::validation("bad id").is_fatal());
        assert!(!Error::NotFound(3).is_fatal());
    }
}
