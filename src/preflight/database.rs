//! Database preflight checks.

use super::CheckResult;
use crate::core::store::IncidentStore;

/// Check that the database answers a trivial query.
pub fn check_connection(store: &IncidentStore) -> CheckResult {
    match store.ping() {
        Ok(()) => CheckResult::ok("Database", &format!("connected ({})", store.target())),
        Err(e) => CheckResult::fail(
            "Database",
            &e.to_string(),
            "Check the database name and that the file is readable",
        ),
    }
}

/// Check that the incidents table can be read.
pub fn check_schema(store: &IncidentStore) -> CheckResult {
    match store.row_count() {
        Ok(n) => CheckResult::ok("Schema", &format!("incidents table ready ({} rows)", n)),
        Err(e) => CheckResult::fail(
            "Schema",
            &e.to_string(),
            "Run `incident-board init` to create the table",
        ),
    }
}
