//! Connection settings check.

use super::CheckResult;
use crate::models::config::DbSettings;

/// Report which database the settings resolved to.
pub fn check(settings: &DbSettings) -> CheckResult {
    if settings.name.trim().is_empty() {
        return CheckResult::fail(
            "Config",
            "database name is empty",
            "Set NAME in the [db] section of secrets.toml or DB_NAME",
        );
    }
    let message = match &settings.host {
        Some(host) => format!(
            "database '{}' (host {}:{}, user {})",
            settings.name,
            host,
            settings.port,
            settings.user.as_deref().unwrap_or("-")
        ),
        None => format!("database '{}'", settings.name),
    };
    CheckResult::ok("Config", &message)
}
