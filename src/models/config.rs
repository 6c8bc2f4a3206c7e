//! Configuration model.
//!
//! Connection settings are layered: a secrets file first, then environment
//! variables. The secrets file may use either the `[db]` section or the
//! legacy `[DB]` section with `DB_`-prefixed keys.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default database port.
pub const DEFAULT_PORT: u16 = 3306;

/// Environment variable that overrides the secrets file location.
pub const SECRETS_ENV: &str = "INCIDENT_BOARD_SECRETS";

/// Application configuration (non-secret settings).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read cache configuration.
    pub cache: CacheConfig,
    /// Listing configuration.
    pub list: ListConfig,
}

/// Read cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for summaries, series and listings, in seconds.
    pub read_ttl_secs: u64,
    /// TTL for distinct categorical values, in seconds.
    pub facet_ttl_secs: u64,
}

/// Listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Row limit used when `--limit` is not given.
    pub default_limit: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            read_ttl_secs: 90,
            facet_ttl_secs: 180,
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: crate::models::filter::DEFAULT_ROW_LIMIT,
        }
    }
}

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("incident_board")
}

/// Load configuration from file, falling back to defaults.
pub fn load_config() -> Config {
    let config_path = config_dir().join("config.toml");

    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {}", config_path.display(), e),
            },
            Err(e) => tracing::warn!("Cannot read {}: {}", config_path.display(), e),
        }
    }

    Config::default()
}

/// Where the secrets file lives.
///
/// An explicit path wins, then `INCIDENT_BOARD_SECRETS`, then
/// `secrets.toml` in the config directory.
pub fn secrets_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(SECRETS_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_dir().join("secrets.toml"),
    }
}

/// Read the secrets file. A missing file is not an error.
pub fn load_secrets(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        tracing::debug!("No secrets file at {}", path.display());
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(table))
}

/// Where the embedded database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    /// Throwaway in-memory database.
    Memory,
    /// Database file.
    File(PathBuf),
}

impl fmt::Display for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbTarget::Memory => f.write_str(":memory:"),
            DbTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolved connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: String,
}

/// Key names for one secrets-file convention, in lookup order.
struct KeyNames {
    host: &'static [&'static str],
    port: &'static [&'static str],
    user: &'static [&'static str],
    password: &'static [&'static str],
    name: &'static [&'static str],
}

const CURRENT_KEYS: KeyNames = KeyNames {
    host: &["HOST", "host"],
    port: &["PORT", "port"],
    user: &["USER", "user"],
    password: &["PASSWORD", "password"],
    name: &["NAME", "name"],
};

const LEGACY_KEYS: KeyNames = KeyNames {
    host: &["DB_HOST", "HOST"],
    port: &["DB_PORT", "PORT"],
    user: &["DB_USER", "USER"],
    password: &["DB_PASSWORD", "PASSWORD"],
    name: &["DB_NAME", "NAME"],
};

impl DbSettings {
    /// Resolve settings from the secrets file and the process environment.
    pub fn from_sources(secrets_file: Option<&Path>) -> Result<Self> {
        let path = secrets_path(secrets_file);
        let secrets = load_secrets(&path)?;
        Self::resolve(secrets.as_ref(), |key| std::env::var(key).ok())
    }

    /// Resolve settings from an optional secrets table and an env lookup.
    ///
    /// Exactly one source is consulted: the `[db]` section if present,
    /// otherwise the legacy `[DB]` section, otherwise the `DB_*` variables.
    /// Environment values never mix into a secrets section.
    pub fn resolve<F>(secrets: Option<&toml::Table>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = secrets.and_then(|s| {
            if let Some(toml::Value::Table(t)) = s.get("db") {
                Some((t, &CURRENT_KEYS))
            } else if let Some(toml::Value::Table(t)) = s.get("DB") {
                Some((t, &LEGACY_KEYS))
            } else {
                None
            }
        });

        let lookup = |pick: fn(&KeyNames) -> &'static [&'static str], env_key: &str| {
            match section {
                Some((table, keys)) => first_value(table, pick(keys)),
                None => env(env_key).filter(|v| !v.trim().is_empty()),
            }
        };

        let host = lookup(|k| k.host, "DB_HOST");
        let port = match lookup(|k| k.port, "DB_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("port '{}' is not a valid port", raw)))?,
            None => DEFAULT_PORT,
        };
        let user = lookup(|k| k.user, "DB_USER");
        let password = lookup(|k| k.password, "DB_PASSWORD");
        let name = lookup(|k| k.name, "DB_NAME").ok_or_else(|| {
            Error::Config(
                "database name is missing. Add NAME to the [db] (or legacy [DB]) section \
                 of the secrets file, or set DB_NAME"
                    .to_string(),
            )
        })?;

        if host.is_some() && (user.is_none() || password.is_none()) {
            return Err(Error::Config(
                "HOST is set but USER/PASSWORD are missing".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            user,
            password,
            name,
        })
    }

    /// Map the database name onto the embedded engine.
    ///
    /// `:memory:` opens an in-memory database; a name that looks like a path
    /// is used as-is; anything else becomes `<dir>/<name>.db`.
    pub fn target_in(&self, dir: &Path) -> DbTarget {
        let name = self.name.trim();
        if name == ":memory:" {
            return DbTarget::Memory;
        }
        let looks_like_path = name.contains('/')
            || name.contains('\\')
            || name.ends_with(".db")
            || name.ends_with(".sqlite");
        if looks_like_path {
            DbTarget::File(PathBuf::from(name))
        } else {
            DbTarget::File(dir.join(format!("{}.db", name)))
        }
    }

    /// Map the database name onto the embedded engine under the config directory.
    pub fn target(&self) -> DbTarget {
        self.target_in(&config_dir())
    }
}

// Keeps the password out of logs.
impl fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("name", &self.name)
            .finish()
    }
}

fn first_value(table: &toml::Table, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match table.get(*key)? {
        toml::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn table(src: &str) -> toml::Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_current_section() {
        let secrets = table(
            r#"
            [db]
            HOST = "db.internal"
            PORT = 3307
            USER = "ops"
            PASSWORD = "secret"
            NAME = "incidents"
            "#,
        );
        let s = DbSettings::resolve(Some(&secrets), no_env).unwrap();
        assert_eq!(s.host.as_deref(), Some("db.internal"));
        assert_eq!(s.port, 3307);
        assert_eq!(s.user.as_deref(), Some("ops"));
        assert_eq!(s.name, "incidents");
    }

    #[test]
    fn test_lowercase_keys() {
        let secrets = table(
            r#"
            [db]
            name = "incidents"
            port = "4000"
            "#,
        );
        let s = DbSettings::resolve(Some(&secrets), no_env).unwrap();
        assert_eq!(s.name, "incidents");
        assert_eq!(s.port, 4000);
        assert_eq!(s.host, None);
    }

    #[test]
    fn test_legacy_section() {
        let secrets = table(
            r#"
            [DB]
            DB_HOST = "legacy.internal"
            DB_USER = "ops"
            PASSWORD = "secret"
            DB_NAME = "incidents"
            "#,
        );
        let s = DbSettings::resolve(Some(&secrets), no_env).unwrap();
        assert_eq!(s.host.as_deref(), Some("legacy.internal"));
        assert_eq!(s.password.as_deref(), Some("secret"));
        assert_eq!(s.port, DEFAULT_PORT);
    }

    #[test]
    fn test_env_fallback() {
        let env: HashMap<&str, &str> = [("DB_NAME", "from_env"), ("DB_PORT", "3310")]
            .into_iter()
            .collect();
        let s = DbSettings::resolve(None, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(s.name, "from_env");
        assert_eq!(s.port, 3310);
    }

    #[test]
    fn test_secrets_win_over_env() {
        let secrets = table("[db]\nNAME = \"from_file\"\n");
        let s = DbSettings::resolve(Some(&secrets), |_| Some("from_env".to_string())).unwrap();
        assert_eq!(s.name, "from_file");
        assert_eq!(s.port, DEFAULT_PORT);
        assert_eq!(s.host, None);
    }

    #[test]
    fn test_stray_env_ignored_when_section_exists() {
        let env: HashMap<&str, &str> = [
            ("DB_HOST", "other-app"),
            ("DB_PORT", "not-a-port"),
            ("DB_NAME", "other"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let current = table("[db]\nNAME = \"board\"\n");
        let s = DbSettings::resolve(Some(&current), lookup).unwrap();
        assert_eq!(s.name, "board");
        assert_eq!(s.host, None);
        assert_eq!(s.port, DEFAULT_PORT);

        let legacy = table("[DB]\nDB_NAME = \"board\"\n");
        let s = DbSettings::resolve(Some(&legacy), lookup).unwrap();
        assert_eq!(s.name, "board");
        assert_eq!(s.host, None);
    }

    #[test]
    fn test_env_used_when_file_has_no_section() {
        let secrets = table("[other]\nkey = 1\n");
        let s = DbSettings::resolve(Some(&secrets), |k| {
            (k == "DB_NAME").then(|| "from_env".to_string())
        })
        .unwrap();
        assert_eq!(s.name, "from_env");
    }

    #[test]
    fn test_missing_name_is_config_error() {
        let err = DbSettings::resolve(None, no_env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_host_without_credentials_is_config_error() {
        let secrets = table("[db]\nHOST = \"h\"\nNAME = \"n\"\n");
        let err = DbSettings::resolve(Some(&secrets), no_env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let secrets = table("[db]\nPORT = \"abc\"\nNAME = \"n\"\n");
        assert!(DbSettings::resolve(Some(&secrets), no_env).is_err());
    }

    #[test]
    fn test_target_mapping() {
        let dir = Path::new("/tmp/board");
        let mut s = DbSettings {
            host: None,
            port: DEFAULT_PORT,
            user: None,
            password: None,
            name: "incidents".to_string(),
        };
        assert_eq!(
            s.target_in(dir),
            DbTarget::File(PathBuf::from("/tmp/board/incidents.db"))
        );
        s.name = "./data/board.sqlite".to_string();
        assert_eq!(
            s.target_in(dir),
            DbTarget::File(PathBuf::from("./data/board.sqlite"))
        );
        s.name = ":memory:".to_string();
        assert_eq!(s.target_in(dir), DbTarget::Memory);
    }

    #[test]
    fn test_debug_redacts_password() {
        let secrets = table(
            "[db]\nHOST = \"h\"\nUSER = \"u\"\nPASSWORD = \"hunter2\"\nNAME = \"n\"\n",
        );
        let s = DbSettings::resolve(Some(&secrets), no_env).unwrap();
        let shown = format!("{:?}", s);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("***"));
    }
}
