//! Process configuration.
//!
//! # Sources
//!
//! ```text
//! --config <path>                 explicit YAML file
//! ~/.staffsync/config.yaml        used when present
//! environment                     GOOGLE_*, SHEET_*, SUPABASE_*, STAFFSYNC_*
//! ```
//!
//! # API pattern
//!
//! As with the path helpers elsewhere, every lookup has an `_at` / injectable
//! form used by tests and a convenience wrapper that reads ambient state.
//! Only the CLI calls the wrappers; components receive a built
//! [`StaffsyncConfig`] by reference.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_EMPLOYEE_TABLE: &str = "employee_contacts";
pub const DEFAULT_SYNC_LOG_TABLE: &str = "sync_logs";
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Root configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffsyncConfig {
    pub sheet: SheetConfig,
    pub google: ServiceAccountConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which spreadsheet (and which tab) is the grid surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_sheets_api")]
    pub api_base: String,
}

/// Service-account credential set used to mint Sheets access tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountConfig {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountConfig")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Record store endpoint and privileged key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub service_role_key: String,
    #[serde(default = "default_employee_table")]
    pub table: String,
    #[serde(default = "default_sync_log_table")]
    pub log_table: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .field("table", &self.table)
            .field("log_table", &self.log_table)
            .finish()
    }
}

/// HTTP listener settings for the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// When set, the daemon also reconciles on this period.
    #[serde(default)]
    pub sync_interval_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            sync_interval_secs: None,
        }
    }
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_sheets_api() -> String {
    DEFAULT_SHEETS_API.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn default_employee_table() -> String {
    DEFAULT_EMPLOYEE_TABLE.to_string()
}

fn default_sync_log_table() -> String {
    DEFAULT_SYNC_LOG_TABLE.to_string()
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `<home>/.staffsync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".staffsync").join("config.yaml")
}

impl StaffsyncConfig {
    /// Load and validate a YAML config file.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.google.private_key = unescape_newlines(&config.google.private_key);
        config.validate()?;
        Ok(config)
    }

    /// Build from a key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing { key });

        let sync_interval_secs = match get("STAFFSYNC_SYNC_INTERVAL_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|err| {
                ConfigError::Invalid {
                    key: "STAFFSYNC_SYNC_INTERVAL_SECS",
                    message: err.to_string(),
                }
            })?),
            None => None,
        };

        let config = Self {
            sheet: SheetConfig {
                spreadsheet_id: require("SHEET_ID")?,
                sheet_name: get("SHEET_NAME").unwrap_or_else(default_sheet_name),
                api_base: get("SHEETS_API_BASE").unwrap_or_else(default_sheets_api),
            },
            google: ServiceAccountConfig {
                client_email: require("GOOGLE_CLIENT_EMAIL")?,
                private_key: unescape_newlines(&require("GOOGLE_PRIVATE_KEY")?),
                token_uri: get("GOOGLE_TOKEN_URI").unwrap_or_else(default_token_uri),
            },
            store: StoreConfig {
                url: require("SUPABASE_URL")?,
                service_role_key: require("SUPABASE_SERVICE_ROLE_KEY")?,
                table: default_employee_table(),
                log_table: default_sync_log_table(),
            },
            server: ServerConfig {
                bind: get("STAFFSYNC_BIND").unwrap_or_else(default_bind),
                sync_interval_secs,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// `from_lookup` over the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the config for one invocation: explicit path, then the
    /// per-user file under `home`, then `lookup`.
    pub fn resolve_at<F>(
        explicit: Option<&Path>,
        home: Option<&Path>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            return Self::load_at(path);
        }
        if let Some(home) = home {
            let path = config_path_at(home);
            if path.exists() {
                return Self::load_at(&path);
            }
        }
        Self::from_lookup(lookup)
    }

    /// `resolve_at` convenience wrapper over `dirs::home_dir()` and the environment.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let home = dirs::home_dir();
        Self::resolve_at(explicit, home.as_deref(), |key| std::env::var(key).ok())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required: [(&'static str, &str); 5] = [
            ("sheet.spreadsheet_id", &self.sheet.spreadsheet_id),
            ("google.client_email", &self.google.client_email),
            ("google.private_key", &self.google.private_key),
            ("store.url", &self.store.url),
            ("store.service_role_key", &self.store.service_role_key),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { key });
            }
        }
        if self.sheet.sheet_name.contains('!') {
            return Err(ConfigError::Invalid {
                key: "sheet.sheet_name",
                message: "sheet name must not contain '!'".to_string(),
            });
        }
        if self.server.sync_interval_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "server.sync_interval_secs",
                message: "interval must be at least one second".to_string(),
            });
        }
        Ok(())
    }
}

/// Secrets pasted into env files usually carry literal `\n` sequences.
fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("SHEET_ID", "sheet-123".to_string()),
            ("GOOGLE_CLIENT_EMAIL", "svc@proj.iam.gserviceaccount.com".to_string()),
            ("GOOGLE_PRIVATE_KEY", "-----BEGIN KEY-----\\nabc\\n-----END KEY-----".to_string()),
            ("SUPABASE_URL", "https://proj.supabase.co".to_string()),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key".to_string()),
        ])
    }

    fn lookup<'a>(env: &'a HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env.get(key).cloned()
    }

    #[test]
    fn from_lookup_applies_defaults_and_unescapes_key() {
        let env = full_env();
        let config = StaffsyncConfig::from_lookup(lookup(&env)).expect("config");
        assert_eq!(config.sheet.sheet_name, "Sheet1");
        assert_eq!(config.google.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(config.store.table, "employee_contacts");
        assert_eq!(config.store.log_table, "sync_logs");
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.server.sync_interval_secs, None);
        assert!(config.google.private_key.contains("\nabc\n"));
    }

    #[rstest]
    #[case("SHEET_ID")]
    #[case("GOOGLE_CLIENT_EMAIL")]
    #[case("GOOGLE_PRIVATE_KEY")]
    #[case("SUPABASE_URL")]
    #[case("SUPABASE_SERVICE_ROLE_KEY")]
    fn missing_required_value_is_hard_failure(#[case] key: &'static str) {
        let mut env = full_env();
        env.remove(key);
        let err = StaffsyncConfig::from_lookup(lookup(&env)).unwrap_err();
        match err {
            ConfigError::Missing { key: missing } => assert_eq!(missing, key),
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("SUPABASE_URL", "   ".to_string());
        let err = StaffsyncConfig::from_lookup(lookup(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "SUPABASE_URL" }));
    }

    #[test]
    fn invalid_interval_is_rejected() {
        let mut env = full_env();
        env.insert("STAFFSYNC_SYNC_INTERVAL_SECS", "soon".to_string());
        let err = StaffsyncConfig::from_lookup(lookup(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "got: {err}");
    }

    #[test]
    fn zero_interval_from_environment_is_rejected() {
        let mut env = full_env();
        env.insert("STAFFSYNC_SYNC_INTERVAL_SECS", "0".to_string());
        let err = StaffsyncConfig::from_lookup(lookup(&env)).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { key: "server.sync_interval_secs", .. }),
            "got: {err}"
        );
    }

    #[test]
    fn zero_interval_from_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "sheet: {spreadsheet_id: s}\n\
             google: {client_email: a@b.c, private_key: k}\n\
             store: {url: http://db, service_role_key: k}\n\
             server: {sync_interval_secs: 0}\n",
        )
        .unwrap();
        let err = StaffsyncConfig::load_at(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "server.sync_interval_secs", .. }
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let env = full_env();
        let config = StaffsyncConfig::from_lookup(lookup(&env)).expect("config");
        let debug = format!("{config:?}");
        assert!(!debug.contains("service-key"));
        assert!(!debug.contains("BEGIN KEY"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn load_yaml_file_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
sheet:
  spreadsheet_id: sheet-abc
  sheet_name: Staff
google:
  client_email: svc@example.com
  private_key: "line1\\nline2"
store:
  url: http://localhost:54321
  service_role_key: key
server:
  sync_interval_secs: 300
"#,
        )
        .unwrap();

        let config = StaffsyncConfig::load_at(&path).expect("load");
        assert_eq!(config.sheet.sheet_name, "Staff");
        assert_eq!(config.sheet.api_base, DEFAULT_SHEETS_API);
        assert_eq!(config.google.private_key, "line1\nline2");
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.server.sync_interval_secs, Some(300));
    }

    #[test]
    fn load_malformed_yaml_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "sheet: [unclosed").unwrap();
        let err = StaffsyncConfig::load_at(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn resolve_prefers_home_file_over_environment() {
        let home = TempDir::new().unwrap();
        let path = config_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "sheet: {spreadsheet_id: from-file}\n\
             google: {client_email: a@b.c, private_key: k}\n\
             store: {url: http://db, service_role_key: k}\n",
        )
        .unwrap();

        let env = full_env();
        let config =
            StaffsyncConfig::resolve_at(None, Some(home.path()), lookup(&env)).expect("resolve");
        assert_eq!(config.sheet.spreadsheet_id, "from-file");
    }

    #[test]
    fn resolve_falls_back_to_lookup_without_file() {
        let home = TempDir::new().unwrap();
        let env = full_env();
        let config =
            StaffsyncConfig::resolve_at(None, Some(home.path()), lookup(&env)).expect("resolve");
        assert_eq!(config.sheet.spreadsheet_id, "sheet-123");
    }
}
