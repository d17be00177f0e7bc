//! `omatch` configuration file.
//!
//! TOML, looked up as `./ordermatch.toml` then the per-user config directory.
//! Relative paths inside the file resolve against the file's own directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exit_codes::EXIT_USAGE;
use crate::CliError;

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    /// Ledger snapshot file (xlsx, xls, or csv).
    pub file: Option<PathBuf>,

    /// Freshness window for the ledger cache, in seconds.
    #[serde(default = "default_refresh_seconds")]
    pub refresh_seconds: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            file: None,
            refresh_seconds: default_refresh_seconds(),
        }
    }
}

fn default_refresh_seconds() -> u64 {
    300
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Absent means no persistence: reads are empty and
    /// writes are rejected.
    pub database: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_toml(s: &str) -> Result<Self, CliError> {
        toml::from_str(s).map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("invalid config: {e}"),
            hint: None,
        })
    }

    /// Load from `explicit` if given (must exist), else the first of
    /// `./ordermatch.toml` and `<config-dir>/ordermatch/config.toml` that
    /// exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let path = match explicit {
            Some(p) => {
                if !p.exists() {
                    return Err(CliError {
                        code: EXIT_USAGE,
                        message: format!("config file not found: {}", p.display()),
                        hint: None,
                    });
                }
                Some(p.to_path_buf())
            }
            None => default_config_paths().into_iter().find(|p| p.exists()),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("cannot read {}: {e}", path.display()),
            hint: None,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Resolve relative paths against the config file's directory.
    fn resolve_paths(&mut self, base: &Path) {
        if let Some(file) = &self.ledger.file {
            if file.is_relative() {
                self.ledger.file = Some(base.join(file));
            }
        }
        if let Some(db) = &self.store.database {
            if db.is_relative() {
                self.store.database = Some(base.join(db));
            }
        }
    }
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("ordermatch.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("ordermatch").join("config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_sections_absent() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.ledger.refresh_seconds, 300);
        assert!(config.ledger.file.is_none());
        assert!(config.store.database.is_none());
    }

    #[test]
    fn parses_full_config() {
        let config = AppConfig::from_toml(
            r#"
[ledger]
file = "orders.xlsx"
refresh_seconds = 60

[store]
database = "orders.db"
"#,
        )
        .unwrap();
        assert_eq!(config.ledger.file.as_deref(), Some(Path::new("orders.xlsx")));
        assert_eq!(config.ledger.refresh_seconds, 60);
        assert_eq!(config.store.database.as_deref(), Some(Path::new("orders.db")));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let mut config = AppConfig::from_toml("[ledger]\nfile = \"orders.csv\"\n").unwrap();
        config.resolve_paths(Path::new("/etc/ordermatch"));
        assert_eq!(
            config.ledger.file.as_deref(),
            Some(Path::new("/etc/ordermatch/orders.csv"))
        );
    }

    #[test]
    fn malformed_toml_is_a_usage_error() {
        let err = AppConfig::from_toml("[ledger\nfile=1").unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }
}
