//! # Application Configuration
//!
//! Resolved once at startup and read-only afterwards.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`)
//! 2. Environment variables (`ORBIS_*`)
//! 3. Defaults (this file)
//!
//! Unlike a silently ignored typo, an environment value that doesn't parse
//! stops startup with a [`ConfigError`].

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Serialize;
use thiserror::Error;

use orbis_core::validation::{validate_currency, validate_tax_rate_bps};
use orbis_core::{TaxRate, DEFAULT_CURRENCY, DEFAULT_TAX_RATE_BPS};

pub const ENV_DB_PATH: &str = "ORBIS_DB_PATH";
pub const ENV_TAX_RATE_BPS: &str = "ORBIS_TAX_RATE_BPS";
pub const ENV_DEFAULT_CURRENCY: &str = "ORBIS_DEFAULT_CURRENCY";
pub const ENV_MAX_CONNECTIONS: &str = "ORBIS_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DATABASE_FILE: &str = "orbis.db";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Could not determine the application data directory")]
    NoDataDir,

    #[error("Could not create data directory {path}: {reason}")]
    DataDir { path: String, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Tax rate applied to order subtotals, in basis points.
    /// Default: 2100 (21%)
    pub tax_rate_bps: u32,

    /// Currency used when an order doesn't name one.
    /// Default: EUR
    pub default_currency: String,

    /// Maximum number of pooled connections.
    /// Default: 5
    pub max_connections: u32,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env(db_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve(db_override, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    ///
    /// ## Environment Variables
    /// - `ORBIS_DB_PATH`: database file (default: platform data dir)
    /// - `ORBIS_TAX_RATE_BPS`: tax rate, e.g. `2100` for 21%
    /// - `ORBIS_DEFAULT_CURRENCY`: e.g. `EUR`
    /// - `ORBIS_MAX_CONNECTIONS`: pool size, at least 1
    pub fn resolve<F>(db_override: Option<PathBuf>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tax_rate_bps = match lookup(ENV_TAX_RATE_BPS) {
            Some(raw) => {
                let bps = parse_number::<u32>(ENV_TAX_RATE_BPS, &raw)?;
                validate_tax_rate_bps(bps).map_err(|e| invalid(ENV_TAX_RATE_BPS, &raw, e))?;
                bps
            }
            None => DEFAULT_TAX_RATE_BPS,
        };

        let default_currency = match lookup(ENV_DEFAULT_CURRENCY) {
            Some(raw) => validate_currency(&raw).map_err(|e| invalid(ENV_DEFAULT_CURRENCY, &raw, e))?,
            None => DEFAULT_CURRENCY.to_string(),
        };

        let max_connections = match lookup(ENV_MAX_CONNECTIONS) {
            Some(raw) => match parse_number::<u32>(ENV_MAX_CONNECTIONS, &raw)? {
                0 => return Err(invalid(ENV_MAX_CONNECTIONS, &raw, "must be at least 1")),
                n => n,
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let database_path = match db_override.or_else(|| lookup(ENV_DB_PATH).map(PathBuf::from)) {
            Some(path) => path,
            None => default_database_path()?,
        };

        Ok(AppConfig {
            database_path,
            tax_rate_bps,
            default_currency,
            max_connections,
        })
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// Platform data directory path, created if missing.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.orbis.erp/orbis.db`
/// - **Windows**: `%APPDATA%\orbis\erp\data\orbis.db`
/// - **Linux**: `~/.local/share/erp/orbis.db`
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "orbis", "erp").ok_or(ConfigError::NoDataDir)?;
    let data_dir = dirs.data_dir();

    std::fs::create_dir_all(data_dir).map_err(|e| ConfigError::DataDir {
        path: data_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(data_dir.join(DATABASE_FILE))
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| invalid(key, raw, "not a whole number"))
}

fn invalid(key: &'static str, raw: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::resolve(Some(PathBuf::from("/tmp/orbis-test.db")), |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config.tax_rate_bps, 2100);
        assert_eq!(config.tax_rate().bps(), 2100);
        assert_eq!(config.default_currency, "EUR");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.database_path, PathBuf::from("/tmp/orbis-test.db"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = resolve(&[
            (ENV_TAX_RATE_BPS, "1000"),
            (ENV_DEFAULT_CURRENCY, "usd"),
            (ENV_MAX_CONNECTIONS, " 8 "),
        ])
        .unwrap();
        assert_eq!(config.tax_rate_bps, 1000);
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.max_connections, 8);
    }

    #[test]
    fn test_flag_beats_environment_path() {
        let config = AppConfig::resolve(Some(PathBuf::from("flag.db")), |key| {
            (key == ENV_DB_PATH).then(|| "env.db".to_string())
        })
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("flag.db"));

        let config = AppConfig::resolve(None, |key| {
            (key == ENV_DB_PATH).then(|| "env.db".to_string())
        })
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("env.db"));
    }

    #[test]
    fn test_invalid_values_fail() {
        for (key, value) in [
            (ENV_TAX_RATE_BPS, "21%"),
            (ENV_TAX_RATE_BPS, "10001"),
            (ENV_DEFAULT_CURRENCY, "EURODOLLAR"),
            (ENV_MAX_CONNECTIONS, "0"),
            (ENV_MAX_CONNECTIONS, "-1"),
        ] {
            let err = resolve(&[(key, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }
}
