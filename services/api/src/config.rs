//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where records are persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageMode {
    /// PostgreSQL at the given connection string.
    Database(String),
    /// JSON files in a local data directory.
    Local(PathBuf),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageMode,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub description_model: String,
    pub cors_origin: HeaderValue,
    pub notification_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server ---
        let bind_address_str = var("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin_str = var("CORS_ORIGIN", "http://localhost:3000");
        let cors_origin = cors_origin_str.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
        })?;

        // --- Storage ---
        // No database means local mode.
        let storage = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => StorageMode::Database(url),
            None => StorageMode::Local(PathBuf::from(var("DATA_DIR", "./data"))),
        };

        // --- Description Generation ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        let description_model = var("DESCRIPTION_MODEL", "gpt-4o-mini");

        let capacity_str = var("NOTIFICATION_CAPACITY", "50");
        let notification_capacity = capacity_str
            .parse::<usize>()
            .ok()
            .filter(|capacity| *capacity > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "NOTIFICATION_CAPACITY".to_string(),
                    format!("'{}' is not a positive integer", capacity_str),
                )
            })?;

        Ok(Self {
            bind_address,
            storage,
            log_level,
            openai_api_key,
            description_model,
            cors_origin,
            notification_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_select_local_mode() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.storage, StorageMode::Local(PathBuf::from("./data")));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.description_model, "gpt-4o-mini");
        assert_eq!(config.notification_capacity, 50);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn database_url_selects_database_mode() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/deals")]).unwrap();
        assert_eq!(
            config.storage,
            StorageMode::Database("postgres://localhost/deals".to_string())
        );
    }

    #[test]
    fn invalid_values_are_reported_by_name() {
        for (key, value) in [
            ("BIND_ADDRESS", "nowhere"),
            ("RUST_LOG", "chatty"),
            ("NOTIFICATION_CAPACITY", "0"),
        ] {
            match load(&[(key, value)]) {
                Err(ConfigError::InvalidValue(name, _)) => assert_eq!(name, key),
                other => panic!("{key}={value} gave {other:?}"),
            }
        }
    }
}
