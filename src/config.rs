//! Configuration management for the course progress service.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8002`.
//! - `COURSE_MANAGER_SERVICE_URL` - Optional. Base URL of the course catalog. Defaults to `http://127.0.0.1:8001`.
//! - `DATABASE_URL` - Optional. SQLite database path (or `:memory:`). Defaults to `course_progress.db`.
//! - `PROGRESS_STORE` - Optional. `sqlite` or `memory`. Defaults to `sqlite`.
//! - `CATALOG_TIMEOUT_SECS` - Optional. Timeout for catalog requests. Defaults to `10`.

use std::time::Duration;
use thiserror::Error;

use crate::store::ProgressStoreType;

pub const DEFAULT_CATALOG_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_DATABASE_URL: &str = "course_progress.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Course manager (catalog) base URL, without trailing slash
    pub catalog_url: String,

    /// Progress database location
    pub database_url: String,

    /// Which progress store backend to use
    pub store_type: ProgressStoreType,

    /// Timeout applied to every outbound catalog request
    pub catalog_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8002".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let catalog_url = std::env::var("COURSE_MANAGER_SERVICE_URL")
            .unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());
        let catalog_url = validate_base_url("COURSE_MANAGER_SERVICE_URL", &catalog_url)?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        if database_url.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let store_type = match std::env::var("PROGRESS_STORE") {
            Ok(value) => ProgressStoreType::parse(&value).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "PROGRESS_STORE".to_string(),
                    format!("unknown store type '{}' (expected sqlite or memory)", value),
                )
            })?,
            Err(_) => ProgressStoreType::default(),
        };

        let timeout_secs: u64 = std::env::var("CATALOG_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("CATALOG_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "CATALOG_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            catalog_url,
            database_url,
            store_type,
            catalog_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(catalog_url: impl Into<String>, database_url: impl Into<String>) -> Self {
        let mut catalog_url = catalog_url.into();
        while catalog_url.ends_with('/') {
            catalog_url.pop();
        }
        Self {
            host: "127.0.0.1".to_string(),
            port: 8002,
            catalog_url,
            database_url: database_url.into(),
            store_type: ProgressStoreType::default(),
            catalog_timeout: Duration::from_secs(10),
        }
    }
}

/// Check that `value` is an absolute http(s) URL and strip trailing slashes.
fn validate_base_url(name: &str, value: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_base_url_strips_trailing_slash() {
        let url = validate_base_url("X", "http://catalog:8001/").unwrap();
        assert_eq!(url, "http://catalog:8001");
    }

    #[test]
    fn validate_base_url_rejects_garbage() {
        assert!(validate_base_url("X", "not a url").is_err());
        assert!(validate_base_url("X", "ftp://catalog").is_err());
    }

    #[test]
    fn new_uses_sqlite_and_default_timeout() {
        let config = Config::new("http://localhost:8001//", ":memory:");
        assert_eq!(config.catalog_url, "http://localhost:8001");
        assert_eq!(config.store_type, ProgressStoreType::Sqlite);
        assert_eq!(config.catalog_timeout, Duration::from_secs(10));
    }
}
