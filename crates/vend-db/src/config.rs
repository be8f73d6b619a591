//! # Configuration
//!
//! Settings are loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default      | Meaning                               |
//! |----------------------------|--------------|---------------------------------------|
//! | `VEND_DB_PATH`             | `./vend.db`  | SQLite database file                  |
//! | `VEND_DB_MAX_CONNECTIONS`  | `5`          | Pool size                             |
//! | `VEND_DB_BUSY_TIMEOUT_MS`  | `5000`       | Max wait for SQLite's write lock      |
//! | `VEND_SALE_TIMEOUT_MS`     | `5000`       | Bound on one `make_sale` attempt      |
//! | `VEND_CATALOG_PRECHECK`    | `true`       | Reject unknown/inactive products early |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::fulfillment::EngineConfig;
use crate::pool::DbConfig;

/// Everything a process needs to stand up the sale core.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db: DbConfig,
    pub engine: EngineConfig,
}

impl Settings {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Settings {
            db: DbConfig::from_env()?,
            engine: EngineConfig::from_env()?,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

/// Reads and parses `name`, falling back to `default` when unset.
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Like [`env_or`], for millisecond durations.
pub(crate) fn env_millis_or(name: &str, default: Duration) -> Result<Duration, ConfigError> {
    let millis = env_or(name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default_when_unset() {
        let value: u32 = env_or("VEND_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        env::set_var("VEND_TEST_GARBAGE_VALUE", "seven");
        let result: Result<u32, _> = env_or("VEND_TEST_GARBAGE_VALUE", 7);
        assert!(matches!(result, Err(ConfigError::InvalidValue(name)) if name == "VEND_TEST_GARBAGE_VALUE"));
    }

    #[test]
    fn test_env_millis() {
        env::set_var("VEND_TEST_MILLIS", "250");
        let value = env_millis_or("VEND_TEST_MILLIS", Duration::from_secs(1)).unwrap();
        assert_eq!(value, Duration::from_millis(250));
    }
}
