//! Ledger API configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults, suitable for containerized deployment.

use std::env;

use caisse_core::DEFAULT_VARIANCE_ALERT_PCT;

/// Ledger API configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// HTTP listen port.
    pub port: u16,

    /// SQLite database path or URL.
    pub database_url: String,

    /// Accepted opaque bearer tokens for the static dev token store.
    pub api_tokens: Vec<String>,

    /// Maximum tickets accepted in one sync batch.
    pub batch_size_limit: usize,

    /// Variance alert threshold in percent.
    pub variance_alert_pct: f64,
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = LedgerConfig {
            port: env::var("LEDGER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LEDGER_PORT".to_string()))?,

            database_url: env::var("LEDGER_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://ledger.db".to_string()),

            api_tokens: env::var("LEDGER_API_TOKENS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),

            batch_size_limit: env::var("LEDGER_BATCH_SIZE_LIMIT")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LEDGER_BATCH_SIZE_LIMIT".to_string()))?,

            variance_alert_pct: env::var("LEDGER_VARIANCE_ALERT_PCT")
                .unwrap_or_else(|_| DEFAULT_VARIANCE_ALERT_PCT.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LEDGER_VARIANCE_ALERT_PCT".to_string()))?,
        };

        Ok(config)
    }

    /// Defaults for tests: in-memory database, one accepted token.
    pub fn for_tests() -> Self {
        LedgerConfig {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            api_tokens: vec!["test-token".to_string()],
            batch_size_limit: 1000,
            variance_alert_pct: DEFAULT_VARIANCE_ALERT_PCT,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_alert_threshold() {
        let config = LedgerConfig::for_tests();
        assert_eq!(config.variance_alert_pct, 5.0);
        assert_eq!(config.batch_size_limit, 1000);
    }
}
