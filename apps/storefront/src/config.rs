//! Storefront configuration.
//!
//! Loaded from built-in defaults, an optional `bulkbuy.toml`, and
//! `BULKBUY_`-prefixed environment variables (highest precedence).
//!
//! ```toml
//! database_path = "/var/lib/bulkbuy/bulkbuy.db"
//! max_connections = 8
//! currency = "usd"
//! log_filter = "info,bulkbuy=debug,sqlx=warn"
//! payment_provider = "simulated"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bulkbuy.toml";

/// Environment variable prefix (`BULKBUY_DATABASE_PATH`, ...).
pub const ENV_PREFIX: &str = "BULKBUY";

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// ISO 4217 currency for payment intents
    pub currency: String,

    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Payment gateway implementation
    pub payment_provider: PaymentProvider,
}

/// Available payment gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Simulated,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        StorefrontConfig {
            database_path: "bulkbuy.db".to_string(),
            max_connections: 5,
            currency: "usd".to_string(),
            log_filter: "info,bulkbuy=debug,sqlx=warn".to_string(),
            payment_provider: PaymentProvider::Simulated,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from `file` (if present; the CLI defaults it to
    /// [`DEFAULT_CONFIG_FILE`]) and the environment.
    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let mut loaded: StorefrontConfig = settings.try_deserialize()?;
        loaded.currency = loaded.currency.to_ascii_lowercase();
        loaded.validate()?;

        Ok(loaded)
    }

    /// Checks values the type system doesn't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidValue {
                key: "currency".to_string(),
                reason: format!("'{}' is not a three-letter ISO 4217 code", self.currency),
            });
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
