//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `PLAN_SYNC` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use plan_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, logging, public URL)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL user directory)
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `PLAN_SYNC__*` variables:
    ///
    /// - `PLAN_SYNC__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PLAN_SYNC__DATABASE__URL=...` -> `database.url = ...`
    /// - `PLAN_SYNC__PAYMENT__STRIPE_API_KEY=...` -> `payment.stripe_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("PLAN_SYNC")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("PLAN_SYNC__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("PLAN_SYNC__PAYMENT__STRIPE_API_KEY", "sk_test_xxx");
    }

    fn clear_env() {
        for key in [
            "PLAN_SYNC__DATABASE__URL",
            "PLAN_SYNC__PAYMENT__STRIPE_API_KEY",
            "PLAN_SYNC__PAYMENT__STRIPE_WEBHOOK_SECRET",
            "PLAN_SYNC__SERVER__PORT",
            "PLAN_SYNC__SERVER__LOG_FORMAT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.payment.stripe_api_key, "sk_test_xxx");
        assert!(config.payment.stripe_webhook_secret.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PLAN_SYNC__SERVER__PORT", "9090");
        env::set_var("PLAN_SYNC__SERVER__LOG_FORMAT", "json");
        env::set_var("PLAN_SYNC__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_abc");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert!(config.payment.webhook_secret().is_some());
    }

    #[test]
    fn test_missing_database_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("PLAN_SYNC__PAYMENT__STRIPE_API_KEY", "sk_test_xxx");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
