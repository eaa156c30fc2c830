//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A loaded value that fails its semantic checks
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Port must be non-zero")]
    InvalidPort,

    #[error("Cannot bind to {0}")]
    InvalidSocketAddr(String),

    #[error("Request timeout of {0}s is outside 1..=300")]
    InvalidTimeout(u64),

    #[error("Public URL must be http(s): {0}")]
    InvalidPublicUrl(String),

    #[error("Database URL must use the postgres:// or postgresql:// scheme")]
    InvalidDatabaseUrl,

    #[error("Pool bounds invalid: min {min}, max {max}")]
    InvalidPoolSize { min: u32, max: u32 },

    #[error("Pool size {0} exceeds maximum allowed (100)")]
    PoolSizeTooLarge(u32),

    #[error("Stripe API key must be a secret key (sk_...)")]
    InvalidStripeKey,

    #[error("Stripe webhook secret must start with whsec_")]
    InvalidStripeWebhookSecret,

    #[error("Stripe API base must be an http(s) URL")]
    InvalidStripeApiBase,
}
