//! Payment configuration (Stripe)

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::stripe::{StripeConfig, DEFAULT_API_BASE};

/// Payment configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key (`sk_test_...` / `sk_live_...`)
    pub stripe_api_key: String,

    /// Webhook signing secret. Unset means deliveries are accepted unsigned.
    #[serde(default)]
    pub stripe_webhook_secret: Option<String>,

    /// Override for the Stripe API origin (stripe-mock, recorded fixtures)
    #[serde(default)]
    pub stripe_api_base: Option<String>,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Client settings for the Stripe adapter.
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig::new(SecretString::new(self.stripe_api_key.clone()))
            .with_base_url(self.stripe_api_base.as_deref().unwrap_or(DEFAULT_API_BASE))
    }

    /// Webhook secret, when configured and non-empty.
    pub fn webhook_secret(&self) -> Option<SecretString> {
        self.stripe_webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::new(s.to_string()))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if let Some(secret) = self.stripe_webhook_secret.as_deref().filter(|s| !s.is_empty()) {
            if !secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        if let Some(base) = &self.stripe_api_base {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ValidationError::InvalidStripeApiBase);
            }
        }
        Ok(())
    }
}
