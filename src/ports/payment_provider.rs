//! Payment provider port for external billing queries.
//!
//! Defines the contract for the payment gateway (Stripe). The service only
//! reads subscription/product data and starts provider-hosted flows
//! (customer session, billing portal); it never moves money itself.
//!
//! # Design
//!
//! - **Injected**: handlers hold an `Arc<dyn PaymentProvider>`, so tests swap
//!   in the mock
//! - **Absent is not an error**: lookups return `Ok(None)` for unknown ids

use crate::domain::foundation::{CustomerId, SubscriptionId, UserId};
use async_trait::async_trait;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Get subscription by provider ID.
    async fn get_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Subscription>, PaymentError>;

    /// Get product by provider ID.
    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, PaymentError>;

    /// Create a customer in the payment system.
    ///
    /// The local user id is stored in the customer's metadata.
    async fn create_customer(&self, request: CreateCustomerRequest)
        -> Result<Customer, PaymentError>;

    /// Create a customer session with the pricing table enabled.
    ///
    /// Returns the client secret the frontend hands to the pricing table.
    async fn create_checkout_session_secret(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CustomerSession, PaymentError>;

    /// Create a billing portal session for subscription management.
    async fn create_billing_portal_url(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomerRequest {
    /// Internal user ID (stored as metadata).
    pub user_id: UserId,

    /// Customer email address.
    pub email: String,

    /// Customer name (optional).
    pub name: Option<String>,
}

/// Customer in the payment system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Provider's customer ID.
    pub id: CustomerId,

    /// Customer email.
    pub email: Option<String>,

    /// Customer name.
    pub name: Option<String>,
}

/// Subscription in the payment system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Provider's subscription ID.
    pub id: SubscriptionId,

    /// Provider's customer ID.
    pub customer_id: String,

    /// Raw provider status (`active`, `trialing`, `canceled`, ...).
    pub status: String,

    /// Product references of the subscription items, in item order.
    pub product_ids: Vec<String>,
}

impl Subscription {
    /// Product of the first subscription item.
    pub fn primary_product(&self) -> Option<&str> {
        self.product_ids.first().map(String::as_str)
    }
}

/// Product in the payment system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Provider's product ID.
    pub id: String,

    /// Human-readable product name.
    pub name: String,

    /// Whether the product is currently sold.
    pub active: bool,

    /// Optional marketing description.
    pub description: Option<String>,
}

/// Customer session used by the embedded pricing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSession {
    /// Secret handed to the frontend.
    pub client_secret: String,

    /// When the session expires (Unix timestamp).
    pub expires_at: i64,
}

/// Portal session for subscription management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSession {
    /// Provider's session ID.
    pub id: String,

    /// URL for customer to access portal.
    pub url: String,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Provider's own error code (`resource_missing`, `card_declined`, ...).
    pub provider_code: Option<String>,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidResponse, message)
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentErrorCode {
    /// Connection failure, timeout or provider 5xx.
    NetworkError,
    /// API key rejected.
    AuthenticationError,
    NotFound,
    RateLimitExceeded,
    /// Provider answered with something we could not interpret.
    InvalidResponse,
    /// Any other provider-reported failure.
    ProviderError,
}

impl PaymentErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidResponse => "invalid_response",
            PaymentErrorCode::ProviderError => "provider_error",
        }
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
