//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Stripe REST API using
//! form-encoded requests and HTTP basic auth with the secret key.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_base_url("http://localhost:12111");
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::foundation::{CustomerId, SubscriptionId};
use crate::ports::{
    CreateCustomerRequest, Customer, CustomerSession, PaymentError, PaymentErrorCode,
    PaymentProvider, PortalSession, Product, Subscription,
};

use super::api_types::{
    StripeCustomer, StripeCustomerSession, StripeErrorResponse, StripePortalSession,
    StripeProduct, StripeSubscription,
};

/// Default Stripe API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Set a custom API base URL (stripe-mock, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    /// GET a Stripe object; 404 maps to `Ok(None)`.
    async fn get_object<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> Result<Option<T>, PaymentError> {
        let response = self
            .http_client
            .get(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        read_json(operation, response).await.map(Some)
    }

    /// POST a form and parse the created object.
    async fn post_form<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, PaymentError> {
        let response = self
            .http_client
            .post(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        read_json(operation, response).await
    }
}

async fn read_json<T: DeserializeOwned>(
    operation: &str,
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(operation, status = status.as_u16(), "Stripe API call failed");
        return Err(error_from_response(status, &body));
    }

    response.json().await.map_err(|e| {
        PaymentError::invalid_response(format!("Failed to parse Stripe response: {}", e))
    })
}

/// Maps a non-2xx Stripe response to a `PaymentError`.
fn error_from_response(status: StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error ({})", status.as_u16()));

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PaymentErrorCode::AuthenticationError,
        StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        s if s.is_server_error() => PaymentErrorCode::NetworkError,
        _ => PaymentErrorCode::ProviderError,
    };

    let error = PaymentError::new(code, message);
    match parsed.and_then(|e| e.error.code.or(e.error.error_type)) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

fn to_subscription(stripe_sub: StripeSubscription) -> Result<Subscription, PaymentError> {
    let product_ids = stripe_sub
        .items
        .data
        .iter()
        .filter_map(|item| item.product_id().map(str::to_string))
        .collect();

    Ok(Subscription {
        id: SubscriptionId::new(stripe_sub.id)
            .map_err(|e| PaymentError::invalid_response(e.to_string()))?,
        customer_id: stripe_sub.customer,
        status: stripe_sub.status,
        product_ids,
    })
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn get_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Subscription>, PaymentError> {
        let path = format!("subscriptions/{}", subscription_id);
        self.get_object::<StripeSubscription>("get_subscription", &path)
            .await?
            .map(to_subscription)
            .transpose()
    }

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, PaymentError> {
        let path = format!("products/{}", product_id);
        let product = self
            .get_object::<StripeProduct>("get_product", &path)
            .await?;

        Ok(product.map(|p| Product {
            id: p.id,
            name: p.name,
            active: p.active,
            description: p.description,
        }))
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let params = [
            ("email", request.email.clone()),
            ("name", request.name.clone().unwrap_or_default()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let stripe_customer: StripeCustomer = self
            .post_form("create_customer", "customers", &params)
            .await?;

        Ok(Customer {
            id: CustomerId::new(stripe_customer.id)
                .map_err(|e| PaymentError::invalid_response(e.to_string()))?,
            email: stripe_customer.email.or(Some(request.email)),
            name: stripe_customer.name.or(request.name),
        })
    }

    async fn create_checkout_session_secret(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CustomerSession, PaymentError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("components[pricing_table][enabled]", "true".to_string()),
        ];

        let session: StripeCustomerSession = self
            .post_form("create_customer_session", "customer_sessions", &params)
            .await?;

        Ok(CustomerSession {
            client_secret: session.client_secret,
            expires_at: session.expires_at,
        })
    }

    async fn create_billing_portal_url(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];

        let portal: StripePortalSession = self
            .post_form("create_portal_session", "billing_portal/sessions", &params)
            .await?;

        Ok(PortalSession {
            id: portal.id,
            url: portal.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::api_types::{StripeList, StripePriceRef, StripeSubscriptionItem};

    fn config() -> StripeConfig {
        StripeConfig::new(SecretString::new("sk_test_123".to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // Configuration Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn config_defaults_to_stripe_api() {
        assert_eq!(config().api_base_url(), "https://api.stripe.com");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let adapter = StripePaymentAdapter::new(config().with_base_url("http://localhost:12111/"));
        assert_eq!(
            adapter.url("products/prod_1"),
            "http://localhost:12111/v1/products/prod_1"
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn stripe_error_body_is_used() {
        let body = r#"{"error": {"type": "invalid_request_error", "code": "resource_missing", "message": "No such customer: 'cus_x'"}}"#;

        let err = error_from_response(StatusCode::BAD_REQUEST, body);

        assert_eq!(err.code, PaymentErrorCode::ProviderError);
        assert_eq!(err.message, "No such customer: 'cus_x'");
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
    }

    #[test]
    fn unauthorized_maps_to_authentication_error() {
        let err = error_from_response(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.code, PaymentErrorCode::AuthenticationError);
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        assert!(error_from_response(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(error_from_response(StatusCode::BAD_GATEWAY, "<html>").is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Conversion Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn subscription_conversion_keeps_item_order() {
        let item = |product: &str| StripeSubscriptionItem {
            id: format!("si_{}", product),
            price: Some(StripePriceRef {
                id: None,
                product: Some(product.to_string()),
            }),
            plan: None,
        };
        let stripe_sub = StripeSubscription {
            id: "sub_1".to_string(),
            customer: "cus_1".to_string(),
            status: "active".to_string(),
            items: StripeList {
                data: vec![item("prod_a"), item("prod_b")],
            },
        };

        let sub = to_subscription(stripe_sub).unwrap();

        assert_eq!(sub.product_ids, vec!["prod_a", "prod_b"]);
        assert_eq!(sub.primary_product(), Some("prod_a"));
    }

    #[test]
    fn subscription_with_blank_id_is_invalid_response() {
        let stripe_sub = StripeSubscription {
            id: String::new(),
            customer: "cus_1".to_string(),
            status: "active".to_string(),
            items: StripeList::default(),
        };

        let err = to_subscription(stripe_sub).unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::InvalidResponse);
    }
}
