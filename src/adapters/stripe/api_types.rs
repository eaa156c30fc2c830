//! Stripe REST API response types.
//!
//! Only the fields this service reads are modelled; everything else in the
//! Stripe objects is ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stripe Customer object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomer {
    /// Customer ID (cus_...).
    pub id: String,

    /// Customer email.
    pub email: Option<String>,

    /// Customer name.
    pub name: Option<String>,

    /// Custom metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Subscription ID (sub_...).
    pub id: String,

    /// Customer ID.
    pub customer: String,

    /// Subscription status.
    pub status: String,

    /// Subscription items.
    #[serde(default)]
    pub items: StripeList<StripeSubscriptionItem>,
}

/// A Stripe list envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Default for StripeList<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

/// Subscription item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    /// Item ID (si_...).
    pub id: String,

    /// Price for this item.
    pub price: Option<StripePriceRef>,

    /// Legacy plan object; older API versions only carry the product here.
    pub plan: Option<StripePriceRef>,
}

impl StripeSubscriptionItem {
    /// Product referenced by the item's price, falling back to its plan.
    pub fn product_id(&self) -> Option<&str> {
        self.price
            .as_ref()
            .and_then(|p| p.product.as_deref())
            .or_else(|| self.plan.as_ref().and_then(|p| p.product.as_deref()))
    }
}

/// The part of a Price/Plan object we need.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePriceRef {
    pub id: Option<String>,
    pub product: Option<String>,
}

/// Stripe Product object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    pub description: Option<String>,
}

/// Stripe CustomerSession object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomerSession {
    pub client_secret: String,
    pub expires_at: i64,
}

/// Stripe billing portal Session object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePortalSession {
    pub id: String,
    pub url: String,
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}
