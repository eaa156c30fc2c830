//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe, covering:
//! - Subscription and product lookups for plan enrichment
//! - Customer creation
//! - Customer sessions (pricing table) and billing portal sessions
//!
//! Webhook signature verification lives in the billing domain; this adapter
//! only talks to the REST API.

mod api_types;
mod mock_payment_provider;
mod stripe_adapter;

pub use api_types::{StripeCustomer, StripeProduct, StripeSubscription};
pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter, DEFAULT_API_BASE};
