//! HTTP adapter for billing endpoints.
//!
//! - `POST /api/webhooks/stripe` - Stripe webhook intake (plus legacy aliases)
//! - `GET /api/billing/plan` - Plan name of the caller
//! - `POST /api/billing/customer` - Create billing customer
//! - `POST /api/billing/checkout-session` - Pricing-table client secret
//! - `POST /api/billing/portal` - Billing portal URL
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AuthenticatedUser, BillingApiError, BillingAppState};
pub use routes::{billing_router, billing_routes, webhook_routes, WEBHOOK_PATHS};
