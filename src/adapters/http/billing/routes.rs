//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_checkout_session, create_customer, create_portal_link, get_plan_name,
    handle_stripe_webhook, health, BillingAppState,
};

/// Paths the webhook has been registered under over time. All reach the
/// same handler.
pub const WEBHOOK_PATHS: [&str; 4] = [
    "/api/webhooks/stripe",
    "/api/webhooks",
    "/api/webhook/stripe",
    "/webhook/stripe",
];

/// Create the billing API router.
///
/// # Routes (require `X-User-Email`)
/// - `GET /plan` - Plan name of the caller
/// - `POST /customer` - Create billing customer
/// - `POST /checkout-session` - Pricing-table client secret
/// - `POST /portal` - Billing portal URL
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/plan", get(get_plan_name))
        .route("/customer", post(create_customer))
        .route("/checkout-session", post(create_checkout_session))
        .route("/portal", post(create_portal_link))
}

/// Create the Stripe webhook router.
///
/// Separate from the billing routes because webhooks carry no user identity
/// (they are verified via signature).
pub fn webhook_routes() -> Router<BillingAppState> {
    WEBHOOK_PATHS
        .iter()
        .fold(Router::new(), |router, path| {
            router.route(path, post(handle_stripe_webhook))
        })
}

/// Create the complete application router.
///
/// # Example
///
/// ```ignore
/// let app = billing_router().with_state(state);
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/api/billing", billing_routes())
        .merge(webhook_routes())
        .route("/health", get(health))
}
