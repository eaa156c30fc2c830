//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::billing::{
    CreateBillingCustomerCommand, CreateBillingCustomerHandler, CreateCheckoutSecretCommand,
    CreateCheckoutSecretHandler, CreatePortalLinkCommand, CreatePortalLinkHandler,
    GetPlanNameHandler, GetPlanNameQuery, HandleBillingEventCommand, HandleBillingEventHandler,
};
use crate::domain::billing::{BillingError, StripeWebhookVerifier};
use crate::domain::foundation::{EmailAddress, UserId};
use crate::ports::{PaymentProvider, UserDirectory};

use super::dto::{
    CheckoutSecretResponse, CreateCustomerRequest, CustomerResponse, ErrorResponse,
    PlanNameResponse, PortalResponse,
};

/// Header carrying the Stripe webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Header carrying the caller's email, set by the auth proxy in front of us.
pub const USER_EMAIL_HEADER: &str = "X-User-Email";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; handlers are built on demand from the
/// Arc-wrapped ports.
#[derive(Clone)]
pub struct BillingAppState {
    pub user_directory: Arc<dyn UserDirectory>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    /// Present when a webhook signing secret is configured.
    pub webhook_verifier: Option<StripeWebhookVerifier>,
    /// External base URL of the application (portal return target).
    pub public_url: String,
}

impl BillingAppState {
    pub fn billing_event_handler(&self) -> HandleBillingEventHandler {
        let handler = HandleBillingEventHandler::new(self.user_directory.clone());
        match &self.webhook_verifier {
            Some(verifier) => handler.with_verifier(verifier.clone()),
            None => handler,
        }
    }

    pub fn plan_name_handler(&self) -> GetPlanNameHandler {
        GetPlanNameHandler::new(self.user_directory.clone(), self.payment_provider.clone())
    }

    pub fn create_customer_handler(&self) -> CreateBillingCustomerHandler {
        CreateBillingCustomerHandler::new(
            self.user_directory.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn checkout_secret_handler(&self) -> CreateCheckoutSecretHandler {
        CreateCheckoutSecretHandler::new(
            self.user_directory.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn portal_link_handler(&self) -> CreatePortalLinkHandler {
        CreatePortalLinkHandler::new(
            self.user_directory.clone(),
            self.payment_provider.clone(),
            &self.public_url,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identity taken from the `X-User-Email` header.
///
/// Identity is verified upstream; this only requires the header to hold an
/// email address.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub email: EmailAddress,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| EmailAddress::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { email })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Intake
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe (and legacy aliases) - Handle Stripe events
///
/// Plain-text responses: `200 Success` for every accepted event, including
/// ignored, stale and unmatched ones; `400 Webhook error: ...` otherwise.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cmd = HandleBillingEventCommand {
        payload: body.to_vec(),
        signature: headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        received_at: chrono::Utc::now().timestamp(),
    };

    match state.billing_event_handler().handle(cmd).await {
        Ok(_) => (StatusCode::OK, "Success").into_response(),
        Err(e) => (e.status_code(), format!("Webhook error: {}", e)).into_response(),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/billing/plan - Product name of the caller's plan
pub async fn get_plan_name(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let plan_name = state
        .plan_name_handler()
        .handle(GetPlanNameQuery { email: user.email })
        .await?;

    Ok(Json(PlanNameResponse { plan_name }))
}

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "ok"
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/billing/customer - Create the caller's billing customer
pub async fn create_customer(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let user_id = UserId::new(request.user_id)
        .map_err(|e| BillingError::validation("user_id", e.to_string()))?;

    let result = state
        .create_customer_handler()
        .handle(CreateBillingCustomerCommand {
            user_id,
            email: user.email,
            name: request.name,
        })
        .await?;

    let response = CustomerResponse {
        customer_id: result.customer_id.to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/billing/checkout-session - Client secret for the pricing table
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .checkout_secret_handler()
        .handle(CreateCheckoutSecretCommand { email: user.email })
        .await?;

    Ok(Json(CheckoutSecretResponse {
        client_secret: result.client_secret,
    }))
}

/// POST /api/billing/portal - Billing portal URL for the caller
pub async fn create_portal_link(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .portal_link_handler()
        .handle(CreatePortalLinkCommand { email: user.email })
        .await?;

    Ok(Json(PortalResponse { url: result.url }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BillingError::UserNotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Conflict(_) => StatusCode::CONFLICT,
            BillingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            BillingError::ProviderQueryFailure { .. } => StatusCode::BAD_GATEWAY,
            BillingError::Directory(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Billing request failed");
        }

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: BillingError) -> StatusCode {
        BillingApiError::from(err).into_response().status()
    }

    #[test]
    fn billing_errors_map_to_http_status() {
        assert_eq!(status_of(BillingError::user_not_found("a@b.c")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(BillingError::conflict("dup")), StatusCode::CONFLICT);
        assert_eq!(
            status_of(BillingError::validation("user_id", "empty")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BillingError::provider("get_product", "timeout")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(BillingError::directory("pool closed")),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn unauthenticated_is_401() {
        assert_eq!(
            AuthenticationRequired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
