//! HTTP DTOs for billing endpoints.
//!
//! JSON request/response shapes at the boundary between HTTP and the
//! application layer.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a billing customer for the calling user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerRequest {
    /// Local user id, stored in the customer's metadata.
    pub user_id: String,
    /// Display name for the provider customer.
    #[serde(default)]
    pub name: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Plan name of the calling user; `null` when on no plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanNameResponse {
    pub plan_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub customer_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSecretResponse {
    /// Client secret for the embedded pricing table.
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalResponse {
    /// Billing portal URL. The client redirects.
    pub url: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
