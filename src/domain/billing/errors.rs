//! Billing account errors.
//!
//! Errors of the plan enrichment and account operations. These are distinct
//! from `WebhookError`: a failed provider query never affects event intake.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | UserNotFound | 404 |
//! | Conflict | 409 |
//! | ValidationFailed | 400 |
//! | ProviderQueryFailure | 502 |
//! | Directory | 503 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Billing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// No user record has this email.
    #[error("No user found for email: {0}")]
    UserNotFound(String),

    /// A user with this email or customer id already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input failed validation.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// A payment provider call failed.
    #[error("Payment provider query '{operation}' failed: {reason}")]
    ProviderQueryFailure { operation: String, reason: String },

    /// The user directory failed.
    #[error("User directory error: {0}")]
    Directory(String),
}

impl BillingError {
    pub fn user_not_found(email: impl Into<String>) -> Self {
        BillingError::UserNotFound(email.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        BillingError::Conflict(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn provider(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::ProviderQueryFailure {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn directory(message: impl Into<String>) -> Self {
        BillingError::Directory(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::UserNotFound(_) => ErrorCode::UserNotFound,
            BillingError::Conflict(_) => ErrorCode::Conflict,
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::ProviderQueryFailure { .. } => ErrorCode::ProviderError,
            BillingError::Directory(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::ProviderQueryFailure { .. } | BillingError::Directory(_)
        )
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Conflict => BillingError::Conflict(err.message),
            ErrorCode::ValidationFailed => BillingError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::UserNotFound => BillingError::UserNotFound(err.message),
            _ => BillingError::Directory(err.to_string()),
        }
    }
}
