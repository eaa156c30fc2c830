//! Webhook error types for billing event intake.
//!
//! Every failure is reported to the provider as HTTP 400 with the message in
//! the body. Stripe treats any non-2xx as a delivery failure and redelivers,
//! so directory outages are still retried.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur while turning a delivery into a directory mutation.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The body is not a usable event: bad JSON, missing or blank type,
    /// missing payload, or a missing customer reference.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// A signing secret is configured but the delivery carried no signature.
    #[error("Missing signature")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature timestamp is outside the acceptable window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// The write collides with another record. Redelivery cannot fix it.
    #[error("Directory conflict: {0}")]
    Conflict(String),

    /// The user directory could not be reached or failed the write.
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl WebhookError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        WebhookError::MalformedEvent(reason.into())
    }

    /// Returns true if redelivering the same event could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::DirectoryUnavailable(_))
    }

    /// Maps the error to the status returned to the provider.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MalformedEvent(_)
            | WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::Conflict(_)
            | WebhookError::DirectoryUnavailable(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Conflict => WebhookError::Conflict(err.to_string()),
            _ => WebhookError::DirectoryUnavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Error Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn malformed_event_displays_reason() {
        let err = WebhookError::malformed("missing event type");
        assert_eq!(format!("{}", err), "Malformed event: missing event type");
    }

    #[test]
    fn invalid_signature_displays_correctly() {
        assert_eq!(format!("{}", WebhookError::InvalidSignature), "Invalid signature");
    }

    #[test]
    fn directory_error_converts_with_code() {
        let err: WebhookError = DomainError::database("pool timed out").into();
        assert_eq!(
            format!("{}", err),
            "Directory unavailable: [DATABASE_ERROR] pool timed out"
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Retryability Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn directory_unavailable_is_retryable() {
        let err: WebhookError = DomainError::new(ErrorCode::InternalError, "boom").into();
        assert!(err.is_retryable());
    }

    #[test]
    fn directory_conflict_is_not_retryable() {
        let err: WebhookError = DomainError::conflict("duplicate user").into();
        assert!(matches!(err, WebhookError::Conflict(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn malformed_event_is_not_retryable() {
        assert!(!WebhookError::malformed("bad json").is_retryable());
    }

    #[test]
    fn signature_failures_are_not_retryable() {
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert!(!WebhookError::MissingSignature.is_retryable());
        assert!(!WebhookError::TimestampOutOfRange.is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn all_failures_return_bad_request() {
        let errors = [
            WebhookError::malformed("x"),
            WebhookError::MissingSignature,
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::Conflict("dup".to_string()),
            WebhookError::DirectoryUnavailable("down".to_string()),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{}", err);
        }
    }
}
