//! Shared domain primitives: identifiers and error types.

mod errors;
mod ids;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CustomerId, EmailAddress, SubscriptionId, UserId};
