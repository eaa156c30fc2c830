//! User directory port.
//!
//! Keyed store of user records. Billing events reach a user only through the
//! provider customer id; account operations look users up by email.
//!
//! # Design
//!
//! - **Conditional writes**: `apply` is a single compare-and-set on the
//!   field group's event sequence, atomic per record
//! - **No deletes**: records are created by customer provisioning and live on

use crate::domain::billing::{ApplyOutcome, Mutation, UserRecord};
use crate::domain::foundation::{CustomerId, DomainError, EmailAddress};
use async_trait::async_trait;

/// Repository port for user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by email.
    ///
    /// Returns `None` if no user has this email.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<UserRecord>, DomainError>;

    /// Find a user by provider customer id.
    async fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<UserRecord>, DomainError>;

    /// Insert a new user record.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the customer id or email is already taken
    /// - `DatabaseError` on persistence failure
    async fn create(&self, user: &UserRecord) -> Result<(), DomainError>;

    /// Apply a reducer mutation under the sequence guard.
    ///
    /// Returns `Unmatched` when no user owns the customer id and `Stale` when
    /// an equal or newer sequence was already applied to the field group.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if the directory cannot be reached
    async fn apply(&self, mutation: &Mutation) -> Result<ApplyOutcome, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_directory_is_object_safe() {
        fn _accepts_dyn(_directory: &dyn UserDirectory) {}
    }
}
