//! In-Memory User Directory Adapter
//!
//! Stores user records in memory, keyed by customer id.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::{ApplyOutcome, Mutation, UserRecord};
use crate::domain::foundation::{CustomerId, DomainError, EmailAddress};
use crate::ports::UserDirectory;

/// In-memory user directory.
///
/// `apply` holds the write lock for the whole compare-and-set, which gives
/// the same per-record atomicity as the conditional SQL update.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<CustomerId, UserRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let map = users
            .into_iter()
            .map(|user| (user.customer_id.clone(), user))
            .collect();
        Self {
            users: Arc::new(RwLock::new(map)),
            unavailable: Arc::default(),
        }
    }

    /// Make every call fail as if the store were down (useful for tests).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of a stored record.
    pub async fn get(&self, customer_id: &CustomerId) -> Option<UserRecord> {
        self.users.read().await.get(customer_id).cloned()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("user directory unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<UserRecord>, DomainError> {
        self.check_available()?;
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.email == email.as_str())
            .cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<UserRecord>, DomainError> {
        self.check_available()?;
        Ok(self.users.read().await.get(customer_id).cloned())
    }

    async fn create(&self, user: &UserRecord) -> Result<(), DomainError> {
        self.check_available()?;
        let mut users = self.users.write().await;

        if users.contains_key(&user.customer_id) {
            return Err(DomainError::conflict("duplicate user")
                .with_detail("constraint", "users_stripe_id_key"));
        }
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DomainError::conflict("duplicate user")
                .with_detail("constraint", "users_email_key"));
        }

        users.insert(user.customer_id.clone(), user.clone());
        Ok(())
    }

    async fn apply(&self, mutation: &Mutation) -> Result<ApplyOutcome, DomainError> {
        self.check_available()?;
        let mut users = self.users.write().await;

        let Some(user) = users.get(&mutation.customer_id) else {
            return Ok(ApplyOutcome::Unmatched);
        };
        if let Some(outcome) = user.rejection(mutation) {
            return Ok(outcome);
        }

        // Emails are unique, as under the users_email_key constraint.
        if let Some(email) = mutation.changes.new_email() {
            let taken = users
                .values()
                .any(|other| other.customer_id != mutation.customer_id && other.email == email);
            if taken {
                return Ok(ApplyOutcome::EmailInUse);
            }
        }

        match users.get_mut(&mutation.customer_id) {
            Some(user) => Ok(user.apply(mutation)),
            None => Ok(ApplyOutcome::Unmatched),
        }
    }
}
