//! Directory mutations produced by the reducer.

use crate::domain::foundation::{CustomerId, SubscriptionId};

/// Independently ordered groups of user fields.
///
/// Each group carries its own last-applied sequence so a profile update does
/// not make a concurrent plan change look stale, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Plan,
    Profile,
}

/// New profile values from a `customer.updated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Display name; a null name from the provider clears it to "".
    pub name: String,
    /// Email; `None` leaves the stored email untouched.
    pub email: Option<String>,
}

/// The field-level change of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChanges {
    /// Put the user on this subscription.
    SetPlan(SubscriptionId),
    /// Cancel the named subscription. Without a name the plan is cleared
    /// whatever it is.
    ClearPlan(Option<SubscriptionId>),
    SetProfile(ProfileUpdate),
}

impl UserChanges {
    pub fn field_group(&self) -> FieldGroup {
        match self {
            UserChanges::SetPlan(_) | UserChanges::ClearPlan(_) => FieldGroup::Plan,
            UserChanges::SetProfile(_) => FieldGroup::Profile,
        }
    }

    /// Email the change would write, if any.
    pub fn new_email(&self) -> Option<&str> {
        match self {
            UserChanges::SetProfile(profile) => profile.email.as_deref(),
            _ => None,
        }
    }
}

/// A last-write-wins update to the user owning `customer_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub customer_id: CustomerId,
    pub changes: UserChanges,
    /// Ordering key: the provider's `created` timestamp, or receipt time.
    pub sequence: i64,
}

impl Mutation {
    pub fn field_group(&self) -> FieldGroup {
        self.changes.field_group()
    }
}

/// Result of reducing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    /// Apply this mutation to the directory.
    Apply(Mutation),
    /// Recognised as harmless; acknowledge without touching state.
    NoOp { event_type: String },
}

/// What the directory did with a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The user row was updated.
    Applied,
    /// A newer or equal sequence was already applied for this field group.
    Stale { last_applied: i64 },
    /// The cancelled subscription is no longer the user's plan. The sequence
    /// advanced; the plan was kept.
    Superseded,
    /// The new email already belongs to another user; nothing changed.
    EmailInUse,
    /// No user owns the customer id.
    Unmatched,
}

impl ApplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyOutcome::Applied => "applied",
            ApplyOutcome::Stale { .. } => "stale",
            ApplyOutcome::Superseded => "superseded",
            ApplyOutcome::EmailInUse => "email_in_use",
            ApplyOutcome::Unmatched => "unmatched",
        }
    }
}
