//! User record as kept by the directory.

use crate::domain::foundation::{CustomerId, UserId};

use super::mutation::{ApplyOutcome, FieldGroup, Mutation, UserChanges};
use super::plan::Plan;

/// A user with their billing linkage.
///
/// The customer id is assigned once at creation and never changes; every
/// billing event reaches the user through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub customer_id: CustomerId,
    pub email: String,
    pub name: String,
    pub plan: Plan,
    pub plan_event_seq: Option<i64>,
    pub profile_event_seq: Option<i64>,
}

impl UserRecord {
    /// A freshly linked user: no plan, nothing applied yet.
    pub fn new(
        user_id: UserId,
        customer_id: CustomerId,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            customer_id,
            email: email.into(),
            name: name.into(),
            plan: Plan::NoPlan,
            plan_event_seq: None,
            profile_event_seq: None,
        }
    }

    pub fn last_applied(&self, group: FieldGroup) -> Option<i64> {
        match group {
            FieldGroup::Plan => self.plan_event_seq,
            FieldGroup::Profile => self.profile_event_seq,
        }
    }

    /// Why `mutation` must not be applied, if it must not.
    ///
    /// A mutation is stale when its sequence is older than the last one
    /// applied to the same field group. Provider timestamps have one-second
    /// resolution, so on an equal sequence only a plan activation that changes
    /// the plan goes through; a cancellation or profile update does not.
    pub fn rejection(&self, mutation: &Mutation) -> Option<ApplyOutcome> {
        let last_applied = self.last_applied(mutation.field_group())?;

        let admitted = match &mutation.changes {
            UserChanges::SetPlan(id) => {
                mutation.sequence > last_applied
                    || (mutation.sequence == last_applied
                        && self.plan.subscription_id() != Some(id))
            }
            UserChanges::ClearPlan(_) | UserChanges::SetProfile(_) => {
                mutation.sequence > last_applied
            }
        };

        (!admitted).then_some(ApplyOutcome::Stale { last_applied })
    }

    /// Applies `mutation` unless [`rejection`](Self::rejection) refuses it.
    ///
    /// Cancelling a subscription other than the current one advances the
    /// sequence but keeps the plan. The caller is responsible for matching
    /// `customer_id`.
    pub fn apply(&mut self, mutation: &Mutation) -> ApplyOutcome {
        if let Some(outcome) = self.rejection(mutation) {
            return outcome;
        }

        match &mutation.changes {
            UserChanges::SetPlan(id) => {
                self.plan = Plan::Subscribed(id.clone());
                self.plan_event_seq = Some(mutation.sequence);
            }
            UserChanges::ClearPlan(cancelled) => {
                self.plan_event_seq = Some(mutation.sequence);
                let superseded = match (&self.plan, cancelled) {
                    (Plan::Subscribed(current), Some(cancelled)) => current != cancelled,
                    _ => false,
                };
                if superseded {
                    return ApplyOutcome::Superseded;
                }
                self.plan = Plan::NoPlan;
            }
            UserChanges::SetProfile(profile) => {
                self.name = profile.name.clone();
                if let Some(email) = &profile.email {
                    self.email = email.clone();
                }
                self.profile_event_seq = Some(mutation.sequence);
            }
        }
        ApplyOutcome::Applied
    }
}
