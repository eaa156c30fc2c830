//! Billing domain: subscription state reduction and plan bookkeeping.
//!
//! Inbound provider events are parsed into a [`BillingEvent`], reduced by
//! [`reduce`] into at most one [`Mutation`], and applied to a [`UserRecord`]
//! under a per-field-group sequence guard.

mod errors;
mod event;
mod mutation;
mod plan;
mod reducer;
mod user;
mod webhook_errors;
mod webhook_verifier;

pub use errors::BillingError;
pub use event::{BillingEvent, BillingEventData, BillingEventKind};
pub use mutation::{ApplyOutcome, FieldGroup, Mutation, ProfileUpdate, Reduction, UserChanges};
pub use plan::{Plan, NO_PLAN};
pub use reducer::reduce;
pub use user::UserRecord;
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};
