//! Subscription state reducer.
//!
//! Pure function from one billing event to the single directory mutation it
//! implies, or a no-op. It performs no I/O; the caller applies the result.

use serde_json::{Map, Value};

use crate::domain::foundation::{CustomerId, SubscriptionId};

use super::event::{BillingEvent, BillingEventKind};
use super::mutation::{Mutation, ProfileUpdate, Reduction, UserChanges};
use super::webhook_errors::WebhookError;

/// Reduces `event` to a mutation.
///
/// `received_at` (unix seconds) is the sequence used when the envelope has no
/// `created` timestamp.
///
/// # Errors
///
/// `WebhookError::MalformedEvent` when the type is missing or blank, or when a
/// recognized event lacks its payload or customer reference.
pub fn reduce(event: &BillingEvent, received_at: i64) -> Result<Reduction, WebhookError> {
    let event_type = event
        .type_tag()
        .ok_or_else(|| WebhookError::malformed("missing event type"))?;

    let kind = BillingEventKind::from_type(event_type);
    if kind == BillingEventKind::Unrecognized {
        return Ok(Reduction::NoOp {
            event_type: event_type.to_string(),
        });
    }

    let object = event
        .payload()
        .ok_or_else(|| WebhookError::malformed(format!("{} has no data.object", event_type)))?;
    let sequence = event.created.unwrap_or(received_at);

    let (customer_id, changes) = match kind {
        BillingEventKind::CustomerUpdated => {
            let customer_id = customer_ref(object, "id")?;
            let profile = ProfileUpdate {
                name: optional_string(object, "name").unwrap_or_default(),
                email: optional_string(object, "email"),
            };
            (customer_id, UserChanges::SetProfile(profile))
        }
        BillingEventKind::SubscriptionCreated | BillingEventKind::SubscriptionUpdated => {
            let customer_id = customer_ref(object, "customer")?;
            let subscription_id = optional_string(object, "id")
                .and_then(|id| SubscriptionId::new(id).ok())
                .ok_or_else(|| WebhookError::malformed("subscription id missing"))?;
            (customer_id, UserChanges::SetPlan(subscription_id))
        }
        BillingEventKind::SubscriptionDeleted => {
            let customer_id = customer_ref(object, "customer")?;
            let cancelled =
                optional_string(object, "id").and_then(|id| SubscriptionId::new(id).ok());
            (customer_id, UserChanges::ClearPlan(cancelled))
        }
        BillingEventKind::Unrecognized => {
            return Ok(Reduction::NoOp {
                event_type: event_type.to_string(),
            })
        }
    };

    Ok(Reduction::Apply(Mutation {
        customer_id,
        changes,
        sequence,
    }))
}

/// Reads the customer reference at `field`.
///
/// Accepts the plain id string or an expanded object carrying `id`.
fn customer_ref(object: &Map<String, Value>, field: &str) -> Result<CustomerId, WebhookError> {
    let raw = match object.get(field) {
        Some(Value::String(id)) => Some(id.as_str()),
        Some(Value::Object(expanded)) => expanded.get("id").and_then(Value::as_str),
        _ => None,
    };

    raw.and_then(|id| CustomerId::new(id).ok())
        .ok_or_else(|| WebhookError::malformed(format!("customer reference '{}' missing", field)))
}

fn optional_string(object: &Map<String, Value>, field: &str) -> Option<String> {
    object.get(field).and_then(Value::as_str).map(str::to_string)
}
