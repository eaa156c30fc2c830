//! Inbound billing event envelope.
//!
//! Parsing is deliberately lenient: every envelope field is optional so that
//! structurally valid JSON always produces a `BillingEvent`, and the reducer
//! decides what is malformed. Only payloads that are not JSON, or whose
//! fields have the wrong JSON type, fail here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::webhook_errors::WebhookError;

/// A billing event as delivered by the payment provider.
///
/// Wire shape: `{ "id", "type", "created", "data": { "object": {...} }, "livemode" }`.
/// Additional fields from Stripe's full event schema are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BillingEvent {
    /// Provider event identifier (evt_xxx). Only used for logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Event class tag, e.g. `customer.subscription.created`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Unix timestamp at which the provider created the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// Event-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BillingEventData>,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BillingEventData {
    /// The object that triggered the event; its shape depends on the event type.
    #[serde(default)]
    pub object: Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<Value>,
}

impl BillingEvent {
    /// Parses a raw request body.
    ///
    /// # Errors
    ///
    /// `WebhookError::MalformedEvent` if the body is not JSON or an envelope
    /// field has the wrong JSON type.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::malformed(e.to_string()))
    }

    /// Returns the event type tag if present and non-blank.
    pub fn type_tag(&self) -> Option<&str> {
        self.event_type
            .as_deref()
            .filter(|tag| !tag.trim().is_empty())
    }

    /// Classifies the event type.
    pub fn kind(&self) -> BillingEventKind {
        self.type_tag()
            .map(BillingEventKind::from_type)
            .unwrap_or(BillingEventKind::Unrecognized)
    }

    /// Returns `data.object` when it is a JSON object.
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref().and_then(|data| data.object.as_object())
    }
}

/// Event classes the reducer acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEventKind {
    /// Customer profile (name/email) changed.
    CustomerUpdated,
    /// Customer subscription was created.
    SubscriptionCreated,
    /// Customer subscription was updated.
    SubscriptionUpdated,
    /// Customer subscription was deleted.
    SubscriptionDeleted,
    /// Anything else; acknowledged and ignored.
    Unrecognized,
}

impl BillingEventKind {
    /// Parse event kind from the provider's type tag.
    pub fn from_type(tag: &str) -> Self {
        match tag {
            "customer.updated" => Self::CustomerUpdated,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unrecognized,
        }
    }

    /// Convert to the provider's type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerUpdated => "customer.updated",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Builder for creating test BillingEvent instances.
#[cfg(test)]
pub struct BillingEventBuilder {
    event: BillingEvent,
}

#[cfg(test)]
impl BillingEventBuilder {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event: BillingEvent {
                id: Some("evt_test_123".to_string()),
                event_type: Some(event_type.into()),
                created: None,
                data: Some(BillingEventData::default()),
                livemode: false,
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.event.id = Some(id.into());
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.event.created = Some(created);
        self
    }

    pub fn object(mut self, object: Value) -> Self {
        self.event.data = Some(BillingEventData {
            object,
            previous_attributes: None,
        });
        self
    }

    pub fn without_data(mut self) -> Self {
        self.event.data = None;
        self
    }

    pub fn build(self) -> BillingEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_stripe_envelope() {
        let body = br#"{
            "id": "evt_1",
            "object": "event",
            "type": "customer.subscription.updated",
            "created": 1704067200,
            "api_version": "2023-10-16",
            "data": {
                "object": {"id": "sub_1", "customer": "cus_1"},
                "previous_attributes": {"status": "trialing"}
            },
            "livemode": true,
            "pending_webhooks": 1
        }"#;

        let event = BillingEvent::parse(body).unwrap();

        assert_eq!(event.id.as_deref(), Some("evt_1"));
        assert_eq!(event.kind(), BillingEventKind::SubscriptionUpdated);
        assert_eq!(event.created, Some(1704067200));
        assert!(event.livemode);
        assert_eq!(event.payload().unwrap()["customer"], "cus_1");
    }

    #[test]
    fn empty_object_parses_without_type() {
        let event = BillingEvent::parse(b"{}").unwrap();
        assert!(event.type_tag().is_none());
        assert!(event.payload().is_none());
    }

    #[test]
    fn blank_type_is_treated_as_missing() {
        let event = BillingEvent::parse(br#"{"type": "   "}"#).unwrap();
        assert!(event.type_tag().is_none());
    }

    #[test]
    fn non_json_body_is_malformed() {
        let result = BillingEvent::parse(b"not json");
        assert!(matches!(result, Err(WebhookError::MalformedEvent(_))));
    }

    #[test]
    fn non_string_type_is_malformed() {
        let result = BillingEvent::parse(br#"{"type": 42}"#);
        assert!(matches!(result, Err(WebhookError::MalformedEvent(_))));
    }

    #[test]
    fn non_object_payload_is_not_exposed() {
        let event = BillingEventBuilder::new("customer.updated")
            .object(json!(["not", "an", "object"]))
            .build();
        assert!(event.payload().is_none());
    }

    #[test]
    fn kind_round_trips_through_tag() {
        for kind in [
            BillingEventKind::CustomerUpdated,
            BillingEventKind::SubscriptionCreated,
            BillingEventKind::SubscriptionUpdated,
            BillingEventKind::SubscriptionDeleted,
        ] {
            assert_eq!(BillingEventKind::from_type(kind.as_str()), kind);
        }
    }

    #[test]
    fn unknown_tags_are_unrecognized() {
        assert_eq!(
            BillingEventKind::from_type("invoice.paid"),
            BillingEventKind::Unrecognized
        );
        assert_eq!(
            BillingEventKind::from_type("customer.subscription.paused"),
            BillingEventKind::Unrecognized
        );
    }
}
