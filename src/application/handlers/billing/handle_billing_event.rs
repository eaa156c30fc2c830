//! HandleBillingEventHandler - Command handler for inbound billing webhooks.
//!
//! Verifies the delivery (when a signing secret is configured), parses it,
//! reduces it to at most one mutation and applies that to the user directory.
//! This is the only place event intake is logged.

use std::fmt;
use std::sync::Arc;

use crate::domain::billing::{
    reduce, ApplyOutcome, BillingEvent, Reduction, StripeWebhookVerifier, WebhookError,
};
use crate::ports::UserDirectory;

/// Command carrying one raw delivery.
#[derive(Debug, Clone)]
pub struct HandleBillingEventCommand {
    /// Raw request body, exactly as received (signatures cover these bytes).
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if present.
    pub signature: Option<String>,
    /// Receipt time (unix seconds); the sequence for events without `created`.
    pub received_at: i64,
}

/// What happened to an accepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEventOutcome {
    /// The user record was updated.
    Applied,
    /// A newer event was already applied; nothing changed.
    Stale,
    /// The cancelled subscription had already been replaced; the plan was kept.
    Superseded,
    /// The change collides with another user (their email); nothing changed.
    Rejected,
    /// No user owns the referenced customer.
    Unmatched,
    /// Event type is not one we act on.
    Ignored,
}

impl BillingEventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingEventOutcome::Applied => "applied",
            BillingEventOutcome::Stale => "stale",
            BillingEventOutcome::Superseded => "superseded",
            BillingEventOutcome::Rejected => "rejected",
            BillingEventOutcome::Unmatched => "unmatched",
            BillingEventOutcome::Ignored => "ignored",
        }
    }
}

impl fmt::Display for BillingEventOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ApplyOutcome> for BillingEventOutcome {
    fn from(outcome: ApplyOutcome) -> Self {
        match outcome {
            ApplyOutcome::Applied => BillingEventOutcome::Applied,
            ApplyOutcome::Stale { .. } => BillingEventOutcome::Stale,
            ApplyOutcome::Superseded => BillingEventOutcome::Superseded,
            ApplyOutcome::EmailInUse => BillingEventOutcome::Rejected,
            ApplyOutcome::Unmatched => BillingEventOutcome::Unmatched,
        }
    }
}

/// Result of a successfully acknowledged event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleBillingEventResult {
    pub event_id: Option<String>,
    pub event_type: String,
    pub outcome: BillingEventOutcome,
}

/// Handler for inbound billing events.
pub struct HandleBillingEventHandler {
    directory: Arc<dyn UserDirectory>,
    verifier: Option<StripeWebhookVerifier>,
}

impl HandleBillingEventHandler {
    /// Accepts unsigned deliveries. Use `with_verifier` in production.
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            verifier: None,
        }
    }

    /// Require a valid `Stripe-Signature` on every delivery.
    pub fn with_verifier(mut self, verifier: StripeWebhookVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub async fn handle(
        &self,
        cmd: HandleBillingEventCommand,
    ) -> Result<HandleBillingEventResult, WebhookError> {
        if let Some(verifier) = &self.verifier {
            let signature = cmd
                .signature
                .as_deref()
                .ok_or(WebhookError::MissingSignature)?;
            if let Err(e) = verifier.verify(&cmd.payload, signature) {
                tracing::warn!(error = %e, "Rejected billing event delivery");
                return Err(e);
            }
        }

        let event = BillingEvent::parse(&cmd.payload).map_err(|e| {
            tracing::warn!(error = %e, "Unparseable billing event");
            e
        })?;

        tracing::info!(
            event_id = event.id.as_deref().unwrap_or("-"),
            event_type = event.type_tag().unwrap_or("-"),
            livemode = event.livemode,
            "Billing event received"
        );

        let reduction = reduce(&event, cmd.received_at).map_err(|e| {
            tracing::warn!(
                event_id = event.id.as_deref().unwrap_or("-"),
                error = %e,
                "Malformed billing event"
            );
            e
        })?;

        let (event_type, outcome) = match reduction {
            Reduction::NoOp { event_type } => (event_type, BillingEventOutcome::Ignored),
            Reduction::Apply(mutation) => {
                let event_type = event.type_tag().unwrap_or_default().to_string();
                let applied = self.directory.apply(&mutation).await.map_err(|e| {
                    tracing::error!(
                        event_id = event.id.as_deref().unwrap_or("-"),
                        customer_id = %mutation.customer_id,
                        error = %e,
                        "User directory write failed"
                    );
                    WebhookError::from(e)
                })?;
                (event_type, BillingEventOutcome::from(applied))
            }
        };

        tracing::info!(
            event_id = event.id.as_deref().unwrap_or("-"),
            event_type = %event_type,
            outcome = %outcome,
            "Billing event processed"
        );

        Ok(HandleBillingEventResult {
            event_id: event.id,
            event_type,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryUserDirectory;
    use crate::domain::billing::{Plan, UserRecord};
    use crate::domain::foundation::{CustomerId, UserId};
    use secrecy::SecretString;
    use serde_json::json;

    const NOW: i64 = 1_704_067_200;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn directory_with_subscriber() -> InMemoryUserDirectory {
        let mut user = UserRecord::new(
            UserId::new("user-1").unwrap(),
            CustomerId::new("cus_123").unwrap(),
            "ada@example.com",
            "Ada",
        );
        user.plan = Plan::from_stored(Some("sub_abc"));
        InMemoryUserDirectory::with_users([user])
    }

    fn command(body: serde_json::Value) -> HandleBillingEventCommand {
        HandleBillingEventCommand {
            payload: serde_json::to_vec(&body).unwrap(),
            signature: None,
            received_at: NOW,
        }
    }

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new("whsec_test".to_string()))
    }

    async fn stored_plan(directory: &InMemoryUserDirectory) -> String {
        directory
            .get(&CustomerId::new("cus_123").unwrap())
            .await
            .unwrap()
            .plan
            .as_stored()
            .to_string()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn deleted_subscription_clears_plan() {
        let directory = directory_with_subscriber();
        let handler = HandleBillingEventHandler::new(Arc::new(directory.clone()));

        let result = handler
            .handle(command(json!({
                "id": "evt_1",
                "type": "customer.subscription.deleted",
                "data": {"object": {"customer": "cus_123"}}
            })))
            .await
            .unwrap();

        assert_eq!(result.outcome, BillingEventOutcome::Applied);
        assert_eq!(result.event_id.as_deref(), Some("evt_1"));
        assert_eq!(stored_plan(&directory).await, "none");
    }

    #[tokio::test]
    async fn unknown_event_type_is_ignored() {
        let directory = directory_with_subscriber();
        let handler = HandleBillingEventHandler::new(Arc::new(directory.clone()));

        let result = handler.handle(command(json!({"type": "ping"}))).await.unwrap();

        assert_eq!(result.outcome, BillingEventOutcome::Ignored);
        assert_eq!(result.event_type, "ping");
        assert_eq!(stored_plan(&directory).await, "sub_abc");
    }

    #[tokio::test]
    async fn unknown_customer_is_unmatched() {
        let handler = HandleBillingEventHandler::new(Arc::new(directory_with_subscriber()));

        let result = handler
            .handle(command(json!({
                "type": "customer.subscription.created",
                "data": {"object": {"id": "sub_1", "customer": "cus_other"}}
            })))
            .await
            .unwrap();

        assert_eq!(result.outcome, BillingEventOutcome::Unmatched);
    }

    #[tokio::test]
    async fn redelivery_is_stale() {
        let directory = directory_with_subscriber();
        let handler = HandleBillingEventHandler::new(Arc::new(directory.clone()));
        let event = json!({
            "type": "customer.subscription.updated",
            "created": 10,
            "data": {"object": {"id": "sub_new", "customer": "cus_123"}}
        });

        handler.handle(command(event.clone())).await.unwrap();
        let second = handler.handle(command(event)).await.unwrap();

        assert_eq!(second.outcome, BillingEventOutcome::Stale);
        assert_eq!(stored_plan(&directory).await, "sub_new");
    }

    #[tokio::test]
    async fn same_second_replacement_keeps_new_subscription() {
        let directory = directory_with_subscriber();
        let handler = HandleBillingEventHandler::new(Arc::new(directory.clone()));

        let deleted = handler
            .handle(command(json!({
                "type": "customer.subscription.deleted",
                "created": 100,
                "data": {"object": {"id": "sub_abc", "customer": "cus_123"}}
            })))
            .await
            .unwrap();
        let created = handler
            .handle(command(json!({
                "type": "customer.subscription.created",
                "created": 100,
                "data": {"object": {"id": "sub_new", "customer": "cus_123"}}
            })))
            .await
            .unwrap();

        assert_eq!(deleted.outcome, BillingEventOutcome::Applied);
        assert_eq!(created.outcome, BillingEventOutcome::Applied);
        assert_eq!(stored_plan(&directory).await, "sub_new");
    }

    #[tokio::test]
    async fn late_cancellation_of_replaced_subscription_is_superseded() {
        let directory = directory_with_subscriber();
        let handler = HandleBillingEventHandler::new(Arc::new(directory.clone()));

        let result = handler
            .handle(command(json!({
                "type": "customer.subscription.deleted",
                "created": 200,
                "data": {"object": {"id": "sub_old", "customer": "cus_123"}}
            })))
            .await
            .unwrap();

        assert_eq!(result.outcome, BillingEventOutcome::Superseded);
        assert_eq!(stored_plan(&directory).await, "sub_abc");
    }

    #[tokio::test]
    async fn email_taken_by_another_user_is_acknowledged_without_change() {
        let directory = directory_with_subscriber();
        directory
            .create(&UserRecord::new(
                UserId::new("user-2").unwrap(),
                CustomerId::new("cus_456").unwrap(),
                "grace@example.com",
                "Grace",
            ))
            .await
            .unwrap();
        let handler = HandleBillingEventHandler::new(Arc::new(directory.clone()));

        let result = handler
            .handle(command(json!({
                "type": "customer.updated",
                "data": {"object": {"id": "cus_456", "name": "Grace", "email": "ada@example.com"}}
            })))
            .await
            .unwrap();

        assert_eq!(result.outcome, BillingEventOutcome::Rejected);
        let grace = directory.get(&CustomerId::new("cus_456").unwrap()).await.unwrap();
        assert_eq!(grace.email, "grace@example.com");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_type_is_malformed() {
        let handler = HandleBillingEventHandler::new(Arc::new(directory_with_subscriber()));

        let result = handler.handle(command(json!({}))).await;

        assert!(matches!(result, Err(WebhookError::MalformedEvent(_))));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let handler = HandleBillingEventHandler::new(Arc::new(directory_with_subscriber()));

        let result = handler
            .handle(HandleBillingEventCommand {
                payload: b"<xml/>".to_vec(),
                signature: None,
                received_at: NOW,
            })
            .await;

        assert!(matches!(result, Err(WebhookError::MalformedEvent(_))));
    }

    #[tokio::test]
    async fn directory_outage_is_retryable() {
        let directory = directory_with_subscriber();
        directory.set_unavailable(true);
        let handler = HandleBillingEventHandler::new(Arc::new(directory));

        let err = handler
            .handle(command(json!({
                "type": "customer.subscription.deleted",
                "data": {"object": {"customer": "cus_123"}}
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::DirectoryUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn directory_outage_does_not_affect_ignored_events() {
        let directory = directory_with_subscriber();
        directory.set_unavailable(true);
        let handler = HandleBillingEventHandler::new(Arc::new(directory));

        let result = handler.handle(command(json!({"type": "invoice.paid"}))).await;

        assert!(result.is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn signed_delivery_is_accepted() {
        let handler = HandleBillingEventHandler::new(Arc::new(directory_with_subscriber()))
            .with_verifier(verifier());
        let mut cmd = command(json!({"type": "ping"}));
        let now = chrono::Utc::now().timestamp();
        cmd.signature = Some(verifier().generate_test_header(now, &cmd.payload));

        assert!(handler.handle(cmd).await.is_ok());
    }

    #[tokio::test]
    async fn unsigned_delivery_is_rejected_when_secret_configured() {
        let handler = HandleBillingEventHandler::new(Arc::new(directory_with_subscriber()))
            .with_verifier(verifier());

        let result = handler.handle(command(json!({"type": "ping"}))).await;

        assert!(matches!(result, Err(WebhookError::MissingSignature)));
    }

    #[tokio::test]
    async fn tampered_delivery_is_rejected() {
        let directory = directory_with_subscriber();
        let handler =
            HandleBillingEventHandler::new(Arc::new(directory.clone())).with_verifier(verifier());
        let signed = command(json!({"type": "ping"}));
        let now = chrono::Utc::now().timestamp();
        let mut cmd = command(json!({
            "type": "customer.subscription.deleted",
            "data": {"object": {"customer": "cus_123"}}
        }));
        cmd.signature = Some(verifier().generate_test_header(now, &signed.payload));

        let result = handler.handle(cmd).await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        assert_eq!(stored_plan(&directory).await, "sub_abc");
    }
}
