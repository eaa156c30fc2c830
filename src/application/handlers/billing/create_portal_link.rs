//! CreatePortalLinkHandler - Billing portal session for self-service management.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::EmailAddress;
use crate::ports::{PaymentProvider, UserDirectory};

#[derive(Debug, Clone)]
pub struct CreatePortalLinkCommand {
    pub email: EmailAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePortalLinkResult {
    pub url: String,
}

/// Handler returning a billing portal URL. The caller decides whether to
/// redirect; this service never does.
pub struct CreatePortalLinkHandler {
    directory: Arc<dyn UserDirectory>,
    provider: Arc<dyn PaymentProvider>,
    return_url: String,
}

impl CreatePortalLinkHandler {
    /// `public_url` is the application's external base URL; the portal
    /// returns the user to its dashboard.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        provider: Arc<dyn PaymentProvider>,
        public_url: &str,
    ) -> Self {
        Self {
            directory,
            provider,
            return_url: format!("{}/dashboard", public_url.trim_end_matches('/')),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePortalLinkCommand,
    ) -> Result<CreatePortalLinkResult, BillingError> {
        let user = self
            .directory
            .find_by_email(&cmd.email)
            .await?
            .ok_or_else(|| BillingError::user_not_found(cmd.email.as_str()))?;

        let session = self
            .provider
            .create_billing_portal_url(&user.customer_id, &self.return_url)
            .await
            .map_err(|e| BillingError::provider("create_billing_portal_url", e.to_string()))?;

        Ok(CreatePortalLinkResult { url: session.url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryUserDirectory;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::UserRecord;
    use crate::domain::foundation::{CustomerId, UserId};
    use crate::ports::PaymentError;

    fn directory() -> Arc<InMemoryUserDirectory> {
        Arc::new(InMemoryUserDirectory::with_users([UserRecord::new(
            UserId::new("user-1").unwrap(),
            CustomerId::new("cus_1").unwrap(),
            "ada@example.com",
            "Ada",
        )]))
    }

    fn command() -> CreatePortalLinkCommand {
        CreatePortalLinkCommand {
            email: EmailAddress::new("ada@example.com").unwrap(),
        }
    }

    #[tokio::test]
    async fn portal_returns_to_dashboard() {
        let provider = MockPaymentProvider::new();
        let handler = CreatePortalLinkHandler::new(
            directory(),
            Arc::new(provider.clone()),
            "https://app.example.com/",
        );

        let result = handler.handle(command()).await.unwrap();

        assert!(result.url.starts_with("https://billing.stripe.com/"));
        let call = &provider.calls()[0];
        assert_eq!(call.args, vec!["cus_1", "https://app.example.com/dashboard"]);
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let provider = MockPaymentProvider::new();
        provider.set_method_error(
            "create_billing_portal_url",
            PaymentError::network("timeout"),
        );
        let handler =
            CreatePortalLinkHandler::new(directory(), Arc::new(provider), "http://localhost:3000");

        let err = handler.handle(command()).await.unwrap_err();

        assert!(err.is_retryable());
    }
}
