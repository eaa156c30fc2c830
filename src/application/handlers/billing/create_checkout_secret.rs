//! CreateCheckoutSecretHandler - Starts a pricing-table customer session.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::EmailAddress;
use crate::ports::{PaymentProvider, UserDirectory};

#[derive(Debug, Clone)]
pub struct CreateCheckoutSecretCommand {
    pub email: EmailAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutSecretResult {
    pub client_secret: String,
}

/// Handler returning the client secret for the embedded pricing table.
pub struct CreateCheckoutSecretHandler {
    directory: Arc<dyn UserDirectory>,
    provider: Arc<dyn PaymentProvider>,
}

impl CreateCheckoutSecretHandler {
    pub fn new(directory: Arc<dyn UserDirectory>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            directory,
            provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSecretCommand,
    ) -> Result<CreateCheckoutSecretResult, BillingError> {
        let user = self
            .directory
            .find_by_email(&cmd.email)
            .await?
            .ok_or_else(|| BillingError::user_not_found(cmd.email.as_str()))?;

        let session = self
            .provider
            .create_checkout_session_secret(&user.customer_id)
            .await
            .map_err(|e| BillingError::provider("create_checkout_session_secret", e.to_string()))?;

        Ok(CreateCheckoutSecretResult {
            client_secret: session.client_secret,
        })
    }
}
