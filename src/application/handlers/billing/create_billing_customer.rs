//! CreateBillingCustomerHandler - Command handler provisioning a billing customer.
//!
//! Creates the provider customer first and then the local user record that
//! links to it. A user record starts on no plan.

use std::sync::Arc;

use crate::domain::billing::{BillingError, UserRecord};
use crate::domain::foundation::{CustomerId, EmailAddress, UserId};
use crate::ports::{CreateCustomerRequest, PaymentProvider, UserDirectory};

/// Command to create a billing customer for a signed-up user.
#[derive(Debug, Clone)]
pub struct CreateBillingCustomerCommand {
    pub user_id: UserId,
    pub email: EmailAddress,
    pub name: Option<String>,
}

/// Result of successful customer creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBillingCustomerResult {
    pub customer_id: CustomerId,
}

/// Handler for customer provisioning.
pub struct CreateBillingCustomerHandler {
    directory: Arc<dyn UserDirectory>,
    provider: Arc<dyn PaymentProvider>,
}

impl CreateBillingCustomerHandler {
    pub fn new(directory: Arc<dyn UserDirectory>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            directory,
            provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateBillingCustomerCommand,
    ) -> Result<CreateBillingCustomerResult, BillingError> {
        // Checked up front so a duplicate does not leave an orphan provider customer.
        if self.directory.find_by_email(&cmd.email).await?.is_some() {
            return Err(BillingError::conflict(format!(
                "a billing customer already exists for {}",
                cmd.email
            )));
        }

        let customer = self
            .provider
            .create_customer(CreateCustomerRequest {
                user_id: cmd.user_id.clone(),
                email: cmd.email.as_str().to_string(),
                name: cmd.name.clone(),
            })
            .await
            .map_err(|e| BillingError::provider("create_customer", e.to_string()))?;

        let user = UserRecord::new(
            cmd.user_id,
            customer.id.clone(),
            cmd.email.as_str(),
            cmd.name.unwrap_or_default(),
        );
        self.directory.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            customer_id = %customer.id,
            "Billing customer created"
        );

        Ok(CreateBillingCustomerResult {
            customer_id: customer.id,
        })
    }
}
