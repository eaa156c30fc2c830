//! GetPlanNameHandler - Query handler resolving a user's plan to a product name.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::EmailAddress;
use crate::ports::{PaymentProvider, UserDirectory};

/// Query for the plan name of the user with this email.
#[derive(Debug, Clone)]
pub struct GetPlanNameQuery {
    pub email: EmailAddress,
}

/// Product name of the user's subscription, or `None` when on no plan.
pub type GetPlanNameResult = Option<String>;

/// Handler for plan enrichment.
///
/// Follows the stored subscription id to its first item's product. Users
/// without a plan never trigger a provider call.
pub struct GetPlanNameHandler {
    directory: Arc<dyn UserDirectory>,
    provider: Arc<dyn PaymentProvider>,
}

impl GetPlanNameHandler {
    pub fn new(directory: Arc<dyn UserDirectory>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            directory,
            provider,
        }
    }

    pub async fn handle(&self, query: GetPlanNameQuery) -> Result<GetPlanNameResult, BillingError> {
        let user = self
            .directory
            .find_by_email(&query.email)
            .await?
            .ok_or_else(|| BillingError::user_not_found(query.email.as_str()))?;

        let Some(subscription_id) = user.plan.subscription_id() else {
            return Ok(None);
        };

        let subscription = self
            .provider
            .get_subscription(subscription_id)
            .await
            .map_err(|e| BillingError::provider("get_subscription", e.to_string()))?
            .ok_or_else(|| {
                BillingError::provider(
                    "get_subscription",
                    format!("subscription {} not found", subscription_id),
                )
            })?;

        let product_id = subscription
            .primary_product()
            .ok_or_else(|| BillingError::provider("get_subscription", "subscription has no items"))?;

        let product = self
            .provider
            .get_product(product_id)
            .await
            .map_err(|e| BillingError::provider("get_product", e.to_string()))?
            .ok_or_else(|| {
                BillingError::provider("get_product", format!("product {} not found", product_id))
            })?;

        Ok(Some(product.name))
    }
}
