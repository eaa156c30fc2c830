//! Billing handlers.
//!
//! ## Commands
//! - Processing subscription-state webhooks
//! - Creating a billing customer for a new user
//! - Starting a pricing-table checkout session
//! - Opening the self-service billing portal
//!
//! ## Queries
//! - Resolving a user's plan to its product name

mod create_billing_customer;
mod create_checkout_secret;
mod create_portal_link;
mod get_plan_name;
mod handle_billing_event;

// Commands
pub use create_billing_customer::{
    CreateBillingCustomerCommand, CreateBillingCustomerHandler, CreateBillingCustomerResult,
};
pub use create_checkout_secret::{
    CreateCheckoutSecretCommand, CreateCheckoutSecretHandler, CreateCheckoutSecretResult,
};
pub use create_portal_link::{
    CreatePortalLinkCommand, CreatePortalLinkHandler, CreatePortalLinkResult,
};
pub use handle_billing_event::{
    BillingEventOutcome, HandleBillingEventCommand, HandleBillingEventHandler,
    HandleBillingEventResult,
};

// Queries
pub use get_plan_name::{GetPlanNameHandler, GetPlanNameQuery, GetPlanNameResult};
