//! Application layer - Commands, Queries, and Handlers.
//!
//! Orchestrates billing domain operations across the payment provider and
//! user directory ports. Command handlers write, query handlers read.

pub mod handlers;

pub use handlers::{
    BillingEventOutcome, CreateBillingCustomerCommand, CreateBillingCustomerHandler,
    CreateBillingCustomerResult, CreateCheckoutSecretCommand, CreateCheckoutSecretHandler,
    CreateCheckoutSecretResult, CreatePortalLinkCommand, CreatePortalLinkHandler,
    CreatePortalLinkResult, GetPlanNameHandler, GetPlanNameQuery, GetPlanNameResult,
    HandleBillingEventCommand, HandleBillingEventHandler, HandleBillingEventResult,
};
