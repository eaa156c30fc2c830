//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `UserDirectory` - Keyed store of user records with conditional updates
//! - `PaymentProvider` - Payment gateway queries and hosted-flow sessions

mod payment_provider;
mod user_directory;

pub use payment_provider::{
    CreateCustomerRequest, Customer, CustomerSession, PaymentError, PaymentErrorCode,
    PaymentProvider, PortalSession, Product, Subscription,
};
pub use user_directory::UserDirectory;
