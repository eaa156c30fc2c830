//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors)
//! - `billing` - Billing events, the subscription state reducer, user records

pub mod billing;
pub mod foundation;
