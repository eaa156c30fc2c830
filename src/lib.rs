//! Plan Sync - Stripe subscription state for application users.
//!
//! Reduces Stripe webhook events to conditional updates of the local user
//! directory, resolves a user's plan to a product name and passes customer,
//! checkout and billing-portal requests through to Stripe.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
