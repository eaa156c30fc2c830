//! Adapters - Implementations of port interfaces.
//!
//! - `http` - Axum routes and handlers
//! - `postgres` - PostgreSQL user directory
//! - `storage` - In-memory user directory
//! - `stripe` - Stripe payment provider and its test double

pub mod http;
pub mod postgres;
pub mod storage;
pub mod stripe;
