//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresUserDirectory` - users table keyed by billing customer id

mod user_directory;

pub use user_directory::PostgresUserDirectory;
