//! In-process storage adapters.
//!
//! - **InMemoryUserDirectory** - `UserDirectory` held in memory (tests, local development)

mod in_memory_user_directory;

pub use in_memory_user_directory::InMemoryUserDirectory;
