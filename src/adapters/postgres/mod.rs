//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionRepository` - subscription records with CAS updates
//! - `PostgresUserDirectory` - read-only lookups against the `users` table

mod subscription_repository;
mod user_directory;

pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_directory::PostgresUserDirectory;
