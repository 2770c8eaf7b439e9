//! In-memory adapters for tests and local development.

mod subscription_repository;
mod user_directory;

pub use subscription_repository::InMemorySubscriptionRepository;
pub use user_directory::InMemoryUserDirectory;
