//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionRepository` - per-user record store with CAS updates
//! - `PaymentGateway` - customers, orders, subscription lookup, signatures
//! - `UserDirectory` - read-only identity lookup
//! - `SubscriptionNotifier` - fire-and-forget user notifications
//! - `SessionValidator` - bearer token validation
//! - `Clock` - injectable time source

mod clock;
mod payment_gateway;
mod session_validator;
mod subscription_notifier;
mod subscription_repository;
mod user_directory;

pub use clock::{Clock, FixedClock, SystemClock};
pub use payment_gateway::{
    CreateCustomerRequest, CreateOrderRequest, Customer, GatewaySubscription, Order,
    PaymentError, PaymentErrorCode, PaymentGateway,
};
pub use session_validator::SessionValidator;
pub use subscription_notifier::{NotifyError, SubscriptionNotice, SubscriptionNotifier};
pub use subscription_repository::SubscriptionRepository;
pub use user_directory::{UserContact, UserDirectory};
