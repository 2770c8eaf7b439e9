//! Subscription handlers.
//!
//! Command and query handlers for the subscription lifecycle:
//!
//! ## Commands
//! - Starting the one-time trial
//! - Creating (or reusing) a payment order
//! - Verifying a checkout payment
//! - Reconciling gateway webhooks
//! - Cancelling a pending order
//! - Sweeping stale orders and lapsed windows
//!
//! ## Queries
//! - Get subscription status and access
//!
//! All writes go through [`RecordStore`], which retries lost
//! compare-and-swap races.

mod cancel_pending;
mod create_order;
mod get_status;
mod notices;
mod reconcile_webhook;
mod record_store;
mod start_trial;
mod sweep_stale;
mod verify_payment;

pub use record_store::{Mutation, RecordStore};

// Commands
pub use cancel_pending::{CancelPendingCommand, CancelPendingHandler, CancelPendingResult};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use reconcile_webhook::{ReconcileWebhookCommand, ReconcileWebhookHandler, WebhookOutcome};
pub use start_trial::{StartTrialCommand, StartTrialHandler, StartTrialResult};
pub use sweep_stale::{SweepOutcome, SweepReport, SweepStaleHandler};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler};

// Queries
pub use get_status::{GetStatusHandler, GetStatusQuery, GetStatusResult, SubscriptionInfo, TrialInfo};
