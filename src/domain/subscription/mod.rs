//! Subscription domain module.
//!
//! Per-user subscription lifecycle, gateway event shapes, signature checks and
//! the access decision.
//!
//! # Module Structure
//!
//! - `record` - SubscriptionRecord aggregate
//! - `status` - SubscriptionStatus state machine
//! - `plan` - PlanType and the plan catalog
//! - `policy` - trial length, pending timeout and other knobs
//! - `access` - pure entitlement check
//! - `gateway_event` - webhook envelope
//! - `signature` - HMAC-SHA256 verification
//! - `receipt` - deterministic order receipts

mod access;
mod errors;
mod gateway_event;
mod plan;
mod policy;
mod receipt;
mod record;
pub mod signature;
mod status;

pub use access::has_access;
pub use errors::SubscriptionError;
pub use gateway_event::{GatewayEvent, GatewayEventKind};
pub use plan::{PlanCatalog, PlanTerms, PlanType};
pub use policy::SubscriptionPolicy;
pub use receipt::{receipt_id, MAX_RECEIPT_LEN};
pub use record::{AttachOutcome, SubscriptionRecord};
pub use status::SubscriptionStatus;
