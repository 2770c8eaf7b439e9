//! Gateway webhook envelope.
//!
//! ```json
//! {
//!   "event": "subscription.charged",
//!   "payload": {
//!     "subscription": { "entity": { "id": "sub_1", "current_end": 1707955200 } },
//!     "payment": { "entity": { "id": "pay_1", "created_at": 1705276800 } }
//!   }
//! }
//! ```

use serde::Deserialize;

use super::{SubscriptionError, SubscriptionStatus};
use crate::domain::foundation::Timestamp;

/// Event types this service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventKind {
    Charged,
    Cancelled,
    Completed,
    Halted,
    PaymentFailed,
    Unknown(String),
}

impl GatewayEventKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "subscription.charged" => GatewayEventKind::Charged,
            "subscription.cancelled" => GatewayEventKind::Cancelled,
            "subscription.completed" => GatewayEventKind::Completed,
            "subscription.halted" => GatewayEventKind::Halted,
            "payment.failed" => GatewayEventKind::PaymentFailed,
            other => GatewayEventKind::Unknown(other.to_string()),
        }
    }

    /// Status the gateway asserts for events that only move the status.
    pub fn asserted_status(&self) -> Option<SubscriptionStatus> {
        match self {
            GatewayEventKind::Cancelled => Some(SubscriptionStatus::Cancelled),
            GatewayEventKind::Completed | GatewayEventKind::Halted => {
                Some(SubscriptionStatus::Expired)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionEntity {
    pub id: String,
    /// Unix seconds; end of the period just paid for.
    #[serde(default)]
    pub current_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    /// Unix seconds.
    pub created_at: i64,
    #[serde(default)]
    pub subscription_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub subscription: Option<Entity<SubscriptionEntity>>,
    #[serde(default)]
    pub payment: Option<Entity<PaymentEntity>>,
}

/// Parsed webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    #[serde(default)]
    pub payload: EventPayload,
}

impl GatewayEvent {
    /// Parses an already signature-checked body.
    pub fn parse(raw: &[u8]) -> Result<Self, SubscriptionError> {
        serde_json::from_slice(raw).map_err(|e| SubscriptionError::malformed(e.to_string()))
    }

    pub fn kind(&self) -> GatewayEventKind {
        GatewayEventKind::parse(&self.event)
    }

    /// External subscription id the event refers to.
    ///
    /// Falls back to the payment's subscription id, which is the only place
    /// `payment.failed` carries it.
    pub fn subscription_id(&self) -> Option<&str> {
        self.payload
            .subscription
            .as_ref()
            .map(|s| s.entity.id.as_str())
            .or_else(|| {
                self.payload
                    .payment
                    .as_ref()
                    .and_then(|p| p.entity.subscription_id.as_deref())
            })
            .filter(|id| !id.is_empty())
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payload.payment.as_ref().map(|p| p.entity.id.as_str())
    }

    /// When the charge happened, if the event carries a payment.
    pub fn paid_at(&self) -> Option<Timestamp> {
        self.payload
            .payment
            .as_ref()
            .and_then(|p| Timestamp::from_unix_secs(p.entity.created_at))
    }

    /// End of the paid period, if the event states one.
    pub fn period_end(&self) -> Option<Timestamp> {
        self.payload
            .subscription
            .as_ref()
            .and_then(|s| s.entity.current_end)
            .and_then(Timestamp::from_unix_secs)
    }
}
