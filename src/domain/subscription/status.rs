//! Subscription status state machine.
//!
//! The transition table covers user-driven moves only. Payment verification
//! and gateway webhooks assert a status directly and bypass it.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-user subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No trial, no order. Initial state and the target of a pending reclaim.
    None,

    /// One-time free trial window.
    Trial,

    /// Order created, payment not yet confirmed. No access.
    Pending,

    /// Paid window confirmed by verification or a `charged` event.
    Active,

    /// Gateway reported the subscription cancelled.
    Cancelled,

    /// Paid or trial window is over.
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Parses the storage representation.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(SubscriptionStatus::None),
            "trial" => Some(SubscriptionStatus::Trial),
            "pending" => Some(SubscriptionStatus::Pending),
            "active" => Some(SubscriptionStatus::Active),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    /// Statuses whose access depends on `end_date`.
    pub fn is_time_boxed(&self) -> bool {
        matches!(self, SubscriptionStatus::Trial | SubscriptionStatus::Active)
    }

    /// Statuses from which a brand new order may be created.
    ///
    /// `Pending` is handled separately: a fresh pending order is re-issued,
    /// a stale one is reclaimed first.
    pub fn allows_new_order(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::None
                | SubscriptionStatus::Trial
                | SubscriptionStatus::Cancelled
                | SubscriptionStatus::Expired
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (None, Trial)
                | (None, Pending)
                | (Trial, Pending)
                | (Trial, Expired)
                | (Pending, None)
                | (Active, Expired)
                | (Cancelled, Pending)
                | (Expired, Pending)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            None => vec![Trial, Pending],
            Trial => vec![Pending, Expired],
            Pending => vec![None],
            Active => vec![Expired],
            Cancelled => vec![Pending],
            Expired => vec![Pending],
        }
    }
}
