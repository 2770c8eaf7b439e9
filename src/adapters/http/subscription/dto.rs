//! HTTP DTOs (Data Transfer Objects) for subscription endpoints.
//!
//! These types define the JSON request/response structure for the subscription
//! API. Field names are camelCase on the wire; timestamps are RFC 3339.

use serde::{Deserialize, Serialize};

use crate::application::handlers::subscription::{
    CreateOrderResult, GetStatusResult, StartTrialResult, SubscriptionInfo, SweepReport,
    TrialInfo,
};
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{PlanType, SubscriptionStatus};

fn rfc3339(ts: Timestamp) -> String {
    ts.to_string()
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create (or reuse) a payment order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// `monthly` or `yearly`; anything else is rejected by the handler.
    pub plan_type: String,
}

/// Checkout result posted back by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub external_order_id: String,
    pub external_payment_id: String,
    pub signature: String,
    #[serde(default)]
    pub external_subscription_id: Option<String>,
}

/// Admin sweep request. Without a user id every record is swept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialResponse {
    pub trial_start_date: String,
    pub trial_end_date: String,
    pub days_left: i64,
}

impl From<StartTrialResult> for TrialResponse {
    fn from(result: StartTrialResult) -> Self {
        Self {
            trial_start_date: rfc3339(result.trial_start_date),
            trial_end_date: rfc3339(result.trial_end_date),
            days_left: result.days_left,
        }
    }
}

/// Order details the client hands to the gateway's checkout widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub customer_id: String,
}

impl From<CreateOrderResult> for OrderResponse {
    fn from(result: CreateOrderResult) -> Self {
        Self {
            order_id: result.order_id,
            amount: result.amount,
            currency: result.currency,
            customer_id: result.external_customer_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialInfoResponse {
    pub trial_start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_end_date: Option<String>,
    pub days_left: i64,
    pub is_active: bool,
}

impl From<TrialInfo> for TrialInfoResponse {
    fn from(info: TrialInfo) -> Self {
        Self {
            trial_start_date: rfc3339(info.trial_start_date),
            trial_end_date: info.trial_end_date.map(rfc3339),
            days_left: info.days_left,
            is_active: info.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfoResponse {
    pub plan: PlanType,
    pub amount: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_billing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<String>,
    pub days_left: i64,
}

impl From<SubscriptionInfo> for SubscriptionInfoResponse {
    fn from(info: SubscriptionInfo) -> Self {
        Self {
            plan: info.plan,
            amount: info.amount,
            start_date: info.start_date.map(rfc3339),
            end_date: info.end_date.map(rfc3339),
            next_billing_date: info.next_billing_date.map(rfc3339),
            last_payment_date: info.last_payment_date.map(rfc3339),
            days_left: info.days_left,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_info: Option<TrialInfoResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_info: Option<SubscriptionInfoResponse>,
    pub has_access: bool,
}

impl From<GetStatusResult> for StatusResponse {
    fn from(result: GetStatusResult) -> Self {
        Self {
            status: result.status,
            trial_info: result.trial_info.map(TrialInfoResponse::from),
            subscription_info: result.subscription_info.map(SubscriptionInfoResponse::from),
            has_access: result.has_access,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub status: SubscriptionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub reclaimed: usize,
    pub expired: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            reclaimed: report.reclaimed,
            expired: report.expired,
        }
    }
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    #[test]
    fn verify_request_accepts_camel_case_without_subscription() {
        let body = r#"{"externalOrderId":"order_1","externalPaymentId":"pay_1","signature":"ab"}"#;
        let req: VerifyPaymentRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.external_order_id, "order_1");
        assert!(req.external_subscription_id.is_none());
    }

    #[test]
    fn sweep_request_defaults_to_all_users() {
        let req: SweepRequest = serde_json::from_str("{}").unwrap();
        assert!(req.user_id.is_none());
    }

    #[test]
    fn order_response_uses_customer_id() {
        let json = serde_json::to_value(OrderResponse::from(CreateOrderResult {
            order_id: "order_1".to_string(),
            amount: 49_900,
            currency: "INR".to_string(),
            external_customer_id: "cust_1".to_string(),
            reused: true,
        }))
        .unwrap();
        assert_eq!(json["orderId"], "order_1");
        assert_eq!(json["customerId"], "cust_1");
        assert!(json.get("reused").is_none());
    }

    #[test]
    fn status_response_omits_absent_sections() {
        let json = serde_json::to_value(StatusResponse {
            status: SubscriptionStatus::None,
            trial_info: None,
            subscription_info: None,
            has_access: false,
        })
        .unwrap();
        assert_eq!(json["status"], "none");
        assert_eq!(json["hasAccess"], false);
        assert!(json.get("trialInfo").is_none());
    }

    #[test]
    fn trial_info_serialises_dates_as_rfc3339() {
        let json = serde_json::to_value(TrialInfoResponse::from(TrialInfo {
            trial_start_date: ts(0),
            trial_end_date: Some(ts(86_400)),
            days_left: 1,
            is_active: true,
        }))
        .unwrap();
        assert_eq!(json["trialStartDate"], "1970-01-01T00:00:00.000000Z");
        assert_eq!(json["trialEndDate"], "1970-01-02T00:00:00.000000Z");
        assert_eq!(json["isActive"], true);
    }
}
