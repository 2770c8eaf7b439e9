//! Mock payment gateway for testing.
//!
//! Configurable implementation of `PaymentGateway` for unit and integration
//! tests. Supports:
//! - Deterministic customer and order ids
//! - Receipt de-duplication, like the real gateway
//! - Error injection (one-shot or per method)
//! - Call tracking
//! - Real HMAC verification against its own secrets

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::subscription::signature;
use crate::ports::{
    CreateCustomerRequest, CreateOrderRequest, Customer, GatewaySubscription, Order, PaymentError,
    PaymentGateway,
};

pub const MOCK_KEY_SECRET: &str = "mock_key_secret";
pub const MOCK_WEBHOOK_SECRET: &str = "mock_webhook_secret";

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.set_method_error("create_order", PaymentError::timeout("slow"));
///
/// let sig = gateway.sign_payment("order_mock_1", "pay_1");
/// assert!(gateway.verify_payment_signature("order_mock_1", "pay_1", &sig));
/// ```
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Customers keyed by user id.
    customers: HashMap<String, Customer>,

    /// Orders keyed by receipt.
    orders: HashMap<String, Order>,

    subscriptions: HashMap<String, GatewaySubscription>,

    next_customer_seq: u32,
    next_order_seq: u32,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Delay applied to `create_order`.
    order_delay: Option<Duration>,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Registers a subscription the gateway will report on lookup.
    pub fn add_subscription(&self, subscription: GatewaySubscription) {
        let id = subscription.id.clone();
        self.state().subscriptions.insert(id, subscription);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    /// Delays every `create_order` call, to widen race windows in tests.
    pub fn set_order_delay(&self, delay: Duration) {
        self.state().order_delay = Some(delay);
    }

    /// Checkout signature a client would receive for this order and payment.
    pub fn sign_payment(&self, order_id: &str, payment_id: &str) -> String {
        signature::sign_hex(
            MOCK_KEY_SECRET,
            signature::payment_message(order_id, payment_id).as_bytes(),
        )
    }

    /// Webhook signature the gateway would send for this body.
    pub fn sign_webhook(&self, raw_body: &[u8]) -> String {
        signature::sign_hex(MOCK_WEBHOOK_SECRET, raw_body)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Number of distinct orders created.
    pub fn order_count(&self) -> usize {
        self.state().orders.len()
    }

    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // one-shot
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.record_call(
            "create_customer",
            vec![request.user_id.to_string(), request.email.clone().unwrap_or_default()],
        );
        self.check_error("create_customer")?;

        let mut state = self.state();
        let key = request.user_id.to_string();
        if let Some(existing) = state.customers.get(&key) {
            return Ok(existing.clone());
        }
        state.next_customer_seq += 1;
        let customer = Customer {
            id: format!("cust_mock_{}", state.next_customer_seq),
        };
        state.customers.insert(key, customer.clone());
        Ok(customer)
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, PaymentError> {
        self.record_call(
            "create_order",
            vec![
                request.user_id.to_string(),
                request.amount.to_string(),
                request.receipt.clone(),
            ],
        );
        self.check_error("create_order")?;

        let delay = self.state().order_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(existing) = state.orders.get(&request.receipt) {
            return Ok(existing.clone());
        }
        state.next_order_seq += 1;
        let order = Order {
            id: format!("order_mock_{}", state.next_order_seq),
            amount: request.amount,
            currency: request.currency,
            receipt: Some(request.receipt.clone()),
        };
        state.orders.insert(request.receipt, order.clone());
        Ok(order)
    }

    async fn fetch_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<GatewaySubscription>, PaymentError> {
        self.record_call("fetch_subscription", vec![subscription_id.to_string()]);
        self.check_error("fetch_subscription")?;

        Ok(self.state().subscriptions.get(subscription_id).cloned())
    }

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, provided: &str) -> bool {
        signature::verify_hex(
            MOCK_KEY_SECRET,
            signature::payment_message(order_id, payment_id).as_bytes(),
            provided,
        )
    }

    fn verify_webhook_signature(&self, raw_body: &[u8], provided: &str) -> bool {
        signature::verify_hex(MOCK_WEBHOOK_SECRET, raw_body, provided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::ports::PaymentErrorCode;

    fn order_request(receipt: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            user_id: UserId::new("u1").unwrap(),
            customer_id: "cust_mock_1".to_string(),
            amount: 49_900,
            currency: "INR".to_string(),
            receipt: receipt.to_string(),
        }
    }

    #[tokio::test]
    async fn customers_are_stable_per_user() {
        let gateway = MockPaymentGateway::new();
        let request = CreateCustomerRequest {
            user_id: UserId::new("u1").unwrap(),
            email: Some("u1@example.com".to_string()),
            name: None,
        };
        let first = gateway.create_customer(request.clone()).await.unwrap();
        let second = gateway.create_customer(request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.id, "cust_mock_1");
        assert_eq!(gateway.call_count("create_customer"), 2);
    }

    #[tokio::test]
    async fn same_receipt_returns_same_order() {
        let gateway = MockPaymentGateway::new();
        let a = gateway.create_order(order_request("rcpt_a")).await.unwrap();
        let again = gateway.create_order(order_request("rcpt_a")).await.unwrap();
        let b = gateway.create_order(order_request("rcpt_b")).await.unwrap();

        assert_eq!(a, again);
        assert_ne!(a.id, b.id);
        assert_eq!(gateway.order_count(), 2);
    }

    #[tokio::test]
    async fn one_shot_error_is_consumed() {
        let gateway = MockPaymentGateway::new();
        gateway.set_error(PaymentError::network("reset"));

        let err = gateway.create_order(order_request("r")).await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NetworkError);
        assert!(gateway.create_order(order_request("r")).await.is_ok());
    }

    #[tokio::test]
    async fn method_error_persists_until_cleared() {
        let gateway = MockPaymentGateway::new();
        gateway.set_method_error("fetch_subscription", PaymentError::timeout("slow"));

        assert!(gateway.fetch_subscription("sub_1").await.is_err());
        assert!(gateway.fetch_subscription("sub_1").await.is_err());
        gateway.clear_errors();
        assert!(gateway.fetch_subscription("sub_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn registered_subscription_is_returned() {
        let gateway = MockPaymentGateway::new();
        gateway.add_subscription(GatewaySubscription {
            id: "sub_1".to_string(),
            status: "active".to_string(),
            customer_id: Some("cust_mock_1".to_string()),
            current_end: Some(1_800_000_000),
        });
        let found = gateway.fetch_subscription("sub_1").await.unwrap().unwrap();
        assert_eq!(found.status, "active");
    }

    #[test]
    fn signatures_round_trip_through_verification() {
        let gateway = MockPaymentGateway::new();
        let sig = gateway.sign_payment("order_mock_1", "pay_1");
        assert!(gateway.verify_payment_signature("order_mock_1", "pay_1", &sig));
        assert!(!gateway.verify_payment_signature("order_mock_2", "pay_1", &sig));

        let body = br#"{"event":"subscription.charged"}"#;
        let webhook_sig = gateway.sign_webhook(body);
        assert!(gateway.verify_webhook_signature(body, &webhook_sig));
        assert!(!gateway.verify_webhook_signature(body, &sig));
    }
}
