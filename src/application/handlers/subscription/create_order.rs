//! CreateOrderHandler - Command handler for starting a paid purchase.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{
    receipt_id, PlanType, SubscriptionError, SubscriptionPolicy, SubscriptionRecord,
    SubscriptionStatus,
};
use crate::ports::{CreateCustomerRequest, CreateOrderRequest, PaymentGateway};

use super::record_store::RecordStore;

/// Command to create a payment order.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    /// Raw plan id from the client.
    pub plan_type: String,
}

/// Order handle the client passes to checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderResult {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub external_customer_id: String,
    /// True when an existing pending order was handed back.
    pub reused: bool,
}

/// What to do with the record as read.
enum Plan {
    /// Hand back the pending order already on the record.
    Reuse(CreateOrderResult),
    /// Go to the gateway for a new order.
    Issue,
}

/// Handler for order creation.
///
/// Gateway calls come first and the record is written only after they
/// succeed, so a failed or abandoned request leaves storage untouched. The
/// receipt is derived from the user and a time bucket so a retried request
/// maps onto the same gateway order.
pub struct CreateOrderHandler {
    store: RecordStore,
    gateway: Arc<dyn PaymentGateway>,
    policy: SubscriptionPolicy,
}

impl CreateOrderHandler {
    pub fn new(store: RecordStore, gateway: Arc<dyn PaymentGateway>, policy: SubscriptionPolicy) -> Self {
        Self {
            store,
            gateway,
            policy,
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, SubscriptionError> {
        let plan = PlanType::parse(&cmd.plan_type)
            .ok_or_else(|| SubscriptionError::invalid_plan(cmd.plan_type.clone()))?;
        let terms = self.policy.terms(plan);
        let timeout = self.policy.pending_timeout_mins;

        let record = self.store.load_or_create(&cmd.user_id).await?;
        let now = self.store.now();

        if let Plan::Reuse(existing) = self.classify(&record, plan, now)? {
            tracing::debug!(user_id = %cmd.user_id, order_id = %existing.order_id, "Reusing pending order");
            return Ok(existing);
        }

        let customer_id = match record.external_customer_id.clone() {
            Some(id) => id,
            None => self.create_customer(&cmd.user_id).await?,
        };

        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                user_id: cmd.user_id.clone(),
                customer_id: customer_id.clone(),
                amount: terms.amount,
                currency: self.policy.currency.clone(),
                receipt: receipt_id(&cmd.user_id, plan, now, self.policy.pending_timeout_secs()),
            })
            .await?;

        // a de-duplicated receipt can hand back an order priced for other terms
        if order.amount != terms.amount || order.currency != self.policy.currency {
            tracing::error!(
                user_id = %cmd.user_id,
                order_id = %order.id,
                order_amount = order.amount,
                plan_amount = terms.amount,
                "Gateway order does not match the plan price"
            );
            return Err(SubscriptionError::gateway(
                format!("order {} does not match the {} plan price", order.id, plan),
                false,
            ));
        }

        let mutation = self
            .store
            .update(&cmd.user_id, |record, now| {
                if record.is_stale_pending(timeout, now) {
                    record.reclaim_pending(now);
                }
                // a concurrent request already issued an order for this plan
                if record.status == SubscriptionStatus::Pending
                    && record.plan == Some(plan)
                    && record.external_order_id.is_some()
                {
                    return Ok(());
                }
                record.begin_order(plan, terms, &customer_id, &order.id, now)
            })
            .await?;

        let result = self.order_handle(&mutation.record, !mutation.written)?;
        if mutation.written {
            tracing::info!(
                user_id = %cmd.user_id,
                plan = %plan,
                order_id = %result.order_id,
                "Order created, subscription pending"
            );
        }
        Ok(result)
    }

    fn classify(
        &self,
        record: &SubscriptionRecord,
        plan: PlanType,
        now: Timestamp,
    ) -> Result<Plan, SubscriptionError> {
        match record.status {
            SubscriptionStatus::Active => Err(SubscriptionError::AlreadyActive),
            SubscriptionStatus::Pending
                if !record.is_stale_pending(self.policy.pending_timeout_mins, now) =>
            {
                if record.plan == Some(plan) && record.external_order_id.is_some() {
                    Ok(Plan::Reuse(self.order_handle(record, true)?))
                } else {
                    Err(SubscriptionError::OrderPending)
                }
            }
            // stale, reclaimed under CAS before the new order is written
            SubscriptionStatus::Pending => Ok(Plan::Issue),
            status if status.allows_new_order() => Ok(Plan::Issue),
            status => Err(SubscriptionError::NotEligible(status)),
        }
    }

    /// Builds the client handle from a pending record.
    fn order_handle(&self, record: &SubscriptionRecord, reused: bool) -> Result<CreateOrderResult, SubscriptionError> {
        match (&record.external_order_id, record.amount, &record.external_customer_id) {
            (Some(order_id), Some(amount), Some(customer_id)) => Ok(CreateOrderResult {
                order_id: order_id.clone(),
                amount,
                currency: self.policy.currency.clone(),
                external_customer_id: customer_id.clone(),
                reused,
            }),
            _ => Err(SubscriptionError::infrastructure(
                "pending record is missing its order details",
            )),
        }
    }

    async fn create_customer(&self, user_id: &UserId) -> Result<String, SubscriptionError> {
        let contact = self
            .store
            .directory()
            .find_user(user_id)
            .await?
            .ok_or_else(|| SubscriptionError::UserNotFound(user_id.clone()))?;

        let customer = self
            .gateway
            .create_customer(CreateCustomerRequest {
                user_id: user_id.clone(),
                email: contact.email,
                name: contact.name,
            })
            .await?;
        Ok(customer.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySubscriptionRepository, InMemoryUserDirectory};
    use crate::adapters::razorpay::MockPaymentGateway;
    use crate::ports::{FixedClock, PaymentError};

    fn t0() -> Timestamp {
        Timestamp::from_unix_secs(1_705_312_800).unwrap()
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    struct Fixture {
        handler: CreateOrderHandler,
        repo: InMemorySubscriptionRepository,
        directory: InMemoryUserDirectory,
        gateway: MockPaymentGateway,
        clock: Arc<FixedClock>,
    }

    async fn fixture() -> Fixture {
        let repo = InMemorySubscriptionRepository::new();
        let directory = InMemoryUserDirectory::new();
        directory.add_user(&user()).await;
        let gateway = MockPaymentGateway::new();
        let clock = Arc::new(FixedClock::new(t0()));
        let store = RecordStore::new(
            Arc::new(repo.clone()),
            Arc::new(directory.clone()),
            clock.clone(),
            3,
        );
        Fixture {
            handler: CreateOrderHandler::new(
                store,
                Arc::new(gateway.clone()),
                SubscriptionPolicy::default(),
            ),
            repo,
            directory,
            gateway,
            clock,
        }
    }

    fn order(plan: &str) -> CreateOrderCommand {
        CreateOrderCommand {
            user_id: user(),
            plan_type: plan.to_string(),
        }
    }

    async fn seed(f: &Fixture, status: SubscriptionStatus) {
        let mut record = SubscriptionRecord::new(user(), t0());
        record.status = status;
        record.end_date = Some(t0().add_days(10));
        f.repo.put(record).await;
    }

    #[tokio::test]
    async fn first_order_moves_record_to_pending() {
        let f = fixture().await;
        let result = f.handler.handle(order("monthly")).await.unwrap();

        assert_eq!(result.order_id, "order_mock_1");
        assert_eq!(result.amount, 49_900);
        assert_eq!(result.currency, "INR");
        assert_eq!(result.external_customer_id, "cust_mock_1");
        assert!(!result.reused);

        let stored = f.repo.get(&user()).await.unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Pending);
        assert_eq!(stored.plan, Some(PlanType::Monthly));
        assert_eq!(stored.amount, Some(49_900));
        assert_eq!(stored.start_date, Some(t0()));
        assert_eq!(stored.end_date, Some(t0().add_months(1)));
        assert_eq!(stored.next_billing_date, stored.end_date);
        assert_eq!(stored.external_order_id.as_deref(), Some("order_mock_1"));
    }

    #[tokio::test]
    async fn plan_type_is_case_insensitive() {
        let f = fixture().await;
        let result = f.handler.handle(order("YEARLY")).await.unwrap();
        assert_eq!(result.amount, 499_900);
    }

    #[tokio::test]
    async fn unknown_plan_rejected_before_any_call() {
        let f = fixture().await;
        let err = f.handler.handle(order("weekly")).await.unwrap_err();
        assert_eq!(err, SubscriptionError::InvalidPlan("weekly".to_string()));
        assert!(f.gateway.calls().is_empty());
        assert!(f.repo.is_empty().await);
    }

    #[tokio::test]
    async fn active_user_rejected_for_every_plan() {
        let f = fixture().await;
        seed(&f, SubscriptionStatus::Active).await;
        for plan in ["monthly", "yearly"] {
            let err = f.handler.handle(order(plan)).await.unwrap_err();
            assert_eq!(err, SubscriptionError::AlreadyActive);
        }
        assert!(!f.gateway.was_called("create_order"));
    }

    #[tokio::test]
    async fn same_plan_while_pending_reuses_order() {
        let f = fixture().await;
        let first = f.handler.handle(order("monthly")).await.unwrap();
        let stored = f.repo.get(&user()).await.unwrap();

        f.clock.advance_minutes(5);
        let second = f.handler.handle(order("monthly")).await.unwrap();

        assert_eq!(second.order_id, first.order_id);
        assert!(second.reused);
        assert_eq!(f.gateway.call_count("create_order"), 1);
        assert_eq!(f.repo.get(&user()).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn different_plan_while_pending_is_refused() {
        let f = fixture().await;
        f.handler.handle(order("monthly")).await.unwrap();
        let err = f.handler.handle(order("yearly")).await.unwrap_err();
        assert_eq!(err, SubscriptionError::OrderPending);
    }

    #[tokio::test]
    async fn stale_pending_gets_fresh_order() {
        let f = fixture().await;
        let first = f.handler.handle(order("monthly")).await.unwrap();

        f.clock.advance_minutes(31);
        let second = f.handler.handle(order("yearly")).await.unwrap();

        assert_ne!(second.order_id, first.order_id);
        let stored = f.repo.get(&user()).await.unwrap();
        assert_eq!(stored.plan, Some(PlanType::Yearly));
        assert_eq!(stored.external_order_id, Some(second.order_id));
        // customer id survives the reclaim
        assert_eq!(stored.external_customer_id.as_deref(), Some("cust_mock_1"));
        assert_eq!(f.gateway.call_count("create_customer"), 1);
    }

    #[tokio::test]
    async fn orders_allowed_from_trial_cancelled_and_expired() {
        for status in [
            SubscriptionStatus::Trial,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ] {
            let f = fixture().await;
            seed(&f, status).await;
            f.handler.handle(order("monthly")).await.unwrap();
            assert_eq!(
                f.repo.get(&user()).await.unwrap().status,
                SubscriptionStatus::Pending
            );
        }
    }

    #[tokio::test]
    async fn existing_customer_is_not_recreated() {
        let f = fixture().await;
        let mut record = SubscriptionRecord::new(user(), t0());
        record.status = SubscriptionStatus::Expired;
        record.external_customer_id = Some("cust_existing".to_string());
        f.repo.put(record).await;

        let result = f.handler.handle(order("monthly")).await.unwrap();
        assert_eq!(result.external_customer_id, "cust_existing");
        assert!(!f.gateway.was_called("create_customer"));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_record_untouched() {
        let f = fixture().await;
        seed(&f, SubscriptionStatus::Expired).await;
        let before = f.repo.get(&user()).await.unwrap();
        f.gateway
            .set_method_error("create_order", PaymentError::timeout("gateway slow"));

        let err = f.handler.handle(order("monthly")).await.unwrap_err();
        assert!(matches!(err, SubscriptionError::Gateway { retryable: true, .. }));
        assert_eq!(f.repo.get(&user()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn order_priced_for_other_terms_is_refused() {
        let f = fixture().await;
        let policy = SubscriptionPolicy::default();
        // the gateway already holds an order under this receipt at another price
        f.gateway
            .create_order(CreateOrderRequest {
                user_id: user(),
                customer_id: "cust_mock_1".to_string(),
                amount: 100,
                currency: "INR".to_string(),
                receipt: receipt_id(&user(), PlanType::Monthly, t0(), policy.pending_timeout_secs()),
            })
            .await
            .unwrap();

        let err = f.handler.handle(order("monthly")).await.unwrap_err();
        assert!(matches!(err, SubscriptionError::Gateway { retryable: false, .. }));
        let stored = f.repo.get(&user()).await.unwrap();
        assert_eq!(stored.status, SubscriptionStatus::None);
        assert_eq!(stored.external_order_id, None);
    }

    #[tokio::test]
    async fn users_with_similar_ids_get_their_own_orders() {
        let f = fixture().await;
        let dotted = UserId::new("a.b").unwrap();
        let plain = UserId::new("ab").unwrap();
        f.directory.add_user(&dotted).await;
        f.directory.add_user(&plain).await;

        let first = f
            .handler
            .handle(CreateOrderCommand {
                user_id: dotted.clone(),
                plan_type: "monthly".to_string(),
            })
            .await;
        let second = f
            .handler
            .handle(CreateOrderCommand {
                user_id: plain.clone(),
                plan_type: "monthly".to_string(),
            })
            .await;

        let (first, second) = (first.unwrap(), second.unwrap());
        assert_ne!(first.order_id, second.order_id);
        assert_eq!(f.gateway.order_count(), 2);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture().await;
        let err = f
            .handler
            .handle(CreateOrderCommand {
                user_id: UserId::new("ghost").unwrap(),
                plan_type: "monthly".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::UserNotFound(_)));
        assert!(f.gateway.calls().is_empty());
    }
}
