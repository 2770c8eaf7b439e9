//! VerifyPaymentHandler - Command handler for checkout confirmation.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{
    AttachOutcome, PlanType, SubscriptionError, SubscriptionPolicy, SubscriptionStatus,
};
use crate::ports::{GatewaySubscription, PaymentGateway, SubscriptionNotice, SubscriptionNotifier};

use super::notices::deliver;
use super::record_store::RecordStore;

/// Command carrying what checkout returned to the client.
#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub user_id: UserId,
    pub external_order_id: String,
    pub external_payment_id: String,
    pub signature: String,
    /// Gateway subscription created by checkout, if any.
    pub external_subscription_id: Option<String>,
}

/// Handler for payment verification.
///
/// A valid signature for the order currently on the caller's record
/// activates a pending subscription. Repeating the same checkout later is a
/// no-op, and a signature for someone else's order changes nothing.
pub struct VerifyPaymentHandler {
    store: RecordStore,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn SubscriptionNotifier>,
    policy: SubscriptionPolicy,
}

impl VerifyPaymentHandler {
    pub fn new(
        store: RecordStore,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn SubscriptionNotifier>,
        policy: SubscriptionPolicy,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            policy,
        }
    }

    pub async fn handle(&self, cmd: VerifyPaymentCommand) -> Result<(), SubscriptionError> {
        if cmd.external_order_id.trim().is_empty() || cmd.external_payment_id.trim().is_empty() {
            return Err(SubscriptionError::validation("order and payment ids are required"));
        }
        if !self.gateway.verify_payment_signature(
            &cmd.external_order_id,
            &cmd.external_payment_id,
            &cmd.signature,
        ) {
            tracing::warn!(
                user_id = %cmd.user_id,
                order_id = %cmd.external_order_id,
                "Rejected payment with invalid signature"
            );
            return Err(SubscriptionError::InvalidSignature);
        }

        let subscription = match cmd.external_subscription_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(self.confirm_subscription(id).await?),
            _ => None,
        };

        let plans = self.policy.plans.clone();
        let user_id = cmd.user_id.clone();
        let order_id = cmd.external_order_id.clone();
        let mutation = self
            .store
            .update(&cmd.user_id, |record, now| {
                if record.external_order_id.as_deref() != Some(order_id.as_str()) {
                    return Err(SubscriptionError::validation(
                        "order was not issued to this user",
                    ));
                }
                if let Some(found) = &subscription {
                    let owned = found.customer_id.is_some()
                        && found.customer_id == record.external_customer_id;
                    if !owned {
                        return Err(SubscriptionError::validation(format!(
                            "gateway subscription {} belongs to another customer",
                            found.id
                        )));
                    }
                }

                // a checkout only opens a window once; later repeats just attach
                let activated = record.status == SubscriptionStatus::Pending;
                if activated {
                    let plan = record.plan.unwrap_or_else(|| {
                        tracing::warn!(user_id = %user_id, "Verified payment without a plan, assuming monthly");
                        PlanType::Monthly
                    });
                    record.activate(plans.terms(plan).period_months, now);
                }
                let attached = subscription
                    .as_ref()
                    .map(|found| record.attach_subscription(&found.id, now));
                Ok((activated, attached))
            })
            .await?;
        let (activated, attached) = mutation.value;

        if let (Some(AttachOutcome::Conflicting), Some(found)) = (attached, &subscription) {
            tracing::warn!(
                user_id = %cmd.user_id,
                offered = %found.id,
                stored = ?mutation.record.external_subscription_id,
                "Kept existing gateway subscription id"
            );
        }

        if !activated {
            tracing::debug!(
                user_id = %cmd.user_id,
                order_id = %cmd.external_order_id,
                status = %mutation.record.status,
                "Checkout already applied"
            );
            return Ok(());
        }

        tracing::info!(
            user_id = %cmd.user_id,
            order_id = %cmd.external_order_id,
            payment_id = %cmd.external_payment_id,
            end_date = ?mutation.record.end_date,
            "Payment verified, subscription active"
        );
        deliver(
            self.notifier.as_ref(),
            SubscriptionNotice::Activated {
                user_id: cmd.user_id,
                plan: mutation.record.plan,
                ends_at: mutation.record.end_date,
            },
        )
        .await;
        Ok(())
    }

    /// Confirms the gateway knows the subscription before we store its id.
    async fn confirm_subscription(&self, id: &str) -> Result<GatewaySubscription, SubscriptionError> {
        self.gateway
            .fetch_subscription(id)
            .await?
            .ok_or_else(|| SubscriptionError::validation(format!("unknown gateway subscription: {}", id)))
    }
}
