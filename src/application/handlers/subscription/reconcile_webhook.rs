//! ReconcileWebhookHandler - Command handler for gateway webhooks.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{
    GatewayEvent, GatewayEventKind, SubscriptionError, SubscriptionRecord, SubscriptionStatus,
};
use crate::ports::{PaymentGateway, SubscriptionNotice, SubscriptionNotifier};

use super::notices::deliver;
use super::record_store::RecordStore;

/// Command to reconcile one webhook delivery.
#[derive(Debug, Clone)]
pub struct ReconcileWebhookCommand {
    /// Body exactly as received; the signature covers these bytes.
    pub raw_body: Vec<u8>,
    /// Signature header value.
    pub signature: Option<String>,
}

/// What an accepted webhook did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The record changed.
    Applied { user_id: UserId, status: SubscriptionStatus },
    /// Already in the state the event describes (redelivery).
    Unchanged { user_id: UserId },
    /// No record holds the subscription id.
    UnknownSubscription { subscription_id: String },
    /// Event type or shape this service does not act on.
    Ignored { event: String },
}

/// Handler for webhook reconciliation.
///
/// The signature is checked over the raw body before anything is parsed.
/// Effects are pure overwrites from the payload, so redelivery is harmless.
/// The gateway's status wins over the local state machine and the last
/// applied event wins.
pub struct ReconcileWebhookHandler {
    store: RecordStore,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn SubscriptionNotifier>,
}

impl ReconcileWebhookHandler {
    pub fn new(
        store: RecordStore,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn SubscriptionNotifier>,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    pub async fn handle(&self, cmd: ReconcileWebhookCommand) -> Result<WebhookOutcome, SubscriptionError> {
        // 1. Signature over raw bytes
        let signature = cmd
            .signature
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SubscriptionError::MissingSignature)?;
        if !self.gateway.verify_webhook_signature(&cmd.raw_body, signature) {
            return Err(SubscriptionError::InvalidSignature);
        }

        // 2. Parse
        let event = GatewayEvent::parse(&cmd.raw_body)?;
        let kind = event.kind();

        let subscription_id = match (&kind, event.subscription_id()) {
            (GatewayEventKind::Unknown(name), _) => {
                tracing::debug!(event = %name, "Ignoring unhandled webhook event");
                return Ok(WebhookOutcome::Ignored { event: event.event.clone() });
            }
            (_, None) => {
                tracing::warn!(event = %event.event, "Webhook without subscription id");
                return Ok(WebhookOutcome::Ignored { event: event.event.clone() });
            }
            (_, Some(id)) => id.to_string(),
        };

        // 3. Locate the record
        let Some(record) = self
            .store
            .repository()
            .find_by_external_subscription_id(&subscription_id)
            .await?
        else {
            tracing::warn!(
                event = %event.event,
                subscription_id = %subscription_id,
                "Webhook for unknown subscription, acknowledging"
            );
            return Ok(WebhookOutcome::UnknownSubscription { subscription_id });
        };
        let user_id = record.user_id;

        if kind == GatewayEventKind::PaymentFailed {
            tracing::warn!(
                user_id = %user_id,
                subscription_id = %subscription_id,
                payment_id = ?event.payment_id(),
                "Gateway reported a failed payment"
            );
            return Ok(WebhookOutcome::Unchanged { user_id });
        }

        // 4. Apply
        let paid_at = event.paid_at();
        let period_end = event.period_end();
        let asserted = kind.asserted_status();
        let mutation = self
            .store
            .update_existing(&user_id, |record, now| {
                if record.external_subscription_id.as_deref() != Some(subscription_id.as_str()) {
                    return Ok(None);
                }
                let previous = record.status;
                match asserted {
                    Some(status) => record.apply_gateway_status(status, now),
                    None => record.apply_charge(paid_at, period_end, now),
                };
                Ok(Some(previous))
            })
            .await?;

        let Some(mutation) = mutation else {
            return Ok(WebhookOutcome::UnknownSubscription { subscription_id });
        };
        let Some(previous) = mutation.value else {
            tracing::warn!(
                user_id = %user_id,
                subscription_id = %subscription_id,
                "Subscription id detached before the event applied"
            );
            return Ok(WebhookOutcome::UnknownSubscription { subscription_id });
        };

        if !mutation.written {
            tracing::debug!(user_id = %user_id, event = %event.event, "Webhook already applied");
            return Ok(WebhookOutcome::Unchanged { user_id });
        }

        let status = mutation.record.status;
        tracing::info!(
            user_id = %user_id,
            event = %event.event,
            subscription_id = %subscription_id,
            from = %previous,
            to = %status,
            "Webhook applied"
        );

        if let Some(notice) = notice_for(&user_id, previous, &mutation.record) {
            deliver(self.notifier.as_ref(), notice).await;
        }

        Ok(WebhookOutcome::Applied { user_id, status })
    }
}

fn notice_for(
    user_id: &UserId,
    previous: SubscriptionStatus,
    record: &SubscriptionRecord,
) -> Option<SubscriptionNotice> {
    if previous == record.status {
        return None;
    }
    let user_id = user_id.clone();
    match record.status {
        SubscriptionStatus::Active => Some(SubscriptionNotice::Activated {
            user_id,
            plan: record.plan,
            ends_at: record.end_date,
        }),
        SubscriptionStatus::Cancelled => Some(SubscriptionNotice::Cancelled { user_id }),
        SubscriptionStatus::Expired => Some(SubscriptionNotice::Expired { user_id }),
        _ => None,
    }
}
