//! HTTP handlers for subscription endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::{RequireAdmin, RequireAuth};
use crate::application::handlers::subscription::{
    CancelPendingCommand, CancelPendingHandler, CreateOrderCommand, CreateOrderHandler,
    GetStatusHandler, GetStatusQuery, ReconcileWebhookCommand, ReconcileWebhookHandler,
    RecordStore, StartTrialCommand, StartTrialHandler, SweepOutcome, SweepReport,
    SweepStaleHandler, VerifyPaymentCommand, VerifyPaymentHandler, WebhookOutcome,
};
use crate::domain::foundation::UserId;
use crate::domain::subscription::{SubscriptionError, SubscriptionPolicy};
use crate::ports::{
    Clock, PaymentGateway, SubscriptionNotifier, SubscriptionRepository, UserDirectory,
};

use super::dto::{
    CancelResponse, CreateOrderRequest, ErrorResponse, OrderResponse, StatusResponse,
    SuccessResponse, SweepRequest, SweepResponse, TrialResponse, VerifyPaymentRequest,
    WebhookAck,
};

/// Header carrying the gateway's webhook signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub repository: Arc<dyn SubscriptionRepository>,
    pub directory: Arc<dyn UserDirectory>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn SubscriptionNotifier>,
    pub clock: Arc<dyn Clock>,
    pub policy: SubscriptionPolicy,
}

impl SubscriptionAppState {
    /// Create handlers on demand from the shared state.
    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(
            self.repository.clone(),
            self.directory.clone(),
            self.clock.clone(),
            self.policy.max_cas_retries,
        )
    }

    pub fn start_trial_handler(&self) -> StartTrialHandler {
        StartTrialHandler::new(self.record_store(), self.notifier.clone(), self.policy.clone())
    }

    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(self.record_store(), self.gateway.clone(), self.policy.clone())
    }

    pub fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            self.record_store(),
            self.gateway.clone(),
            self.notifier.clone(),
            self.policy.clone(),
        )
    }

    pub fn webhook_handler(&self) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(
            self.record_store(),
            self.gateway.clone(),
            self.notifier.clone(),
        )
    }

    pub fn sweep_handler(&self) -> SweepStaleHandler {
        SweepStaleHandler::new(self.record_store(), self.notifier.clone(), self.policy.clone())
    }

    pub fn status_handler(&self) -> GetStatusHandler {
        GetStatusHandler::new(self.record_store(), self.sweep_handler(), self.policy.clone())
    }

    pub fn cancel_pending_handler(&self) -> CancelPendingHandler {
        CancelPendingHandler::new(self.record_store())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /subscription/trial - Start the one-time trial
pub async fn start_trial(
    State(state): State<SubscriptionAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.start_trial_handler();
    let result = handler.handle(StartTrialCommand { user_id: user.id }).await?;
    Ok(Json(TrialResponse::from(result)))
}

/// POST /subscription/order - Create or reuse a payment order
pub async fn create_order(
    State(state): State<SubscriptionAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.create_order_handler();
    let cmd = CreateOrderCommand {
        user_id: user.id,
        plan_type: request.plan_type,
    };

    let result = handler.handle(cmd).await?;
    Ok(Json(OrderResponse::from(result)))
}

/// POST /subscription/verify - Verify a completed checkout
pub async fn verify_payment(
    State(state): State<SubscriptionAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.verify_payment_handler();
    let cmd = VerifyPaymentCommand {
        user_id: user.id,
        external_order_id: request.external_order_id,
        external_payment_id: request.external_payment_id,
        signature: request.signature,
        external_subscription_id: request.external_subscription_id,
    };

    handler.handle(cmd).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /subscription/status - Effective status and access for the caller
pub async fn get_status(
    State(state): State<SubscriptionAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.status_handler();
    let result = handler.handle(GetStatusQuery { user_id: user.id }).await?;
    Ok(Json(StatusResponse::from(result)))
}

/// POST /subscription/cancel - Abandon a pending order
pub async fn cancel_pending(
    State(state): State<SubscriptionAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.cancel_pending_handler();
    let result = handler.handle(CancelPendingCommand { user_id: user.id }).await?;
    Ok(Json(CancelResponse {
        status: result.status,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /subscription/sweep - Reclaim stale orders (admin only)
pub async fn sweep(
    State(state): State<SubscriptionAppState>,
    RequireAdmin(admin): RequireAdmin,
    request: Option<Json<SweepRequest>>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.sweep_handler();
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let report = match request.user_id {
        Some(raw) => {
            let user_id = UserId::new(raw).map_err(SubscriptionError::from)?;
            let outcome = handler.sweep_one(&user_id).await?;
            SweepReport {
                reclaimed: usize::from(outcome == SweepOutcome::Reclaimed),
                expired: 0,
            }
        }
        None => handler.run().await?,
    };

    tracing::info!(
        admin_id = %admin.id,
        reclaimed = report.reclaimed,
        expired = report.expired,
        "Manual sweep completed"
    );
    Ok(Json(SweepResponse::from(report)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/payment - Reconcile a gateway event
///
/// Every accepted delivery is acknowledged with 200, including events that
/// were ignored or referenced an unknown subscription. Signature and parse
/// failures are 400.
pub async fn handle_payment_webhook(
    State(state): State<SubscriptionAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let handler = state.webhook_handler();
    let cmd = ReconcileWebhookCommand {
        raw_body: body.to_vec(),
        signature,
    };

    match handler.handle(cmd).await? {
        WebhookOutcome::Applied { user_id, status } => {
            tracing::debug!(user_id = %user_id, status = %status, "Webhook applied");
        }
        WebhookOutcome::Unchanged { user_id } => {
            tracing::debug!(user_id = %user_id, "Webhook was a no-op");
        }
        WebhookOutcome::UnknownSubscription { subscription_id } => {
            tracing::debug!(subscription_id = %subscription_id, "Webhook acknowledged without a record");
        }
        WebhookOutcome::Ignored { event } => {
            tracing::debug!(event = %event, "Webhook ignored");
        }
    }

    Ok((StatusCode::OK, Json(WebhookAck::ok())))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct SubscriptionApiError(pub SubscriptionError);

impl From<SubscriptionError> for SubscriptionApiError {
    fn from(err: SubscriptionError) -> Self {
        SubscriptionApiError(err)
    }
}

impl SubscriptionApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            SubscriptionError::Validation(_)
            | SubscriptionError::InvalidPlan(_)
            | SubscriptionError::AlreadyActive
            | SubscriptionError::OrderPending
            | SubscriptionError::NotEligible(_)
            | SubscriptionError::TrialAlreadyUsed
            | SubscriptionError::MissingSignature
            | SubscriptionError::InvalidSignature
            | SubscriptionError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::UserNotFound(_) => StatusCode::NOT_FOUND,
            SubscriptionError::Conflict => StatusCode::CONFLICT,
            SubscriptionError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            SubscriptionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self.0 {
            SubscriptionError::Infrastructure(detail) => {
                tracing::error!(error = %detail, "Subscription request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let error = ErrorResponse::new(self.0.code(), message);
        (status, Json(error)).into_response()
    }
}
