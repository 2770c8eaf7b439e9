//! Axum router configuration for subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_pending, create_order, get_status, handle_payment_webhook, start_trial, sweep,
    verify_payment, SubscriptionAppState,
};

/// Create the subscription API router.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `POST /trial` - Start the one-time trial
/// - `POST /order` - Create or reuse a payment order
/// - `POST /verify` - Verify a completed checkout
/// - `GET /status` - Effective status and access
/// - `POST /cancel` - Abandon a pending order
///
/// ## Admin Endpoints (require admin role)
/// - `POST /sweep` - Reclaim stale orders and expire lapsed windows
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        // User endpoints
        .route("/trial", post(start_trial))
        .route("/order", post(create_order))
        .route("/verify", post(verify_payment))
        .route("/status", get(get_status))
        .route("/cancel", post(cancel_pending))
        // Admin endpoints
        .route("/sweep", post(sweep))
}

/// Create the payment webhook router.
///
/// Webhooks carry no user session; they are verified via signature.
pub fn webhook_routes() -> Router<SubscriptionAppState> {
    Router::new().route("/payment", post(handle_payment_webhook))
}

/// Create the complete subscription module router, mounted at
/// `/subscription` and `/webhooks`.
pub fn subscription_router() -> Router<SubscriptionAppState> {
    Router::new()
        .nest("/subscription", subscription_routes())
        .nest("/webhooks", webhook_routes())
}
