//! Integration tests for subscription HTTP endpoints.
//!
//! These tests drive the full axum router (auth middleware included) with
//! `tower::ServiceExt::oneshot`:
//! 1. Session handling (401 / 403)
//! 2. Status codes and error bodies per failure
//! 3. Response shapes for the happy paths
//! 4. The unauthenticated webhook route

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use coursegate::adapters::auth::SessionClaims;
use coursegate::adapters::http::{router, SubscriptionAppState, AuthState};
use coursegate::adapters::{
    InMemorySubscriptionRepository, InMemoryUserDirectory, JwtSessionValidator,
    MockPaymentGateway, MockSessionValidator, RecordingNotifier,
};
use coursegate::config::ServerConfig;
use coursegate::domain::foundation::{Role, Timestamp, UserId};
use coursegate::domain::subscription::{
    PlanType, SubscriptionPolicy, SubscriptionRecord, SubscriptionStatus,
};
use coursegate::ports::FixedClock;

// =============================================================================
// Test Infrastructure
// =============================================================================

const MEMBER_TOKEN: &str = "member-token";
const ADMIN_TOKEN: &str = "admin-token";
const STRANGER_TOKEN: &str = "stranger-token";

fn t0() -> Timestamp {
    Timestamp::from_unix_secs(1_705_312_800).unwrap()
}

fn carol() -> UserId {
    UserId::new("carol").unwrap()
}

struct TestApp {
    app: Router,
    repo: InMemorySubscriptionRepository,
    gateway: MockPaymentGateway,
}

fn state(repo: &InMemorySubscriptionRepository, directory: InMemoryUserDirectory, gateway: &MockPaymentGateway) -> SubscriptionAppState {
    SubscriptionAppState {
        repository: Arc::new(repo.clone()),
        directory: Arc::new(directory),
        gateway: Arc::new(gateway.clone()),
        notifier: Arc::new(RecordingNotifier::new()),
        clock: Arc::new(FixedClock::new(t0())),
        policy: SubscriptionPolicy::default(),
    }
}

async fn test_app_with(validator: AuthState) -> TestApp {
    let repo = InMemorySubscriptionRepository::new();
    let directory = InMemoryUserDirectory::new();
    directory.add_user(&carol()).await;
    let gateway = MockPaymentGateway::new();

    let app = router(state(&repo, directory, &gateway), validator, &ServerConfig::default());
    TestApp { app, repo, gateway }
}

async fn test_app() -> TestApp {
    let validator = MockSessionValidator::new()
        .with_member(MEMBER_TOKEN, "carol")
        .with_member(STRANGER_TOKEN, "stranger")
        .with_admin(ADMIN_TOKEN, "ops");
    test_app_with(Arc::new(validator)).await
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn missing_session_is_unauthorized() {
    let t = test_app().await;
    let (status, body) = send(&t.app, get("/subscription/status", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let t = test_app().await;
    let (status, _) = send(&t.app, get("/subscription/status", Some("nope"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sweep_requires_admin_role() {
    let t = test_app().await;
    let (status, body) = send(&t.app, post("/subscription/sweep", Some(MEMBER_TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = send(&t.app, post("/subscription/sweep", Some(ADMIN_TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reclaimed": 0, "expired": 0 }));
}

#[tokio::test]
async fn real_jwt_sessions_are_accepted() {
    let secret = "integration-test-secret-0123456789";
    let validator = JwtSessionValidator::new(SecretString::new(secret.to_string()), None);
    let t = test_app_with(Arc::new(validator)).await;

    let claims = SessionClaims {
        sub: "carol".to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iss: None,
        email: Some("carol@example.com".to_string()),
        role: Role::Member,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    let (status, body) = send(&t.app, get("/subscription/status", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "none");
}

// =============================================================================
// User Endpoints
// =============================================================================

#[tokio::test]
async fn status_for_new_user_is_none() {
    let t = test_app().await;
    let (status, body) = send(&t.app, get("/subscription/status", Some(MEMBER_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "none", "hasAccess": false }));
}

#[tokio::test]
async fn trial_then_second_trial_is_bad_request() {
    let t = test_app().await;
    let (status, body) = send(&t.app, post("/subscription/trial", Some(MEMBER_TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daysLeft"], 14);
    assert!(body["trialEndDate"].is_string());

    let (status, body) = send(&t.app, post("/subscription/trial", Some(MEMBER_TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "TRIAL_ALREADY_USED");

    let (_, body) = send(&t.app, get("/subscription/status", Some(MEMBER_TOKEN))).await;
    assert_eq!(body["status"], "trial");
    assert_eq!(body["hasAccess"], true);
    assert_eq!(body["trialInfo"]["isActive"], true);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let t = test_app().await;
    let (status, body) = send(&t.app, post("/subscription/trial", Some(STRANGER_TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn order_verify_and_cancel_flow() {
    let t = test_app().await;

    let (status, order) = send(
        &t.app,
        post("/subscription/order", Some(MEMBER_TOKEN), json!({ "planType": "monthly" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["amount"], 49_900);
    assert_eq!(order["currency"], "INR");
    let order_id = order["orderId"].as_str().unwrap().to_string();

    let (status, body) = send(
        &t.app,
        post("/subscription/order", Some(MEMBER_TOKEN), json!({ "planType": "yearly" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORDER_PENDING");

    let (status, body) = send(
        &t.app,
        post(
            "/subscription/verify",
            Some(MEMBER_TOKEN),
            json!({
                "externalOrderId": order_id,
                "externalPaymentId": "pay_1",
                "signature": t.gateway.sign_payment(&order_id, "pay_1"),
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    // cancel on an active record is a no-op that reports the status
    let (status, body) = send(&t.app, post("/subscription/cancel", Some(MEMBER_TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "active" }));

    let (_, body) = send(&t.app, get("/subscription/status", Some(MEMBER_TOKEN))).await;
    assert_eq!(body["status"], "active");
    assert_eq!(body["subscriptionInfo"]["plan"], "monthly");
}

#[tokio::test]
async fn invalid_plan_and_bad_signature_are_bad_request() {
    let t = test_app().await;
    let (status, body) = send(
        &t.app,
        post("/subscription/order", Some(MEMBER_TOKEN), json!({ "planType": "weekly" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PLAN");

    let (status, body) = send(
        &t.app,
        post(
            "/subscription/verify",
            Some(MEMBER_TOKEN),
            json!({ "externalOrderId": "order_x", "externalPaymentId": "pay_x", "signature": "00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn gateway_outage_is_bad_gateway() {
    let t = test_app().await;
    t.gateway
        .set_method_error("create_order", coursegate::ports::PaymentError::timeout("slow"));

    let (status, body) = send(
        &t.app,
        post("/subscription/order", Some(MEMBER_TOKEN), json!({ "planType": "monthly" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "GATEWAY_ERROR");
    assert_eq!(t.repo.get(&carol()).await.unwrap().status, SubscriptionStatus::None);
}

#[tokio::test]
async fn exhausted_retries_are_conflict() {
    let t = test_app().await;
    send(&t.app, get("/subscription/status", Some(MEMBER_TOKEN))).await;
    t.repo.force_cas_conflicts(10);

    let (status, body) = send(&t.app, post("/subscription/trial", Some(MEMBER_TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONCURRENT_MODIFICATION");
}

// =============================================================================
// Admin Endpoints
// =============================================================================

#[tokio::test]
async fn targeted_sweep_reclaims_one_user() {
    let t = test_app().await;
    let mut record = SubscriptionRecord::new(carol(), t0().add_minutes(-45));
    record.status = SubscriptionStatus::Pending;
    record.plan = Some(PlanType::Monthly);
    record.amount = Some(49_900);
    record.external_order_id = Some("order_old".to_string());
    t.repo.put(record).await;

    let (status, body) = send(
        &t.app,
        post("/subscription/sweep", Some(ADMIN_TOKEN), json!({ "userId": "carol" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reclaimed": 1, "expired": 0 }));
    assert_eq!(t.repo.get(&carol()).await.unwrap().status, SubscriptionStatus::None);
}

// =============================================================================
// Webhook Endpoint
// =============================================================================

fn webhook(body: &Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/payment")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("X-Signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn webhook_for_unknown_subscription_is_acknowledged() {
    let t = test_app().await;
    let body = json!({
        "event": "subscription.charged",
        "payload": { "subscription": { "entity": { "id": "sub_ghost" } } }
    });
    let signature = t.gateway.sign_webhook(body.to_string().as_bytes());

    let (status, response) = send(&t.app, webhook(&body, Some(signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "status": "ok" }));
    assert!(t.repo.is_empty().await);
}

#[tokio::test]
async fn webhook_signature_failures_are_bad_request() {
    let t = test_app().await;
    let body = json!({ "event": "subscription.cancelled" });

    let (status, response) = send(&t.app, webhook(&body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "MISSING_SIGNATURE");

    let (status, response) = send(&t.app, webhook(&body, Some("deadbeef".to_string()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "INVALID_SIGNATURE");
}
