//! HTTP adapters - REST API implementations.
//!
//! `router` assembles the subscription routes with the auth middleware and the
//! tower-http layers for tracing, timeouts and CORS.

pub mod middleware;
pub mod subscription;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use middleware::{auth_middleware, AuthState};
pub use subscription::{subscription_router, SubscriptionAppState};

/// Build the complete application router.
pub fn router(state: SubscriptionAppState, validator: AuthState, server: &ServerConfig) -> Router {
    subscription_router()
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(validator, auth_middleware))
        .layer(cors_layer(server))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
