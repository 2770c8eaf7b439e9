//! coursegate server binary.
//!
//! Loads configuration, connects to PostgreSQL, starts the background sweeper
//! and serves the subscription API.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use coursegate::adapters::http::{router, SubscriptionAppState};
use coursegate::adapters::{
    JwtSessionValidator, LogNotifier, PostgresSubscriptionRepository, PostgresUserDirectory,
    RazorpayConfig, RazorpayGateway,
};
use coursegate::config::AppConfig;
use coursegate::ports::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!(url = %config.database.redacted_url(), "Database pool established");

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let gateway = RazorpayGateway::new(RazorpayConfig::from_settings(&config.payment))?;
    tracing::info!(test_mode = config.payment.is_test_mode(), "Payment gateway configured");

    let state = SubscriptionAppState {
        repository: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        directory: Arc::new(PostgresUserDirectory::new(pool)),
        gateway: Arc::new(gateway),
        notifier: Arc::new(LogNotifier::new()),
        clock: Arc::new(SystemClock),
        policy: config.subscription_policy(),
    };

    spawn_sweeper(state.clone(), config.subscription.sweep_interval());

    let validator = Arc::new(JwtSessionValidator::from_config(&config.auth));
    let app = router(state, validator, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "coursegate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Periodically reclaims stale pending orders and expires lapsed windows.
fn spawn_sweeper(state: SubscriptionAppState, every: std::time::Duration) {
    tokio::spawn(async move {
        let sweeper = state.sweep_handler();
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sweeper.run().await {
                Ok(report) if report.reclaimed + report.expired > 0 => {
                    tracing::info!(
                        reclaimed = report.reclaimed,
                        expired = report.expired,
                        "Background sweep completed"
                    );
                }
                Ok(_) => tracing::debug!("Background sweep found nothing"),
                Err(e) => tracing::warn!(error = %e, "Background sweep failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
