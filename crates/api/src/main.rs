use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use flashy_api::app::{create_app, AppState};
use flashy_api::config::Config;
use flashy_api::jobs::{
    ExpireOffersJob, JobScheduler, PoolMetricsJob, RateLimitCleanupJob, UrgentAlertsJob,
};
use flashy_api::middleware::{init_metrics, logging::init_logging};
use persistence::repositories::OfferRepository;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to initialize metrics")?;

    info!("Starting Flashy API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let addr = config.socket_addr()?;
    let jobs = config.jobs.clone();
    let state = AppState::new(config, pool.clone()).context("Invalid identity configuration")?;

    let mut scheduler = JobScheduler::new();
    if jobs.enabled {
        scheduler.register(ExpireOffersJob::new(
            OfferRepository::new(pool.clone()),
            state.clock.clone(),
            Duration::from_secs(jobs.expire_offers_interval_secs),
        ));
        scheduler.register(UrgentAlertsJob::new(
            state.feed.clone(),
            state.alerts.clone(),
            state.clock.clone(),
            jobs.urgency_window_minutes,
            Duration::from_secs(jobs.urgent_alerts_interval_secs),
        ));
        if let Some(limiter) = &state.rate_limiter {
            scheduler.register(RateLimitCleanupJob::new(
                limiter.clone(),
                Duration::from_secs(jobs.rate_limit_cleanup_interval_secs),
            ));
        }
        scheduler.register(PoolMetricsJob::new(
            pool,
            Duration::from_secs(jobs.pool_metrics_interval_secs),
        ));
        scheduler.start();
    }

    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
