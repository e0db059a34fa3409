use anyhow::Result;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use sawa_api::app::{build_router, AppState};
use sawa_api::config::Config;
use sawa_api::jobs::{CleanupExpiredJob, JobScheduler, PoolMetricsJob, PruneRateLimitsJob};
use sawa_api::middleware::{init_metrics, logging::init_logging};
use sawa_api::services::build_sms_sender;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting Sawa API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    persistence::db::run_migrations(&pool).await?;

    let addr = config.socket_addr()?;
    let shutdown_timeout = Duration::from_secs(config.jobs.shutdown_timeout_secs);
    let sms = build_sms_sender(&config.sms)?;
    let state = AppState::new(config, pool.clone(), sms)?;

    let scheduler = if state.config.jobs.enabled {
        let mut scheduler = JobScheduler::new();
        scheduler.register(CleanupExpiredJob::new(
            pool.clone(),
            state.config.otp.retention_hours,
        ));
        scheduler.register(PoolMetricsJob::new(pool.clone()));
        if let Some(limiter) = &state.otp_limiter {
            scheduler.register(PruneRateLimitsJob::new(limiter.clone()));
        }
        scheduler.start();
        Some(scheduler)
    } else {
        info!("Background jobs disabled");
        None
    };

    let app = build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown();
        scheduler.wait_for_shutdown(shutdown_timeout).await;
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
