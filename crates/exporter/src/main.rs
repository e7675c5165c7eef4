//! RDS storage exporter
//!
//! Polls the RDS inventory and CloudWatch on a fixed interval and serves
//! per-instance storage gauges for Prometheus on `/metrics`.

use anyhow::Result;
use exporter_lib::{
    aws,
    health::PollHealth,
    observability::{ExporterMetrics, StructuredLogger},
    poller::{CycleRunnerBuilder, Scheduler},
    provider::{CloudWatchSampleFetcher, RdsInventoryFetcher},
    server::{self, AppState},
    MetricRegistry,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting application");

    if let Err(e) = run().await {
        error!(error = %e, "Exporter terminated");
        return Err(e);
    }

    Ok(())
}

async fn run() -> Result<()> {
    let config = config::AppConfig::load()?;

    // Credentials are resolved eagerly so a bad environment fails here
    let sdk_config = aws::load_sdk_config(&config.aws).await?;
    info!(region = %config.aws.region, "AWS configuration loaded");

    // Inventory is reported stale after three missed cycles
    let health = PollHealth::new(3 * config.exporter.poll_interval());

    let registry = MetricRegistry::new()?;
    let metrics = ExporterMetrics::register(registry.prometheus())?;

    let logger = StructuredLogger::new(&config.aws.region);
    logger.log_startup(
        EXPORTER_VERSION,
        config.exporter.listen_port,
        config.exporter.poll_interval_secs,
    );

    let runner = CycleRunnerBuilder::new()
        .inventory(Arc::new(RdsInventoryFetcher::new(&sdk_config)))
        .sampler(Arc::new(CloudWatchSampleFetcher::new(&sdk_config)))
        .registry(registry.clone())
        .metrics(metrics)
        .health(health.clone())
        .logger(logger.clone())
        .build()?;
    let scheduler = Scheduler::new(runner, config.exporter.poll_interval());

    // Bind before polling starts so a port conflict fails fast
    let listener = server::bind(config.exporter.listen_port).await?;
    let app_state = Arc::new(AppState::new(health.clone(), registry));
    let mut server_handle = tokio::spawn(server::serve_on(listener, app_state));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let poller_handle = tokio::spawn(scheduler.run(shutdown_rx));

    // The poll task ending is reported through health; the server keeps
    // serving the last published values.
    let poller_health = health.clone();
    tokio::spawn(async move {
        let message = match poller_handle.await {
            Ok(()) => return,
            Err(e) => format!("poll task failed: {e}"),
        };
        error!(error = %message, "Metrics poll loop stopped");
        poller_health.record_poller_failure(message).await;
    });

    tokio::select! {
        result = &mut server_handle => {
            let _ = shutdown_tx.send(());
            match result {
                Ok(Ok(())) => anyhow::bail!("scrape server exited unexpectedly"),
                Ok(Err(e)) => Err(e.context("scrape server failed")),
                Err(e) => Err(anyhow::anyhow!("scrape server task failed: {e}")),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            let _ = shutdown_tx.send(());
            info!("Shutting down");
            Ok(())
        }
    }
}
