//! Observability infrastructure for the exporter
//!
//! Provides:
//! - Self-monitoring Prometheus metrics (cycle duration, error counts, freshness)
//! - Structured JSON logging of lifecycle events with tracing

use anyhow::Result;
use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use tracing::{error, info};

/// Histogram buckets for cycle duration (in seconds)
const CYCLE_DURATION_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Exporter self-monitoring metrics
///
/// Registered into the same registry as the storage gauges so a single
/// scrape returns both. Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ExporterMetrics {
    cycle_duration_seconds: Histogram,
    cycles_total: IntCounter,
    inventory_errors_total: IntCounter,
    sample_errors_total: IntCounter,
    instances_discovered: IntGauge,
    last_success_timestamp_seconds: Gauge,
}

impl ExporterMetrics {
    /// Create the metrics and register them with `registry`
    pub fn register(registry: &Registry) -> Result<Self> {
        let metrics = Self {
            cycle_duration_seconds: Histogram::with_opts(
                HistogramOpts::new(
                    "rds_exporter_cycle_duration_seconds",
                    "Time spent on one inventory and telemetry poll cycle",
                )
                .buckets(CYCLE_DURATION_BUCKETS.to_vec()),
            )?,
            cycles_total: IntCounter::new(
                "rds_exporter_cycles_total",
                "Total number of poll cycles run, including aborted ones",
            )?,
            inventory_errors_total: IntCounter::new(
                "rds_exporter_inventory_errors_total",
                "Total number of failed instance inventory fetches",
            )?,
            sample_errors_total: IntCounter::new(
                "rds_exporter_sample_errors_total",
                "Total number of failed per-instance telemetry fetches",
            )?,
            instances_discovered: IntGauge::new(
                "rds_exporter_instances_discovered",
                "Number of instances returned by the last successful inventory fetch",
            )?,
            last_success_timestamp_seconds: Gauge::new(
                "rds_exporter_last_success_timestamp_seconds",
                "Unix time of the last cycle with a successful inventory fetch",
            )?,
        };

        registry.register(Box::new(metrics.cycle_duration_seconds.clone()))?;
        registry.register(Box::new(metrics.cycles_total.clone()))?;
        registry.register(Box::new(metrics.inventory_errors_total.clone()))?;
        registry.register(Box::new(metrics.sample_errors_total.clone()))?;
        registry.register(Box::new(metrics.instances_discovered.clone()))?;
        registry.register(Box::new(metrics.last_success_timestamp_seconds.clone()))?;

        Ok(metrics)
    }

    /// Record a finished cycle and its duration
    pub fn observe_cycle(&self, duration_secs: f64) {
        self.cycles_total.inc();
        self.cycle_duration_seconds.observe(duration_secs);
    }

    pub fn inc_inventory_errors(&self) {
        self.inventory_errors_total.inc();
    }

    pub fn inc_sample_errors(&self) {
        self.sample_errors_total.inc();
    }

    /// Record a successful inventory fetch
    pub fn record_inventory_success(&self, instances: usize, timestamp: i64) {
        self.instances_discovered.set(instances as i64);
        self.last_success_timestamp_seconds.set(timestamp as f64);
    }

    pub fn cycles_total(&self) -> u64 {
        self.cycles_total.get()
    }

    pub fn inventory_errors_total(&self) -> u64 {
        self.inventory_errors_total.get()
    }

    pub fn sample_errors_total(&self) -> u64 {
        self.sample_errors_total.get()
    }
}

/// Structured logger for exporter lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    region: String,
}

impl StructuredLogger {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    /// Log exporter startup
    pub fn log_startup(&self, version: &str, listen_port: u16, poll_interval_secs: u64) {
        info!(
            event = "exporter_started",
            region = %self.region,
            exporter_version = %version,
            listen_port = listen_port,
            poll_interval_secs = poll_interval_secs,
            "RDS storage exporter started"
        );
    }

    /// Log exporter shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "exporter_shutdown",
            region = %self.region,
            reason = %reason,
            "RDS storage exporter shutting down"
        );
    }

    /// Log a completed cycle
    pub fn log_cycle_completed(
        &self,
        instances: usize,
        updated: usize,
        empty: usize,
        failed: usize,
        elapsed_ms: u128,
    ) {
        info!(
            event = "cycle_completed",
            region = %self.region,
            instances = instances,
            updated = updated,
            empty = empty,
            failed = failed,
            elapsed_ms = elapsed_ms,
            "Metrics updated successfully"
        );
    }

    /// Log a cycle abandoned because the inventory fetch failed
    pub fn log_cycle_aborted(&self, reason: &str) {
        error!(
            event = "cycle_aborted",
            region = %self.region,
            reason = %reason,
            "Unable to describe DB instances, skipping this cycle"
        );
    }
}
