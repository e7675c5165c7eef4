//! A single inventory and telemetry pass
//!
//! Lists the instances, fetches a sample for each one and writes the
//! derived gauges. An inventory failure aborts the pass; a sample failure
//! only skips that instance.

use crate::health::PollHealth;
use crate::models::{CycleReport, InstanceRecord, SampleQuery};
use crate::observability::{ExporterMetrics, StructuredLogger};
use crate::provider::{FetchError, InventoryFetcher, SampleFetcher};
use crate::registry::MetricRegistry;
use anyhow::Result;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Runs one poll cycle at a time against the configured fetchers
pub struct CycleRunner {
    inventory: Arc<dyn InventoryFetcher>,
    sampler: Arc<dyn SampleFetcher>,
    registry: MetricRegistry,
    metrics: ExporterMetrics,
    health: PollHealth,
    logger: StructuredLogger,
    query: SampleQuery,
}

impl CycleRunner {
    pub fn new(
        inventory: Arc<dyn InventoryFetcher>,
        sampler: Arc<dyn SampleFetcher>,
        registry: MetricRegistry,
        metrics: ExporterMetrics,
        health: PollHealth,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            inventory,
            sampler,
            registry,
            metrics,
            health,
            logger,
            query: SampleQuery::default(),
        }
    }

    /// Run one cycle
    ///
    /// Returns the inventory error when the cycle was aborted. Gauges for
    /// instances that were skipped keep their previous values.
    pub async fn run_once(&self) -> std::result::Result<CycleReport, FetchError> {
        info!("Updating metrics");
        let start = Instant::now();

        let result = self.poll().await;

        let elapsed = start.elapsed();
        self.metrics.observe_cycle(elapsed.as_secs_f64());

        match &result {
            Ok(report) => self.logger.log_cycle_completed(
                report.instances,
                report.updated,
                report.empty,
                report.failed,
                elapsed.as_millis(),
            ),
            Err(e) => self.logger.log_cycle_aborted(&e.to_string()),
        }

        result
    }

    async fn poll(&self) -> std::result::Result<CycleReport, FetchError> {
        let instances = match self.inventory.list_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                self.metrics.inc_inventory_errors();
                self.health.record_inventory_failure(e.to_string()).await;
                return Err(e);
            }
        };

        self.metrics
            .record_inventory_success(instances.len(), chrono::Utc::now().timestamp());

        let mut report = CycleReport {
            instances: instances.len(),
            ..CycleReport::default()
        };

        for instance in &instances {
            match self
                .sampler
                .fetch_sample(&instance.identifier, &self.query)
                .await
            {
                Ok(sample) if sample.has_data() => {
                    self.publish(instance);
                    report.updated += 1;
                }
                Ok(_) => {
                    info!(instance = %instance.identifier, "No metric data found for instance");
                    report.empty += 1;
                }
                Err(e) => {
                    warn!(instance = %instance.identifier, error = %e, "Skipping instance");
                    self.metrics.inc_sample_errors();
                    report.failed += 1;
                }
            }
        }

        self.health.record_cycle(&report).await;

        Ok(report)
    }

    /// Write the gauges for an instance that returned data
    fn publish(&self, instance: &InstanceRecord) {
        // Current usage reports the allocated size; the sample only gates
        // whether the instance is published at all.
        self.registry.set_current_usage(
            &instance.identifier,
            f64::from(instance.allocated_storage_gb),
        );

        if let Some(max) = instance.max_allocated_storage_gb {
            self.registry
                .set_max_allocated_storage(&instance.identifier, f64::from(max));
        }

        debug!(
            instance = %instance.identifier,
            allocated_gb = instance.allocated_storage_gb,
            max_allocated_gb = ?instance.max_allocated_storage_gb,
            "Published storage gauges"
        );
    }
}

/// Builder for a [`CycleRunner`]
pub struct CycleRunnerBuilder {
    inventory: Option<Arc<dyn InventoryFetcher>>,
    sampler: Option<Arc<dyn SampleFetcher>>,
    registry: Option<MetricRegistry>,
    metrics: Option<ExporterMetrics>,
    health: Option<PollHealth>,
    logger: Option<StructuredLogger>,
}

impl CycleRunnerBuilder {
    pub fn new() -> Self {
        Self {
            inventory: None,
            sampler: None,
            registry: None,
            metrics: None,
            health: None,
            logger: None,
        }
    }

    pub fn inventory(mut self, inventory: Arc<dyn InventoryFetcher>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn sampler(mut self, sampler: Arc<dyn SampleFetcher>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn registry(mut self, registry: MetricRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Self-monitoring metrics; registered into the gauge registry when unset
    pub fn metrics(mut self, metrics: ExporterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Poll outcome shared with the server; a private one is used when unset
    pub fn health(mut self, health: PollHealth) -> Self {
        self.health = Some(health);
        self
    }

    /// Lifecycle logger, which carries the region the exporter was configured for
    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<CycleRunner> {
        let inventory = self
            .inventory
            .ok_or_else(|| anyhow::anyhow!("Inventory fetcher is required"))?;
        let sampler = self
            .sampler
            .ok_or_else(|| anyhow::anyhow!("Sample fetcher is required"))?;
        let registry = self
            .registry
            .ok_or_else(|| anyhow::anyhow!("Registry is required"))?;
        let logger = self
            .logger
            .ok_or_else(|| anyhow::anyhow!("Logger is required"))?;
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => ExporterMetrics::register(registry.prometheus())?,
        };
        let health = self
            .health
            .unwrap_or_else(|| PollHealth::new(3 * super::DEFAULT_POLL_INTERVAL));

        Ok(CycleRunner::new(
            inventory,
            sampler,
            registry,
            metrics,
            health,
            logger,
        ))
    }
}

impl Default for CycleRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
