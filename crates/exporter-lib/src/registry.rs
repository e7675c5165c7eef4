//! Storage gauge registry
//!
//! Owns a Prometheus registry and the two per-instance storage gauges.
//! The registry is cloned into both the poll loop and the scrape server;
//! clones share the same underlying series.
//!
//! Series are never removed. An instance that disappears from the
//! inventory keeps its last published values until the process restarts.

use anyhow::Result;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

pub const CURRENT_USAGE_METRIC: &str = "rds_current_usage_gigabytes";
pub const MAX_ALLOCATED_STORAGE_METRIC: &str = "rds_max_allocated_storage_gigabytes";

const INSTANCE_LABEL: &str = "instance";

/// Thread-safe set of storage gauges keyed by instance identifier
#[derive(Clone)]
pub struct MetricRegistry {
    registry: Registry,
    current_usage: GaugeVec,
    max_allocated_storage: GaugeVec,
}

impl MetricRegistry {
    /// Create a registry with both storage gauges registered
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let max_allocated_storage = GaugeVec::new(
            Opts::new(
                MAX_ALLOCATED_STORAGE_METRIC,
                "Maximum storage (in gigabytes) that RDS instance can auto-scale to.",
            ),
            &[INSTANCE_LABEL],
        )?;
        // Reports allocated storage, not consumed storage. The name is kept
        // for compatibility with existing dashboards.
        let current_usage = GaugeVec::new(
            Opts::new(
                CURRENT_USAGE_METRIC,
                "Current storage usage of the RDS instance in gigabytes.",
            ),
            &[INSTANCE_LABEL],
        )?;

        registry.register(Box::new(max_allocated_storage.clone()))?;
        registry.register(Box::new(current_usage.clone()))?;

        Ok(Self {
            registry,
            current_usage,
            max_allocated_storage,
        })
    }

    /// Underlying Prometheus registry, for registering additional collectors
    pub fn prometheus(&self) -> &Registry {
        &self.registry
    }

    pub fn set_current_usage(&self, instance: &str, gigabytes: f64) {
        self.current_usage
            .with_label_values(&[instance])
            .set(gigabytes);
    }

    pub fn set_max_allocated_storage(&self, instance: &str, gigabytes: f64) {
        self.max_allocated_storage
            .with_label_values(&[instance])
            .set(gigabytes);
    }

    /// Last published current usage for an instance, if any
    pub fn current_usage(&self, instance: &str) -> Option<f64> {
        self.lookup(CURRENT_USAGE_METRIC, instance)
    }

    /// Last published max allocated storage for an instance, if any
    pub fn max_allocated_storage(&self, instance: &str) -> Option<f64> {
        self.lookup(MAX_ALLOCATED_STORAGE_METRIC, instance)
    }

    /// Render every registered family in the text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder.encode(&metric_families, &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }

    /// Read a series without creating it
    fn lookup(&self, metric: &str, instance: &str) -> Option<f64> {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == metric)
            .flat_map(|family| family.get_metric().iter())
            .find(|m| {
                m.get_label()
                    .iter()
                    .any(|l| l.get_name() == INSTANCE_LABEL && l.get_value() == instance)
            })
            .map(|m| m.get_gauge().get_value())
    }
}
