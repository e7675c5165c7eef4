//! Core data models for the exporter

use std::time::Duration;

/// A managed database instance as reported by the inventory API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub identifier: String,
    /// Provisioned storage in gigabytes
    pub allocated_storage_gb: i32,
    /// Auto-scaling ceiling in gigabytes, absent when auto-scaling is disabled
    pub max_allocated_storage_gb: Option<i32>,
}

impl InstanceRecord {
    pub fn new(
        identifier: impl Into<String>,
        allocated_storage_gb: i32,
        max_allocated_storage_gb: Option<i32>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            allocated_storage_gb,
            max_allocated_storage_gb,
        }
    }
}

/// Result of a telemetry query for one instance over the trailing window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSample {
    pub instance: String,
    pub datapoints: Vec<f64>,
}

impl MetricSample {
    pub fn has_data(&self) -> bool {
        !self.datapoints.is_empty()
    }
}

/// Parameters of the per-instance telemetry query
#[derive(Debug, Clone, PartialEq)]
pub struct SampleQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimension_name: String,
    /// Trailing window ending at query time
    pub lookback: Duration,
    /// Statistical bucket width
    pub period: Duration,
    pub statistic: String,
}

impl Default for SampleQuery {
    fn default() -> Self {
        Self {
            namespace: "AWS/RDS".to_string(),
            metric_name: "FreeStorageSpace".to_string(),
            dimension_name: "DBInstanceIdentifier".to_string(),
            lookback: Duration::from_secs(3 * 60 * 60),
            period: Duration::from_secs(60 * 60),
            statistic: "Average".to_string(),
        }
    }
}

/// Outcome of a single poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Instances returned by the inventory fetch
    pub instances: usize,
    /// Instances whose gauges were written
    pub updated: usize,
    /// Instances skipped because the sample had no data points
    pub empty: usize,
    /// Instances skipped because the sample fetch failed
    pub failed: usize,
}
