//! Upstream provider fetchers
//!
//! Thin wrappers over the instance inventory API and the telemetry API.
//! No retry, backoff or caching happens here: a failed call is returned
//! to the poll loop as-is.

mod cloudwatch;
mod rds;

pub use cloudwatch::CloudWatchSampleFetcher;
pub use rds::RdsInventoryFetcher;

use crate::models::{InstanceRecord, MetricSample, SampleQuery};
use thiserror::Error;

pub use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unable to describe DB instances: {0}")]
    Inventory(String),
    #[error("unable to get metric data for instance {instance}: {message}")]
    Sample { instance: String, message: String },
    #[error("invalid request: {0}")]
    Request(String),
}

/// Lists the managed database instances in the configured region
#[async_trait]
pub trait InventoryFetcher: Send + Sync {
    /// Fetch every instance, following pagination
    async fn list_instances(&self) -> Result<Vec<InstanceRecord>>;
}

/// Queries recent telemetry for a single instance
#[async_trait]
pub trait SampleFetcher: Send + Sync {
    async fn fetch_sample(&self, instance: &str, query: &SampleQuery) -> Result<MetricSample>;
}
