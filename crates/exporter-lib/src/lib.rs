//! Library for the RDS storage exporter
//!
//! This crate provides the core functionality for:
//! - Listing RDS instances and sampling their CloudWatch telemetry
//! - Deriving per-instance storage gauges on a fixed schedule
//! - Serving those gauges for Prometheus scrapes
//! - Health checks and self-observability

pub mod aws;
pub mod health;
pub mod models;
pub mod observability;
pub mod poller;
pub mod provider;
pub mod registry;
pub mod server;

pub use health::{HealthResponse, PollHealth, ReadinessResponse};
pub use models::*;
pub use observability::{ExporterMetrics, StructuredLogger};
pub use registry::MetricRegistry;
