//! Liveness and readiness derived from poll loop outcomes
//!
//! The poll loop records what each cycle did; `/healthz` and `/readyz`
//! are computed from that record on demand. Nothing here affects the
//! published gauges, which keep their last values regardless of health.

use crate::models::CycleReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const INVENTORY: &str = "inventory";
pub const TELEMETRY: &str = "telemetry";
pub const POLLER: &str = "poller";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Healthy,
    /// Upstream calls are failing or stale; last known values are still served
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Check {
    fn ok() -> Self {
        Self {
            status: Status::Healthy,
            message: None,
        }
    }

    fn with(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_timestamp: Option<i64>,
    pub components: BTreeMap<&'static str, Check>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct PollState {
    /// Unix time of the last cycle whose inventory fetch succeeded
    last_success: Option<i64>,
    /// Cleared by the next successful inventory fetch
    inventory_error: Option<String>,
    last_report: Option<CycleReport>,
    poller_failure: Option<String>,
}

/// Poll loop outcome shared between the cycle runner and the HTTP server
#[derive(Debug, Clone)]
pub struct PollHealth {
    state: Arc<RwLock<PollState>>,
    stale_after: Duration,
}

impl PollHealth {
    /// `stale_after` is how long without a successful inventory fetch
    /// before the inventory check degrades
    pub fn new(stale_after: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(PollState::default())),
            stale_after,
        }
    }

    pub async fn record_cycle(&self, report: &CycleReport) {
        let mut state = self.state.write().await;
        state.last_success = Some(chrono::Utc::now().timestamp());
        state.inventory_error = None;
        state.last_report = Some(report.clone());
    }

    pub async fn record_inventory_failure(&self, error: impl Into<String>) {
        self.state.write().await.inventory_error = Some(error.into());
    }

    pub async fn record_poller_failure(&self, message: impl Into<String>) {
        self.state.write().await.poller_failure = Some(message.into());
    }

    pub async fn health(&self) -> HealthResponse {
        self.health_at(chrono::Utc::now().timestamp()).await
    }

    async fn health_at(&self, now: i64) -> HealthResponse {
        let state = self.state.read().await;

        let inventory = match (&state.inventory_error, state.last_success) {
            (Some(error), _) => Check::with(Status::Degraded, error.clone()),
            (None, Some(at)) if now - at > self.stale_after.as_secs() as i64 => Check::with(
                Status::Degraded,
                format!("last successful inventory fetch {}s ago", now - at),
            ),
            _ => Check::ok(),
        };

        let telemetry = match &state.last_report {
            Some(report) if report.failed > 0 => Check::with(
                Status::Degraded,
                format!(
                    "{} of {} sample fetches failed",
                    report.failed, report.instances
                ),
            ),
            _ => Check::ok(),
        };

        let poller = match &state.poller_failure {
            Some(message) => Check::with(Status::Unhealthy, message.clone()),
            None => Check::ok(),
        };

        let components = BTreeMap::from([
            (INVENTORY, inventory),
            (TELEMETRY, telemetry),
            (POLLER, poller),
        ]);
        let status = components
            .values()
            .map(|check| check.status)
            .max()
            .unwrap_or(Status::Healthy);

        HealthResponse {
            status,
            last_success_timestamp: state.last_success,
            components,
        }
    }

    /// Ready once a cycle has completed and the poll task is alive
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;

        let reason = if let Some(message) = &state.poller_failure {
            Some(message.clone())
        } else if state.last_success.is_none() {
            Some("No successful inventory fetch yet".to_string())
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }
}
