//! Repeating poll schedule
//!
//! Runs a [`CycleRunner`] immediately and then again one interval after
//! each cycle ends, until the shutdown channel fires or its sender is dropped.

use super::CycleRunner;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Default time between poll cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub struct Scheduler {
    runner: CycleRunner,
    interval: Duration,
}

impl Scheduler {
    pub fn new(runner: CycleRunner, interval: Duration) -> Self {
        Self { runner, interval }
    }

    pub fn with_default_interval(runner: CycleRunner) -> Self {
        Self::new(runner, DEFAULT_POLL_INTERVAL)
    }

    /// Loop until shutdown
    ///
    /// A cycle in progress is finished before shutdown is observed. The
    /// wait is measured from the end of a cycle, so a slow cycle never
    /// shortens the gap before the next one.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting metrics poll loop"
        );

        loop {
            // Already logged and counted by the runner
            if let Err(e) = self.runner.run_once().await {
                debug!(error = %e, "Retrying at the next interval");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => {
                    info!("Shutting down metrics poll loop");
                    break;
                }
            }
        }
    }
}
