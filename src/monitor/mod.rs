//! Concurrent VM monitoring.
//!
//! ```text
//!                 ┌──────────────┐
//!  targets ──────▶│  WorkerPool  │  at most C monitors at a time
//!                 └──────┬───────┘
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!   EntityMonitor  EntityMonitor  EntityMonitor ──▶ StatusProbe
//!          │             │             │
//!          └─────────────┼─────────────┘
//!                        ▼
//!              Vec<TimingRecord> ──▶ RunSummary
//! ```
//!
//! All elapsed values in one run are measured from the same [`RunClock`],
//! so they can be compared across targets.

mod entity;
mod events;
mod pool;

pub use entity::EntityMonitor;
pub use events::{MonitorEvents, TracingEvents};
pub use pool::WorkerPool;

#[cfg(test)]
pub(crate) use events::recording;

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::data::{MonitorTarget, RunSummary, TimingRecord, Workload};
use crate::probe::StatusProbe;

/// Shared origin for every elapsed-time measurement in a run.
///
/// Uses tokio's clock so paused-time tests measure virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    origin: Instant,
}

impl RunClock {
    /// Start the clock now.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.origin)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Timing knobs for a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Wait between status checks.
    pub poll_interval: Duration,
    /// Upper bound for a single connectivity probe.
    pub probe_timeout: Duration,
    /// Give up on a target once this much time has passed since run start.
    /// `None` waits indefinitely.
    pub deadline: Option<Duration>,
    /// Event being timed.
    pub workload: Workload,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(5),
            deadline: None,
            workload: Workload::Recovery,
        }
    }
}

/// Outcome of a whole monitoring run.
#[derive(Debug, Clone)]
pub struct MonitorRun {
    /// One record per target, in completion order.
    pub records: Vec<TimingRecord>,
    pub summary: RunSummary,
    pub wall_clock: Duration,
}

/// Monitor every target until its workload's milestones are reached and
/// summarize the timings.
///
/// The run clock starts right before dispatch, so every elapsed value is
/// measured from the moment this is called.
pub async fn run_monitors(
    targets: &[MonitorTarget],
    concurrency: NonZeroUsize,
    settings: MonitorSettings,
    probe: Arc<dyn StatusProbe>,
    events: Arc<dyn MonitorEvents>,
) -> MonitorRun {
    let monitor = EntityMonitor::new(probe, events.clone(), settings);
    let pool = WorkerPool::new(concurrency, events);

    info!(
        targets = targets.len(),
        concurrency = concurrency.get(),
        workload = %settings.workload,
        "Monitoring {} VMIs",
        targets.len()
    );

    let clock = RunClock::start();
    let records = pool
        .run(targets, |target| {
            let monitor = monitor.clone();
            async move { monitor.run(&target, clock).await }
        })
        .await;
    let wall_clock = clock.elapsed();

    info!(
        elapsed_secs = wall_clock.as_secs_f64(),
        "All VMIs monitored. Total elapsed time: {:.2}s",
        wall_clock.as_secs_f64()
    );

    let summary = RunSummary::from_records(&records);
    MonitorRun {
        records,
        summary,
        wall_clock,
    }
}
