//! Bounded-concurrency dispatcher for monitor tasks.

use std::collections::HashSet;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error};

use crate::data::{MonitorTarget, TimingRecord};

use super::events::MonitorEvents;

/// Runs one monitor future per target with at most `concurrency` active.
///
/// Every target gets its own task on a [`JoinSet`]; a task only starts its
/// monitor after taking a permit from a semaphore sized to the concurrency
/// bound, so excess targets queue instead of running.
pub struct WorkerPool {
    concurrency: NonZeroUsize,
    events: Arc<dyn MonitorEvents>,
}

impl WorkerPool {
    pub fn new(concurrency: NonZeroUsize, events: Arc<dyn MonitorEvents>) -> Self {
        Self {
            concurrency,
            events,
        }
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }

    /// Run `monitor` for every target and wait for all of them.
    ///
    /// Records are returned in completion order, one per target. A monitor
    /// that panics yields a failed record for its target; the others keep
    /// running.
    pub async fn run<F, Fut>(&self, targets: &[MonitorTarget], monitor: F) -> Vec<TimingRecord>
    where
        F: Fn(MonitorTarget) -> Fut,
        Fut: Future<Output = TimingRecord> + Send + 'static,
    {
        let permits = Arc::new(Semaphore::new(self.concurrency.get()));
        let mut tasks = JoinSet::new();

        for target in targets {
            let permits = permits.clone();
            let events = self.events.clone();
            let target = target.clone();
            let work = monitor(target.clone());

            tasks.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        events.task_failed(&target, "worker pool closed");
                        return TimingRecord::failed(target);
                    }
                };

                debug!(vmi = %target, "Worker slot acquired");

                // Separate task so a panic is contained to this target.
                let mut monitor = AbortOnDrop(tokio::spawn(work));
                match (&mut monitor.0).await {
                    Ok(record) => record,
                    Err(err) => {
                        events.task_failed(&target, &err.to_string());
                        TimingRecord::failed(target)
                    }
                }
            });
        }

        let mut records = Vec::with_capacity(targets.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(err) => error!(error = %err, "Worker task aborted"),
            }
        }

        if records.len() < targets.len() {
            let seen: HashSet<&MonitorTarget> = records.iter().map(|r| &r.target).collect();
            let missing: Vec<MonitorTarget> = targets
                .iter()
                .filter(|t| !seen.contains(t))
                .cloned()
                .collect();
            for target in missing {
                self.events.task_failed(&target, "no result produced");
                records.push(TimingRecord::failed(target));
            }
        }

        records
    }
}

/// Aborts the wrapped task when dropped, so cancelling the pool also stops
/// the monitors it started.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
