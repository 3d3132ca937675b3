//! Per-target monitor.
//!
//! Drives one target through `Unknown -> RunningObserved -> Reachable` by
//! polling a [`StatusProbe`], and freezes whatever it reached into a
//! [`TimingRecord`]. For a migration run the first milestone is a newly
//! completed migration rather than plain Running + Ready.

use std::sync::Arc;
use std::time::Duration;

use crate::data::{Milestone, MonitorTarget, ObservationState, TimingRecord, Workload};
use crate::probe::{normalize_address, MigrationState, ProbeError, StatusProbe};

use super::events::MonitorEvents;
use super::{MonitorSettings, RunClock};

/// Watches a single target until it is reachable or the deadline passes.
#[derive(Clone)]
pub struct EntityMonitor {
    probe: Arc<dyn StatusProbe>,
    events: Arc<dyn MonitorEvents>,
    settings: MonitorSettings,
}

impl EntityMonitor {
    pub fn new(
        probe: Arc<dyn StatusProbe>,
        events: Arc<dyn MonitorEvents>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            probe,
            events,
            settings,
        }
    }

    /// Poll `target` until it becomes reachable.
    ///
    /// Probe failures never end the loop; they are reported and retried on
    /// the next tick. Without a deadline in the settings this only returns
    /// once the target is reachable.
    pub async fn run(&self, target: &MonitorTarget, clock: RunClock) -> TimingRecord {
        let baseline = match self.settings.workload {
            Workload::Recovery => None,
            Workload::Migration => self.migration_baseline(target).await,
        };

        let mut state = ObservationState::Unknown;
        self.events.waiting(target, self.settings.workload, &state);

        loop {
            if let Some(next) = self.advance(target, clock, &state, baseline.as_deref()).await {
                state = next;
                if state.is_terminal() {
                    break;
                }
                // Next phase starts right away, no poll wait in between.
                self.events.waiting(target, self.settings.workload, &state);
                continue;
            }

            match self.settings.deadline {
                Some(deadline) => {
                    let elapsed = clock.elapsed();
                    if elapsed >= deadline {
                        self.events.deadline_exceeded(target, &state);
                        break;
                    }
                    tokio::time::sleep(self.settings.poll_interval.min(deadline - elapsed)).await;
                }
                None => tokio::time::sleep(self.settings.poll_interval).await,
            }
        }

        TimingRecord::from_state(target.clone(), state)
    }

    /// One poll. Returns the next state if the target moved forward.
    async fn advance(
        &self,
        target: &MonitorTarget,
        clock: RunClock,
        state: &ObservationState,
        baseline: Option<&str>,
    ) -> Option<ObservationState> {
        match state {
            ObservationState::Unknown => {
                let running = match self.settings.workload {
                    Workload::Recovery => {
                        let address = self.check_running(target).await?;
                        let running = Milestone::new(address, clock.elapsed_secs());
                        self.events.running(target, &running);
                        running
                    }
                    Workload::Migration => {
                        let migrated = self.check_migrated(target, clock, baseline).await?;
                        self.events.migrated(target, &migrated);
                        migrated
                    }
                };
                Some(ObservationState::RunningObserved { running })
            }
            ObservationState::RunningObserved { running } => {
                let address = self.check_reachable(target).await?;
                let reachable = Milestone::new(address, clock.elapsed_secs());
                self.events.reachable(target, &reachable);
                Some(ObservationState::Reachable {
                    running: running.clone(),
                    reachable,
                })
            }
            ObservationState::Reachable { .. } => None,
        }
    }

    /// Address of the target if it is Running, Ready and has an address.
    async fn check_running(&self, target: &MonitorTarget) -> Option<String> {
        let (phase, ready, address) = tokio::join!(
            self.probe.phase(target),
            self.probe.readiness(target),
            self.probe.address(target),
        );

        let phase = self.observed(target, "phase", phase)?;
        let ready = self.observed(target, "readiness", ready)?;
        let address = normalize_address(&self.observed(target, "address", address)?)?;

        (phase.is_running() && ready).then_some(address)
    }

    /// Uid of a migration that had already finished before monitoring began.
    async fn migration_baseline(&self, target: &MonitorTarget) -> Option<String> {
        let result = self.probe.migration(target).await;
        self.observed(target, "migration", result)
            .filter(MigrationState::is_finished)
            .and_then(|state| state.uid)
    }

    /// Milestone for a migration newer than `baseline` that succeeded, once
    /// the target is Running and Ready on its new node.
    async fn check_migrated(
        &self,
        target: &MonitorTarget,
        clock: RunClock,
        baseline: Option<&str>,
    ) -> Option<Milestone> {
        let result = self.probe.migration(target).await;
        let migration = self.observed(target, "migration", result)?;
        if !migration.succeeded() || baseline.is_some_and(|b| migration.uid.as_deref() == Some(b)) {
            return None;
        }

        let address = self.check_running(target).await?;
        Some(Milestone::new(address, clock.elapsed_secs()).on_node(migration.target_node))
    }

    /// Current address of the target if it answers a connectivity probe.
    ///
    /// The address is fetched fresh each time since it can change while the
    /// VM is being rescheduled.
    async fn check_reachable(&self, target: &MonitorTarget) -> Option<String> {
        let address = self.probe.address(target).await;
        let address = normalize_address(&self.observed(target, "address", address)?)?;

        let timeout = self.settings.probe_timeout;
        let result = tokio::time::timeout(timeout, self.probe.probe_connectivity(&address, timeout))
            .await
            .unwrap_or(Err(ProbeError::Timeout(timeout)));

        match result {
            Ok(true) => Some(address),
            Ok(false) => None,
            Err(err) => {
                self.events.transient_failure(target, "connectivity", &err);
                None
            }
        }
    }

    fn observed<T>(
        &self,
        target: &MonitorTarget,
        query: &str,
        result: Result<Option<T>, ProbeError>,
    ) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(err) => {
                self.events.transient_failure(target, query, &err);
                None
            }
        }
    }
}

impl std::fmt::Debug for EntityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMonitor")
            .field("settings", &self.settings)
            .finish()
    }
}
