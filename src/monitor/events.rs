//! Monitor progress notifications.
//!
//! Monitors report what they see through [`MonitorEvents`] instead of
//! logging directly, so a run can be observed (or recorded in tests)
//! without installing a global subscriber.

use tracing::{debug, error, info, warn};

use crate::data::{Milestone, MonitorTarget, ObservationState, Workload};
use crate::probe::ProbeError;

/// Receiver for progress events emitted by monitors and the worker pool.
///
/// All methods have no-op defaults.
pub trait MonitorEvents: Send + Sync {
    /// A monitor started waiting for the milestone after `state`.
    fn waiting(&self, _target: &MonitorTarget, _workload: Workload, _state: &ObservationState) {}

    /// Target reported Running, Ready and an address.
    fn running(&self, _target: &MonitorTarget, _milestone: &Milestone) {}

    /// A new migration of the target completed and it is Running and Ready.
    fn migrated(&self, _target: &MonitorTarget, _milestone: &Milestone) {}

    /// Target answered a connectivity probe.
    fn reachable(&self, _target: &MonitorTarget, _milestone: &Milestone) {}

    /// A status query or probe failed; the monitor will retry.
    fn transient_failure(&self, _target: &MonitorTarget, _query: &str, _error: &ProbeError) {}

    /// The run deadline passed before the target became reachable.
    fn deadline_exceeded(&self, _target: &MonitorTarget, _state: &ObservationState) {}

    /// A monitor task died without producing a record.
    fn task_failed(&self, _target: &MonitorTarget, _reason: &str) {}
}

/// Default event sink that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl MonitorEvents for TracingEvents {
    fn waiting(&self, target: &MonitorTarget, workload: Workload, state: &ObservationState) {
        match (workload, state) {
            (Workload::Recovery, ObservationState::Unknown) => {
                info!(vmi = %target, "Waiting for VMI to be Running and Ready")
            }
            (Workload::Migration, ObservationState::Unknown) => {
                info!(vmi = %target, "Waiting for VMI migration to complete")
            }
            (_, ObservationState::RunningObserved { .. }) => {
                info!(vmi = %target, "Waiting for VMI to respond to ping")
            }
            (_, ObservationState::Reachable { .. }) => {}
        }
    }

    fn running(&self, target: &MonitorTarget, milestone: &Milestone) {
        info!(
            vmi = %target,
            elapsed_secs = milestone.elapsed_secs,
            address = %milestone.address,
            "VMI Running and Ready after {:.2}s",
            milestone.elapsed_secs
        );
    }

    fn migrated(&self, target: &MonitorTarget, milestone: &Milestone) {
        info!(
            vmi = %target,
            elapsed_secs = milestone.elapsed_secs,
            node = milestone.node.as_deref().unwrap_or("unknown"),
            "VMI migrated after {:.2}s",
            milestone.elapsed_secs
        );
    }

    fn reachable(&self, target: &MonitorTarget, milestone: &Milestone) {
        info!(
            vmi = %target,
            elapsed_secs = milestone.elapsed_secs,
            address = %milestone.address,
            "Ping successful after {:.2}s",
            milestone.elapsed_secs
        );
    }

    fn transient_failure(&self, target: &MonitorTarget, query: &str, error: &ProbeError) {
        debug!(vmi = %target, query, error = %error, "Status query failed, retrying");
    }

    fn deadline_exceeded(&self, target: &MonitorTarget, state: &ObservationState) {
        warn!(vmi = %target, state = state.label(), "Deadline reached before VMI was reachable");
    }

    fn task_failed(&self, target: &MonitorTarget, reason: &str) {
        error!(vmi = %target, reason, "Recovery monitoring failed");
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Event as captured by [`RecordingEvents`].
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Recorded {
        Waiting(String, &'static str),
        Running(String, f64),
        Migrated(String, f64),
        Reachable(String, f64),
        TransientFailure(String, String),
        DeadlineExceeded(String, &'static str),
        TaskFailed(String),
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingEvents {
        events: Mutex<Vec<Recorded>>,
    }

    impl RecordingEvents {
        pub(crate) fn events(&self) -> Vec<Recorded> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: Recorded) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl MonitorEvents for RecordingEvents {
        fn waiting(&self, target: &MonitorTarget, _workload: Workload, state: &ObservationState) {
            self.push(Recorded::Waiting(target.namespace.clone(), state.label()));
        }

        fn running(&self, target: &MonitorTarget, milestone: &Milestone) {
            self.push(Recorded::Running(
                target.namespace.clone(),
                milestone.elapsed_secs,
            ));
        }

        fn migrated(&self, target: &MonitorTarget, milestone: &Milestone) {
            self.push(Recorded::Migrated(
                target.namespace.clone(),
                milestone.elapsed_secs,
            ));
        }

        fn reachable(&self, target: &MonitorTarget, milestone: &Milestone) {
            self.push(Recorded::Reachable(
                target.namespace.clone(),
                milestone.elapsed_secs,
            ));
        }

        fn transient_failure(&self, target: &MonitorTarget, query: &str, _error: &ProbeError) {
            self.push(Recorded::TransientFailure(
                target.namespace.clone(),
                query.to_string(),
            ));
        }

        fn deadline_exceeded(&self, target: &MonitorTarget, state: &ObservationState) {
            self.push(Recorded::DeadlineExceeded(
                target.namespace.clone(),
                state.label(),
            ));
        }

        fn task_failed(&self, target: &MonitorTarget, _reason: &str) {
            self.push(Recorded::TaskFailed(target.namespace.clone()));
        }
    }
}
