//! Per-target observation state and the timing record it produces.

use serde::Serialize;

use super::target::MonitorTarget;

/// A milestone reached by a target: the address seen and seconds since run start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub address: String,
    pub elapsed_secs: f64,
    /// Node the VMI was on, when known (set for migrations).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl Milestone {
    pub fn new(address: impl Into<String>, elapsed_secs: f64) -> Self {
        Self {
            address: address.into(),
            elapsed_secs,
            node: None,
        }
    }

    pub fn on_node(mut self, node: Option<String>) -> Self {
        self.node = node;
        self
    }
}

/// Progress of a monitored target.
///
/// Transitions only move forward: `Unknown -> RunningObserved -> Reachable`.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationState {
    /// Nothing usable observed yet.
    Unknown,
    /// Phase is Running, Ready is True and an address is assigned.
    RunningObserved { running: Milestone },
    /// A connectivity probe against the current address succeeded.
    Reachable {
        running: Milestone,
        reachable: Milestone,
    },
}

impl ObservationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ObservationState::Reachable { .. })
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            ObservationState::Unknown => "unknown",
            ObservationState::RunningObserved { .. } => "running",
            ObservationState::Reachable { .. } => "reachable",
        }
    }
}

/// Final timings for one target.
///
/// Built once when the target's monitor finishes. A missing milestone means
/// the target never reached it during the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingRecord {
    pub target: MonitorTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<Milestone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable: Option<Milestone>,
}

impl TimingRecord {
    /// Record for a target whose monitor produced nothing usable.
    pub fn failed(target: MonitorTarget) -> Self {
        Self {
            target,
            running: None,
            reachable: None,
        }
    }

    /// Freeze the final observation state of a target into its record.
    pub fn from_state(target: MonitorTarget, state: ObservationState) -> Self {
        match state {
            ObservationState::Unknown => Self::failed(target),
            ObservationState::RunningObserved { running } => Self {
                target,
                running: Some(running),
                reachable: None,
            },
            ObservationState::Reachable { running, reachable } => Self {
                target,
                running: Some(running),
                reachable: Some(reachable),
            },
        }
    }

    pub fn time_to_running(&self) -> Option<f64> {
        self.running.as_ref().map(|m| m.elapsed_secs)
    }

    pub fn time_to_reachable(&self) -> Option<f64> {
        self.reachable.as_ref().map(|m| m.elapsed_secs)
    }

    pub fn address_at_running(&self) -> Option<&str> {
        self.running.as_ref().map(|m| m.address.as_str())
    }

    pub fn address_at_reachable(&self) -> Option<&str> {
        self.reachable.as_ref().map(|m| m.address.as_str())
    }

    /// Node recorded with the first milestone (the migration target node).
    pub fn node_at_running(&self) -> Option<&str> {
        self.running.as_ref().and_then(|m| m.node.as_deref())
    }

    /// A target succeeded when it became reachable.
    pub fn succeeded(&self) -> bool {
        self.reachable.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> MonitorTarget {
        MonitorTarget::new("vm", "ns-1")
    }

    #[test]
    fn test_from_unknown_is_failed() {
        let record = TimingRecord::from_state(target(), ObservationState::Unknown);
        assert_eq!(record, TimingRecord::failed(target()));
        assert!(!record.succeeded());
        assert!(record.time_to_running().is_none());
    }

    #[test]
    fn test_from_running_keeps_first_milestone() {
        let state = ObservationState::RunningObserved {
            running: Milestone::new("10.0.0.5", 1.5),
        };
        let record = TimingRecord::from_state(target(), state);
        assert_eq!(record.time_to_running(), Some(1.5));
        assert_eq!(record.address_at_running(), Some("10.0.0.5"));
        assert!(record.time_to_reachable().is_none());
        assert!(!record.succeeded());
    }

    #[test]
    fn test_from_reachable_preserves_differing_addresses() {
        let state = ObservationState::Reachable {
            running: Milestone::new("10.0.0.5", 2.0),
            reachable: Milestone::new("10.0.0.9", 3.0),
        };
        let record = TimingRecord::from_state(target(), state);
        assert!(record.succeeded());
        assert_eq!(record.address_at_running(), Some("10.0.0.5"));
        assert_eq!(record.address_at_reachable(), Some("10.0.0.9"));
    }

    #[test]
    fn test_only_reachable_is_terminal() {
        assert!(!ObservationState::Unknown.is_terminal());
        let running = Milestone::new("a", 1.0);
        assert!(!ObservationState::RunningObserved {
            running: running.clone()
        }
        .is_terminal());
        assert!(ObservationState::Reachable {
            running: running.clone(),
            reachable: running,
        }
        .is_terminal());
    }

    #[test]
    fn test_node_is_kept_with_first_milestone() {
        let state = ObservationState::RunningObserved {
            running: Milestone::new("10.0.0.5", 4.0).on_node(Some("worker-2".to_string())),
        };
        let record = TimingRecord::from_state(target(), state);
        assert_eq!(record.node_at_running(), Some("worker-2"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["running"]["node"], "worker-2");
        assert!(TimingRecord::failed(target()).node_at_running().is_none());
    }

    #[test]
    fn test_serialize_omits_missing_milestones() {
        let json = serde_json::to_value(TimingRecord::failed(target())).unwrap();
        assert!(json.get("running").is_none());
        assert!(json.get("reachable").is_none());
        assert_eq!(json["target"]["namespace"], "ns-1");
    }
}
