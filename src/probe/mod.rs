//! Status probe abstraction for querying VM state.
//!
//! The monitor never talks to the cluster directly. Everything it needs
//! (phase, readiness, address, connectivity) comes through the
//! [`StatusProbe`] trait, so tests can drive the state machine with a
//! scripted implementation and the binary can use [`KubectlProbe`].

mod error;
mod kubectl;

#[cfg(test)]
pub(crate) mod scripted;

pub use error::ProbeError;
pub use kubectl::{KubectlProbe, KubectlProbeBuilder};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::data::MonitorTarget;

/// Coarse lifecycle phase of a VMI as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Scheduling,
    Scheduled,
    Running,
    Succeeded,
    Failed,
    Unknown,
    /// Any phase string this crate does not know about.
    Other(String),
}

impl Phase {
    /// Parse a phase string. Empty input means the phase is not set.
    pub fn parse(s: &str) -> Option<Self> {
        let phase = match s.trim() {
            "" => return None,
            "Pending" => Phase::Pending,
            "Scheduling" => Phase::Scheduling,
            "Scheduled" => Phase::Scheduled,
            "Running" => Phase::Running,
            "Succeeded" => Phase::Succeeded,
            "Failed" => Phase::Failed,
            "Unknown" => Phase::Unknown,
            other => Phase::Other(other.to_string()),
        };
        Some(phase)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Running)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Pending => "Pending",
            Phase::Scheduling => "Scheduling",
            Phase::Scheduled => "Scheduled",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
            Phase::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// Trait for querying the state of monitored targets.
///
/// Every method is called once per target per poll interval, so
/// implementations must be cheap and must never block past their own
/// timeout. `Ok(None)` means the query worked but the value is not set yet;
/// `Err` means the query itself failed. The monitor retries both.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Current lifecycle phase.
    async fn phase(&self, target: &MonitorTarget) -> Result<Option<Phase>, ProbeError>;

    /// Value of the Ready condition.
    async fn readiness(&self, target: &MonitorTarget) -> Result<Option<bool>, ProbeError>;

    /// Current network address. `None` when unassigned.
    async fn address(&self, target: &MonitorTarget) -> Result<Option<String>, ProbeError>;

    /// Whether `address` answers a connectivity probe within `attempt_timeout`.
    async fn probe_connectivity(
        &self,
        address: &str,
        attempt_timeout: Duration,
    ) -> Result<bool, ProbeError>;

    /// State of the target's most recent live migration, if any.
    async fn migration(
        &self,
        _target: &MonitorTarget,
    ) -> Result<Option<MigrationState>, ProbeError> {
        Ok(None)
    }
}

/// Most recent live migration of a VMI (`status.migrationState`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MigrationState {
    #[serde(rename = "migrationUid")]
    pub uid: Option<String>,
    pub completed: bool,
    pub failed: bool,
    pub source_node: Option<String>,
    pub target_node: Option<String>,
}

impl MigrationState {
    /// Parse the JSON object `kubectl` prints for `status.migrationState`.
    /// Empty output means the VMI was never migrated.
    pub fn parse(raw: &str) -> Result<Option<Self>, ProbeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| ProbeError::Parse(format!("migration state: {}", e)))
    }

    /// Finished without error.
    pub fn succeeded(&self) -> bool {
        self.completed && !self.failed
    }

    /// Finished, either way.
    pub fn is_finished(&self) -> bool {
        self.completed || self.failed
    }
}

/// Normalize a raw address value: empty and `<none>` both mean unassigned.
pub fn normalize_address(raw: &str) -> Option<String> {
    match raw.trim() {
        "" | "<none>" => None,
        addr => Some(addr.to_string()),
    }
}

/// Parse a condition status string (`True`/`False`).
pub fn parse_condition(raw: &str) -> Result<Option<bool>, ProbeError> {
    match raw.trim() {
        "" => Ok(None),
        "True" => Ok(Some(true)),
        "False" | "Unknown" => Ok(Some(false)),
        other => Err(ProbeError::Parse(format!(
            "unexpected condition status '{}'",
            other
        ))),
    }
}
