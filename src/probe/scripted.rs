//! Time-scripted probe for driving monitors in tests.
//!
//! Each target follows a script keyed on elapsed time since the probe's
//! origin. Use it under a paused tokio runtime so the timings are exact.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{MigrationState, Phase, ProbeError, StatusProbe};
use crate::data::MonitorTarget;

#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    running_at: Option<Duration>,
    reachable_at: Option<Duration>,
    address: String,
    moved: Option<(Duration, String)>,
    migrated: Option<(Duration, String)>,
    stale_migration: bool,
    failing: bool,
}

impl Script {
    /// Target reports Running/Ready with `address` from `at` onwards.
    pub(crate) fn running_at(mut self, at: Duration, address: &str) -> Self {
        self.running_at = Some(at);
        self.address = address.to_string();
        self
    }

    /// Pings to the current address succeed from `at` onwards.
    pub(crate) fn reachable_at(mut self, at: Duration) -> Self {
        self.reachable_at = Some(at);
        self
    }

    /// Address switches to `address` from `at` onwards.
    pub(crate) fn moved_at(mut self, at: Duration, address: &str) -> Self {
        self.moved = Some((at, address.to_string()));
        self
    }

    /// A new migration to `node` reports success from `at` onwards.
    pub(crate) fn migrated_at(mut self, at: Duration, node: &str) -> Self {
        self.migrated = Some((at, node.to_string()));
        self
    }

    /// An earlier migration has already completed before the run starts.
    pub(crate) fn stale_migration(mut self) -> Self {
        self.stale_migration = true;
        self
    }

    /// Every status query errors.
    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn is_running(&self, elapsed: Duration) -> bool {
        self.running_at.is_some_and(|at| elapsed >= at)
    }

    fn current_address(&self, elapsed: Duration) -> Option<String> {
        if !self.is_running(elapsed) {
            return None;
        }
        match &self.moved {
            Some((at, moved)) if elapsed >= *at => Some(moved.clone()),
            _ => Some(self.address.clone()),
        }
    }

    fn migration_state(&self, elapsed: Duration) -> Option<MigrationState> {
        match &self.migrated {
            Some((at, node)) if elapsed >= *at => Some(MigrationState {
                uid: Some("new-migration".to_string()),
                completed: true,
                failed: false,
                source_node: Some("worker-1".to_string()),
                target_node: Some(node.clone()),
            }),
            _ if self.stale_migration => Some(MigrationState {
                uid: Some("old-migration".to_string()),
                completed: true,
                failed: false,
                source_node: Some("worker-0".to_string()),
                target_node: Some("worker-1".to_string()),
            }),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedProbe {
    origin: Instant,
    scripts: HashMap<String, Script>,
    pub(crate) connectivity_calls: AtomicUsize,
}

impl ScriptedProbe {
    pub(crate) fn new(origin: Instant) -> Self {
        Self {
            origin,
            scripts: HashMap::new(),
            connectivity_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn script(mut self, target: &MonitorTarget, script: Script) -> Self {
        self.scripts.insert(target.namespace.clone(), script);
        self
    }

    fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.origin)
    }

    fn lookup(&self, target: &MonitorTarget) -> Result<Option<&Script>, ProbeError> {
        match self.scripts.get(&target.namespace) {
            Some(script) if script.failing => {
                Err(ProbeError::Parse("scripted failure".to_string()))
            }
            script => Ok(script),
        }
    }
}

#[async_trait]
impl StatusProbe for ScriptedProbe {
    async fn phase(&self, target: &MonitorTarget) -> Result<Option<Phase>, ProbeError> {
        let elapsed = self.elapsed();
        Ok(self.lookup(target)?.map(|s| {
            if s.is_running(elapsed) {
                Phase::Running
            } else {
                Phase::Pending
            }
        }))
    }

    async fn readiness(&self, target: &MonitorTarget) -> Result<Option<bool>, ProbeError> {
        let elapsed = self.elapsed();
        Ok(self.lookup(target)?.map(|s| s.is_running(elapsed)))
    }

    async fn address(&self, target: &MonitorTarget) -> Result<Option<String>, ProbeError> {
        let elapsed = self.elapsed();
        Ok(self
            .lookup(target)?
            .and_then(|s| s.current_address(elapsed)))
    }

    async fn migration(
        &self,
        target: &MonitorTarget,
    ) -> Result<Option<MigrationState>, ProbeError> {
        let elapsed = self.elapsed();
        Ok(self
            .lookup(target)?
            .and_then(|s| s.migration_state(elapsed)))
    }

    async fn probe_connectivity(
        &self,
        address: &str,
        _attempt_timeout: Duration,
    ) -> Result<bool, ProbeError> {
        self.connectivity_calls.fetch_add(1, Ordering::SeqCst);
        let elapsed = self.elapsed();
        Ok(self.scripts.values().any(|s| {
            s.current_address(elapsed).as_deref() == Some(address)
                && s.reachable_at.is_some_and(|at| elapsed >= at)
        }))
    }
}
