//! Which lifecycle event a run measures.

use std::fmt;

use serde::Serialize;

/// The event being timed. Both run through the same monitor and pool; only
/// the first milestone differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    /// VMs come back after a disruption: first milestone is Running + Ready.
    #[default]
    Recovery,
    /// VMs live-migrate to another node: first milestone is a completed
    /// migration with the VMI Running + Ready again.
    Migration,
}

impl Workload {
    pub fn name(&self) -> &'static str {
        match self {
            Workload::Recovery => "recovery",
            Workload::Migration => "migration",
        }
    }

    /// Heading for the summary block.
    pub fn title(&self) -> &'static str {
        match self {
            Workload::Recovery => "Recovery",
            Workload::Migration => "Migration",
        }
    }

    /// Name of the first milestone's metric.
    pub fn milestone_title(&self) -> &'static str {
        match self {
            Workload::Recovery => "Time to Running",
            Workload::Migration => "Time to Migrate",
        }
    }

    pub fn milestone_column(&self) -> &'static str {
        match self {
            Workload::Recovery => "Time to Run(s)",
            Workload::Migration => "Time to Migrate(s)",
        }
    }

    pub fn success_label(&self) -> &'static str {
        match self {
            Workload::Recovery => "Successfully recovered",
            Workload::Migration => "Successfully migrated",
        }
    }

    pub fn failure_label(&self) -> &'static str {
        match self {
            Workload::Recovery => "Failed to recover",
            Workload::Migration => "Failed to migrate",
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
