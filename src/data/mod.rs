//! Data models for a monitoring run.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "1s", "500ms")
//! - [`target`]: Targets to watch ([`MonitorTarget`]) and the namespace range they come from
//! - [`record`]: Per-target state machine ([`ObservationState`]) and its [`TimingRecord`]
//! - [`stats`]: Aggregation of records into a [`RunSummary`]
//! - [`workload`]: Which lifecycle event a run times ([`Workload`])
//!
//! ## Data Flow
//!
//! ```text
//! TargetRange
//!        │
//!        ▼
//! MonitorTarget ──▶ EntityMonitor ──▶ ObservationState
//!                                          │
//!                                          ▼
//!                                    TimingRecord (one per target)
//!                                          │
//!                                          ▼
//!                          RunSummary::from_records()
//! ```

pub mod duration;
pub mod record;
pub mod stats;
pub mod target;
pub mod workload;

pub use record::{Milestone, ObservationState, TimingRecord};
pub use stats::{MetricStats, RunSummary};
pub use target::{MonitorTarget, TargetRange};
pub use workload::Workload;
