//! # virtbench
//!
//! Benchmarking toolkit for measuring how long KubeVirt virtual machines take
//! to recover after a disruption (node failure, restart) or to finish a live
//! migration.
//!
//! For every VM instance in a numbered range of namespaces, a monitor polls
//! the cluster until the instance is running (or, for a [`Workload::Migration`]
//! run, until a new migration has completed) and then until its address
//! answers a ping. Elapsed times are measured from one shared start instant,
//! collected into per-target records and summarized.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          virtbench                           │
//! │  ┌──────────┐    ┌───────────┐    ┌─────────┐    ┌────────┐  │
//! │  │ settings │───▶│  monitor  │───▶│  data   │───▶│ report │  │
//! │  │ (config) │    │(pool/loop)│    │ (stats) │    │        │  │
//! │  └──────────┘    └─────┬─────┘    └─────────┘    └────────┘  │
//! │                        │                                     │
//! │                        ▼                                     │
//! │                   ┌─────────┐                                │
//! │                   │  probe  │◀── KubectlProbe | your own     │
//! │                   └─────────┘                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`monitor`]**: Per-target state machine ([`EntityMonitor`]) and the
//!   bounded [`WorkerPool`] that runs them
//! - **[`probe`]**: The [`StatusProbe`] trait and its `kubectl` implementation
//! - **[`data`]**: Targets, timing records and run statistics
//! - **[`report`]**: Console table, summary and JSON export
//! - **[`settings`]** / **[`logging`]**: Layered configuration and log sinks
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! virtbench recovery --start 1 --end 60 --vm-name rhel-9-vm \
//!     --ssh-pod ssh-test-pod --ssh-pod-ns default --concurrency 20
//!
//! virtbench migration --end 10 --vm-name rhel-9-vm --migration-timeout 10m \
//!     --ssh-pod ssh-test-pod --ssh-pod-ns default --save-results
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//! use virtbench::{
//!     run_monitors, KubectlProbe, MonitorSettings, TargetRange, TracingEvents, Workload,
//! };
//!
//! # tokio_test::block_on(async {
//! let range = TargetRange {
//!     start: 1,
//!     end: 10,
//!     namespace_prefix: "kubevirt-perf-test".to_string(),
//!     vm_name: "rhel-9-vm".to_string(),
//! };
//! let probe = KubectlProbe::builder()
//!     .probe_pod("ssh-test-pod", "default")
//!     .build();
//!
//! let run = run_monitors(
//!     &range.targets(),
//!     NonZeroUsize::new(5).unwrap(),
//!     MonitorSettings::default(),
//!     Arc::new(probe),
//!     Arc::new(TracingEvents),
//! )
//! .await;
//!
//! println!("{}", virtbench::report::render_summary(Workload::Recovery, &run.summary));
//! # });
//! ```

pub mod data;
pub mod logging;
pub mod monitor;
pub mod probe;
pub mod report;
pub mod settings;

// Re-export main types for convenience
pub use data::{
    Milestone, MetricStats, MonitorTarget, ObservationState, RunSummary, TargetRange,
    TimingRecord, Workload,
};
pub use monitor::{
    run_monitors, EntityMonitor, MonitorEvents, MonitorSettings, MonitorRun, RunClock,
    TracingEvents, WorkerPool,
};
pub use probe::{KubectlProbe, MigrationState, Phase, ProbeError, StatusProbe};
pub use settings::{RunConfig, Settings, SettingsError};
