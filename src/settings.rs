//! Layered run configuration.
//!
//! Values are resolved in this order, later sources winning:
//!
//! 1. built-in defaults, with per-workload defaults on top
//! 2. an optional config file (`--config`, TOML/YAML/JSON by extension)
//! 3. `VIRTBENCH_*` environment variables
//! 4. explicit command-line flags
//!
//! ```toml
//! vm_name = "rhel-9-vm"
//! namespace_prefix = "kubevirt-perf-test"
//! start = 1
//! end = 60
//! concurrency = 20
//! poll_interval = "2s"
//! ssh_pod = "ssh-test-pod"
//! ssh_pod_ns = "default"
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::data::duration::parse_duration;
use crate::data::{TargetRange, Workload};
use crate::monitor::MonitorSettings;

const ENV_PREFIX: &str = "VIRTBENCH";

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("--start must be >= 1 (got {0})")]
    InvalidStart(u32),

    #[error("--end must be >= --start (got start={start}, end={end})")]
    InvalidRange { start: u32, end: u32 },

    #[error("--concurrency must be >= 1")]
    InvalidConcurrency,

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Raw settings as read from all sources.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub start: u32,
    pub end: u32,
    pub vm_name: Option<String>,
    pub namespace_prefix: String,
    pub concurrency: usize,
    pub poll_interval: String,
    pub probe_timeout: String,
    pub deadline: Option<String>,
    pub ssh_pod: Option<String>,
    pub ssh_pod_ns: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub save_results: bool,
    pub results_folder: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start: 1,
            end: 5,
            vm_name: None,
            namespace_prefix: "kubevirt-perf-test".to_string(),
            concurrency: 10,
            poll_interval: "1s".to_string(),
            probe_timeout: "5s".to_string(),
            deadline: None,
            ssh_pod: None,
            ssh_pod_ns: None,
            kubeconfig: None,
            log_level: "info".to_string(),
            log_file: None,
            export: None,
            save_results: false,
            results_folder: PathBuf::from("results"),
        }
    }
}

/// Defaults that differ from [`Settings::default`] for a workload.
fn workload_defaults(workload: Workload) -> &'static [(&'static str, &'static str)] {
    match workload {
        Workload::Recovery => &[],
        Workload::Migration => &[
            ("namespace_prefix", "migration"),
            ("end", "10"),
            ("poll_interval", "5s"),
            ("deadline", "600s"),
        ],
    }
}

/// Validated settings for a monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub range: TargetRange,
    pub concurrency: NonZeroUsize,
    pub monitor: MonitorSettings,
    pub ssh_pod: String,
    pub ssh_pod_ns: String,
    pub kubeconfig: Option<PathBuf>,
    pub export: Option<PathBuf>,
    /// Run folder parent when results should be saved.
    pub results_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from defaults, an optional file, the environment and
    /// command-line overrides (`None` overrides are skipped).
    pub fn load<I>(
        workload: Workload,
        config_file: Option<&Path>,
        overrides: I,
    ) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (&'static str, Option<String>)>,
    {
        Self::load_with_prefix(workload, config_file, ENV_PREFIX, overrides)
    }

    fn load_with_prefix<I>(
        workload: Workload,
        config_file: Option<&Path>,
        env_prefix: &str,
        overrides: I,
    ) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (&'static str, Option<String>)>,
    {
        let mut builder = Config::builder();
        for (key, value) in workload_defaults(workload) {
            builder = builder.set_default(*key, *value)?;
        }
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix(env_prefix));
        for (key, value) in overrides {
            builder = builder.set_override_option(key, value)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Check the settings and turn them into a runnable configuration.
    pub fn run_config(&self, workload: Workload) -> Result<RunConfig, SettingsError> {
        if self.start < 1 {
            return Err(SettingsError::InvalidStart(self.start));
        }
        if self.end < self.start {
            return Err(SettingsError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        let concurrency =
            NonZeroUsize::new(self.concurrency).ok_or(SettingsError::InvalidConcurrency)?;

        let vm_name = required(&self.vm_name, "vm_name")?;
        let ssh_pod = required(&self.ssh_pod, "ssh_pod")?;
        let ssh_pod_ns = required(&self.ssh_pod_ns, "ssh_pod_ns")?;

        let poll_interval = positive_duration("poll_interval", &self.poll_interval)?;
        let probe_timeout = positive_duration("probe_timeout", &self.probe_timeout)?;
        let deadline = self
            .deadline
            .as_deref()
            .map(|d| duration("deadline", d))
            .transpose()?;

        Ok(RunConfig {
            range: TargetRange {
                start: self.start,
                end: self.end,
                namespace_prefix: self.namespace_prefix.clone(),
                vm_name,
            },
            concurrency,
            monitor: MonitorSettings {
                poll_interval,
                probe_timeout,
                deadline,
                workload,
            },
            ssh_pod,
            ssh_pod_ns,
            kubeconfig: self.kubeconfig.clone(),
            export: self.export.clone(),
            results_dir: self
                .save_results
                .then(|| self.results_folder.clone()),
        })
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, SettingsError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(SettingsError::Missing(field))
}

fn duration(field: &'static str, value: &str) -> Result<Duration, SettingsError> {
    parse_duration(value).map_err(|e| SettingsError::InvalidDuration {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn positive_duration(field: &'static str, value: &str) -> Result<Duration, SettingsError> {
    let parsed = duration(field, value)?;
    if parsed.is_zero() {
        return Err(SettingsError::InvalidDuration {
            field,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}
