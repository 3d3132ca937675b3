//! `kubectl`-backed status probe.
//!
//! Reads VMI state with `kubectl get vmi -o jsonpath=...` and checks
//! connectivity by running `ping` inside a helper pod with `kubectl exec`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use virtbench::probe::{KubectlProbe, StatusProbe};
//! use virtbench::MonitorTarget;
//!
//! # tokio_test::block_on(async {
//! let probe = KubectlProbe::builder()
//!     .probe_pod("ssh-test-pod", "default")
//!     .build();
//!
//! let target = MonitorTarget::new("rhel-9-vm", "kubevirt-perf-test-1");
//! let phase = probe.phase(&target).await;
//! println!("{:?}", phase);
//! # });
//! ```

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{normalize_address, parse_condition, MigrationState, Phase, ProbeError, StatusProbe};
use crate::data::MonitorTarget;

const PHASE_PATH: &str = "jsonpath={.status.phase}";
const READY_PATH: &str = r#"jsonpath={.status.conditions[?(@.type=="Ready")].status}"#;
const ADDRESS_PATH: &str = "jsonpath={.status.interfaces[0].ipAddress}";
const MIGRATION_PATH: &str = "jsonpath={.status.migrationState}";

/// Seconds `ping -W` waits for a single reply inside the probe pod.
const PING_WAIT_SECS: u64 = 2;

/// Status probe that shells out to `kubectl`.
#[derive(Debug, Clone)]
pub struct KubectlProbe {
    kubectl: String,
    kubeconfig: Option<PathBuf>,
    probe_pod: String,
    probe_namespace: String,
    command_timeout: Duration,
}

impl KubectlProbe {
    /// Create a new builder for configuring the probe.
    pub fn builder() -> KubectlProbeBuilder {
        KubectlProbeBuilder::default()
    }

    fn get_args(target: &MonitorTarget, jsonpath: &str) -> Vec<String> {
        vec![
            "get".to_string(),
            "vmi".to_string(),
            target.name.clone(),
            "-n".to_string(),
            target.namespace.clone(),
            "-o".to_string(),
            jsonpath.to_string(),
        ]
    }

    fn ping_args(&self, address: &str) -> Vec<String> {
        vec![
            "exec".to_string(),
            "-n".to_string(),
            self.probe_namespace.clone(),
            self.probe_pod.clone(),
            "--".to_string(),
            "ping".to_string(),
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            PING_WAIT_SECS.to_string(),
            address.to_string(),
        ]
    }

    async fn run(&self, args: &[String], timeout: Duration) -> Result<Output, ProbeError> {
        let mut cmd = Command::new(&self.kubectl);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.env("KUBECONFIG", kubeconfig);
        }

        tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| ProbeError::Timeout(timeout))?
            .map_err(|source| ProbeError::Spawn {
                program: self.kubectl.clone(),
                source,
            })
    }

    async fn get(&self, target: &MonitorTarget, jsonpath: &str) -> Result<String, ProbeError> {
        let output = self
            .run(&Self::get_args(target, jsonpath), self.command_timeout)
            .await?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl StatusProbe for KubectlProbe {
    async fn phase(&self, target: &MonitorTarget) -> Result<Option<Phase>, ProbeError> {
        Ok(Phase::parse(&self.get(target, PHASE_PATH).await?))
    }

    async fn readiness(&self, target: &MonitorTarget) -> Result<Option<bool>, ProbeError> {
        parse_condition(&self.get(target, READY_PATH).await?)
    }

    async fn address(&self, target: &MonitorTarget) -> Result<Option<String>, ProbeError> {
        Ok(normalize_address(&self.get(target, ADDRESS_PATH).await?))
    }

    async fn probe_connectivity(
        &self,
        address: &str,
        attempt_timeout: Duration,
    ) -> Result<bool, ProbeError> {
        let output = self.run(&self.ping_args(address), attempt_timeout).await?;
        Ok(output.status.success())
    }

    async fn migration(
        &self,
        target: &MonitorTarget,
    ) -> Result<Option<MigrationState>, ProbeError> {
        MigrationState::parse(&self.get(target, MIGRATION_PATH).await?)
    }
}

/// Builder for KubectlProbe.
#[derive(Debug, Default)]
pub struct KubectlProbeBuilder {
    kubectl: Option<String>,
    kubeconfig: Option<PathBuf>,
    probe_pod: Option<String>,
    probe_namespace: Option<String>,
    command_timeout: Option<Duration>,
}

impl KubectlProbeBuilder {
    /// Set the kubectl binary (default: "kubectl" from PATH).
    pub fn kubectl(mut self, kubectl: impl Into<String>) -> Self {
        self.kubectl = Some(kubectl.into());
        self
    }

    /// Pass `KUBECONFIG` to every kubectl invocation.
    pub fn kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    /// Set the pod (and its namespace) that runs connectivity pings.
    pub fn probe_pod(mut self, pod: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.probe_pod = Some(pod.into());
        self.probe_namespace = Some(namespace.into());
        self
    }

    /// Set the timeout for status queries (default: 10 seconds).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Build the probe.
    pub fn build(self) -> KubectlProbe {
        KubectlProbe {
            kubectl: self.kubectl.unwrap_or_else(|| "kubectl".to_string()),
            kubeconfig: self.kubeconfig,
            probe_pod: self.probe_pod.unwrap_or_else(|| "ssh-test-pod".to_string()),
            probe_namespace: self.probe_namespace.unwrap_or_else(|| "default".to_string()),
            command_timeout: self.command_timeout.unwrap_or(Duration::from_secs(10)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let probe = KubectlProbe::builder().build();
        assert_eq!(probe.kubectl, "kubectl");
        assert_eq!(probe.probe_pod, "ssh-test-pod");
        assert_eq!(probe.probe_namespace, "default");
        assert_eq!(probe.command_timeout, Duration::from_secs(10));
        assert!(probe.kubeconfig.is_none());
    }

    #[test]
    fn test_builder_custom() {
        let probe = KubectlProbe::builder()
            .kubectl("/usr/local/bin/oc")
            .kubeconfig(Some(PathBuf::from("/tmp/kubeconfig")))
            .probe_pod("pinger", "tools")
            .command_timeout(Duration::from_secs(3))
            .build();

        assert_eq!(probe.kubectl, "/usr/local/bin/oc");
        assert_eq!(probe.kubeconfig, Some(PathBuf::from("/tmp/kubeconfig")));
        assert_eq!(probe.probe_pod, "pinger");
        assert_eq!(probe.probe_namespace, "tools");
        assert_eq!(probe.command_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_get_args() {
        let target = MonitorTarget::new("rhel-9-vm", "perf-3");
        let args = KubectlProbe::get_args(&target, PHASE_PATH);
        assert_eq!(
            args,
            vec![
                "get",
                "vmi",
                "rhel-9-vm",
                "-n",
                "perf-3",
                "-o",
                "jsonpath={.status.phase}"
            ]
        );
    }

    #[test]
    fn test_ping_args() {
        let probe = KubectlProbe::builder().probe_pod("pinger", "tools").build();
        let args = probe.ping_args("10.0.0.7");
        assert_eq!(
            args,
            vec![
                "exec", "-n", "tools", "pinger", "--", "ping", "-c", "1", "-W", "2", "10.0.0.7"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let probe = KubectlProbe::builder()
            .kubectl("/nonexistent/path/kubectl")
            .build();
        let target = MonitorTarget::new("vm", "ns-1");

        match probe.phase(&target).await {
            Err(ProbeError::Spawn { program, .. }) => {
                assert_eq!(program, "/nonexistent/path/kubectl")
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
        assert!(matches!(
            probe.migration(&target).await,
            Err(ProbeError::Spawn { .. })
        ));
    }

    #[test]
    fn test_migration_args() {
        let target = MonitorTarget::new("rhel-9-vm", "migration-1");
        let args = KubectlProbe::get_args(&target, MIGRATION_PATH);
        assert_eq!(args.last().map(String::as_str), Some("jsonpath={.status.migrationState}"));
    }
}
