//! Error types for status probes.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while querying a target's status.
///
/// The monitor treats every variant as transient: it logs and polls again.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe command could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe command ran but exited unsuccessfully.
    #[error("Command failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },

    /// The probe did not answer within its timeout.
    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    /// The response could not be interpreted.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}
