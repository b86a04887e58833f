//! Error types for port-forward establishment.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

/// Terminal failures of a port-forward gate call.
///
/// None of these are retried internally; the only tolerated condition during
/// polling is "connection refused", which is the expected steady state before
/// the forward is ready.
#[derive(Error, Debug)]
pub enum GateError {
    /// The credential file could not be written (disk/permissions).
    #[error("failed to write credential file: {source}")]
    ResourceUnavailable {
        #[source]
        source: std::io::Error,
    },

    /// The forwarding executable could not be started.
    #[error("failed to launch forwarding process: {reason}")]
    LaunchFailure { reason: String },

    /// The forwarding process terminated before the local port became reachable.
    #[error("port forward process exited unexpectedly (exit code {exit_code:?})")]
    ProcessExitedEarly { exit_code: Option<i32> },

    /// The polling deadline elapsed while the process stayed alive.
    #[error("timed out after {waited:?} waiting for port forward to be established")]
    Timeout { waited: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GateError::ProcessExitedEarly { exit_code: Some(1) };
        assert!(err.to_string().contains("exited unexpectedly"));

        let err = GateError::Timeout {
            waited: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("timed out"));
    }
}
