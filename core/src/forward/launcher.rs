//! Launching the external forwarding process.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::errors::GateError;
use super::models::ForwardRequest;

/// Well-known locations to search for kubectl before falling back to PATH.
const KUBECTL_PATHS: &[&str] = &[
    "/opt/homebrew/bin/kubectl", // Apple Silicon
    "/usr/local/bin/kubectl",    // Intel Mac / Homebrew
    "/usr/bin/kubectl",          // System
];

/// Environment variable pointing the child at its credential file.
///
/// Set on the child only; the host process environment is not touched.
const CREDENTIAL_ENV_VAR: &str = "KUBECONFIG";

/// Non-blocking handle to a spawned forwarding process.
pub trait ForwardProcess: Send {
    /// OS process id.
    fn pid(&self) -> u32;

    /// True if the process has not terminated. Does not block.
    fn is_running(&mut self) -> bool;

    /// Exit code once terminated, if the OS reported one.
    fn exit_code(&mut self) -> Option<i32>;
}

/// Starts the external forwarding program for a request.
pub trait Launcher: Send + Sync {
    fn launch(
        &self,
        request: &ForwardRequest,
        credential_path: &Path,
    ) -> Result<Box<dyn ForwardProcess>, GateError>;
}

/// A spawned kubectl child process.
struct KubectlProcess {
    child: Child,
}

impl ForwardProcess for KubectlProcess {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn exit_code(&mut self) -> Option<i32> {
        match self.child.try_wait() {
            // code() is None when the child was killed by a signal.
            Ok(Some(status)) => status.code(),
            _ => None,
        }
    }
}

/// Launches `kubectl port-forward` with a child-scoped KUBECONFIG.
pub struct KubectlLauncher {
    kubectl_path: PathBuf,
}

impl KubectlLauncher {
    /// Creates a launcher, searching well-known paths for kubectl and
    /// falling back to PATH lookup.
    pub fn new() -> Self {
        let kubectl_path = KUBECTL_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .unwrap_or_else(|| PathBuf::from("kubectl"));
        Self { kubectl_path }
    }

    /// Creates a launcher with a custom kubectl path.
    pub fn with_path(kubectl_path: PathBuf) -> Self {
        Self { kubectl_path }
    }

    /// Returns the kubectl path this launcher will invoke.
    pub fn kubectl_path(&self) -> &Path {
        &self.kubectl_path
    }

    /// Builds the kubectl argument vector for a request.
    fn build_args(request: &ForwardRequest) -> Vec<String> {
        vec![
            "--namespace".to_string(),
            request.target.namespace.clone(),
            "port-forward".to_string(),
            request.target.resource_arg(),
            request.target.port_mapping(request.local_port),
        ]
    }
}

impl Launcher for KubectlLauncher {
    fn launch(
        &self,
        request: &ForwardRequest,
        credential_path: &Path,
    ) -> Result<Box<dyn ForwardProcess>, GateError> {
        let args = Self::build_args(request);
        debug!(kubectl = %self.kubectl_path.display(), ?args, "starting port forward process");

        let mut command = Command::new(&self.kubectl_path);
        command.args(&args).env(CREDENTIAL_ENV_VAR, credential_path);
        if request.silent {
            command.stdout(Stdio::null());
        }
        // stderr stays inherited so forward failures remain visible.

        let child = command.spawn().map_err(|e| GateError::LaunchFailure {
            reason: format!("failed to start {}: {}", self.kubectl_path.display(), e),
        })?;

        Ok(Box::new(KubectlProcess { child }))
    }
}

impl Default for KubectlLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::models::{ForwardRequest, ForwardTarget, ResourceKind};

    fn request() -> ForwardRequest {
        let target = ForwardTarget::new("immich", ResourceKind::Service, "postgresql", 5432u16);
        ForwardRequest::new(15432, target, "kubeconfig")
    }

    #[test]
    fn test_build_args() {
        let args = KubectlLauncher::build_args(&request());
        assert_eq!(
            args,
            vec![
                "--namespace",
                "immich",
                "port-forward",
                "service/postgresql",
                "15432:5432",
            ]
        );
    }

    #[test]
    fn test_missing_binary_is_launch_failure() {
        let launcher = KubectlLauncher::with_path(PathBuf::from("/nonexistent/kubectl"));
        let result = launcher.launch(&request(), Path::new("/tmp/kubeconfig"));
        assert!(matches!(result, Err(GateError::LaunchFailure { .. })));
    }

    #[test]
    fn test_spawned_child_is_observable() {
        // `sleep` stands in for the forwarding program.
        let mut process = KubectlProcess {
            child: Command::new("sleep").arg("30").spawn().unwrap(),
        };
        assert!(process.is_running());
        assert!(process.pid() > 0);
        assert_eq!(process.exit_code(), None);

        process.child.kill().unwrap();
        let _ = process.child.wait();
        assert!(!process.is_running());
    }
}
