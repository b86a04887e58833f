//! The port-forward readiness gate.
//!
//! Coordinates credential materialization, process launch, and TCP polling
//! into a single blocking call that returns a connectable local port or a
//! specific failure. The spawned forwarding process is intentionally left
//! running after the call returns; it is the tunnel the rest of the run
//! depends on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::credentials::{materialize_credentials, CleanupRegistry};
use super::errors::GateError;
use super::launcher::{KubectlLauncher, Launcher};
use super::models::{ForwardRequest, ForwardSession};
use super::probe::{Probe, TcpProbe};

/// Default interval between connectivity attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default total time allowed for the port to become connectable.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Time source and sleeper for the polling loop.
///
/// Injectable so tests run deterministically without wall-clock waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Policy knobs for a gate.
#[derive(Debug, Clone)]
pub struct GateOptions {
    /// Sleep between connectivity attempts.
    pub poll_interval: Duration,

    /// Deadline measured from the start of polling, so credential writing
    /// and process launch do not eat into the connectivity budget.
    pub deadline: Duration,

    /// Plan-only mode: requests with `skip_on_dry_run` short-circuit without
    /// spawning anything.
    pub dry_run: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
            dry_run: false,
        }
    }
}

/// Blocking port-forward establishment.
///
/// Each `establish` call is independent: the gate does not deduplicate or
/// reuse forwards across calls. Concurrent calls for different local ports
/// are safe; two calls for the same local port will race two subprocesses,
/// which callers must coordinate themselves.
pub struct PortForwardGate {
    launcher: Box<dyn Launcher>,
    probe: Box<dyn Probe>,
    clock: Box<dyn Clock>,
    registry: Arc<CleanupRegistry>,
    options: GateOptions,

    /// Sessions established by this gate, retained for the rest of the run.
    sessions: Mutex<Vec<ForwardSession>>,
}

impl PortForwardGate {
    /// Creates a gate with the real kubectl launcher, TCP probe, and clock.
    pub fn new(registry: Arc<CleanupRegistry>) -> Self {
        Self::with_parts(
            Box::new(KubectlLauncher::new()),
            Box::new(TcpProbe::new()),
            Box::new(SystemClock),
            registry,
            GateOptions::default(),
        )
    }

    /// Creates a gate with custom collaborators.
    pub fn with_parts(
        launcher: Box<dyn Launcher>,
        probe: Box<dyn Probe>,
        clock: Box<dyn Clock>,
        registry: Arc<CleanupRegistry>,
        options: GateOptions,
    ) -> Self {
        Self {
            launcher,
            probe,
            clock,
            registry,
            options,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_options(mut self, options: GateOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the cleanup registry this gate registers credential files in.
    pub fn registry(&self) -> &Arc<CleanupRegistry> {
        &self.registry
    }

    /// Number of live sessions established by this gate.
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Establishes a port forward, blocking until the local port accepts TCP
    /// connections or a deadline elapses.
    ///
    /// Returns the local port from the request so callers can hand it
    /// straight to a client constructor. The credential file written along
    /// the way outlives this call; it is deleted only when the host drains
    /// the cleanup registry at shutdown.
    pub fn establish(&self, request: ForwardRequest) -> Result<u16, GateError> {
        if request.skip_on_dry_run && self.options.dry_run {
            debug!(port = request.local_port, "dry run, skipping port forward");
            return Ok(request.local_port);
        }

        if request.local_port == 0 {
            return Err(GateError::LaunchFailure {
                reason: "local port must be in 1..=65535".to_string(),
            });
        }

        let credential_path =
            materialize_credentials(request.credential_material.as_bytes(), &self.registry)?;

        let mut process = self.launcher.launch(&request, &credential_path)?;

        // A forward against a missing resource usually dies within the first
        // few milliseconds; surface that instead of polling into the timeout.
        if !process.is_running() {
            warn!(
                target = %request.target.resource_arg(),
                "port forward process exited immediately"
            );
            return Err(GateError::ProcessExitedEarly {
                exit_code: process.exit_code(),
            });
        }

        let started = self.clock.now();
        loop {
            if !process.is_running() {
                warn!(
                    target = %request.target.resource_arg(),
                    "port forward process exited during polling"
                );
                return Err(GateError::ProcessExitedEarly {
                    exit_code: process.exit_code(),
                });
            }

            if self.probe.is_ready(request.local_port) {
                break;
            }

            let waited = self.clock.now() - started;
            if waited >= self.options.deadline {
                return Err(GateError::Timeout { waited });
            }
            self.clock.sleep(self.options.poll_interval);
        }

        info!(
            port = request.local_port,
            target = %request.target.resource_arg(),
            "port forward established"
        );

        self.sessions.lock().push(ForwardSession::new(
            process,
            credential_path,
            Instant::now(),
        ));

        Ok(request.local_port)
    }
}
