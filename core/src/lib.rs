//! Portgate Core Library
//!
//! Blocking establishment of local port forwards to cluster resources.
//! Provides functionality to:
//! - Spawn `kubectl port-forward` with a child-scoped credential file
//! - Block until the forwarded local port accepts TCP connections
//! - Keep credential files alive until host-process shutdown
//! - Persist named forward definitions
//!
//! # Contract
//! A gate call either returns a local port that is confirmed connectable, or
//! one of four specific failures: the credential file could not be written,
//! the forwarding executable could not start, the forwarding process died
//! before the port opened, or the polling deadline elapsed. There are no
//! opaque hangs: every failure mode is bounded by an immediate abort or the
//! polling deadline.
//!
//! The spawned forwarding process is intentionally left running after the
//! call returns; it is a long-lived tunnel the rest of the run depends on.

pub mod error;
pub mod forward;

// Re-export commonly used types
pub use error::{Error, Result};
pub use forward::{
    CleanupRegistry, CredentialMaterial, ForwardProfile, ForwardRequest, ForwardSession,
    ForwardTarget, GateError, GateOptions, PortForwardGate, Probe, ProfileStore, RemotePort,
    ResourceKind, TcpProbe,
};
