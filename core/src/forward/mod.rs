//! Port-forward establishment.
//!
//! This module provides:
//! - A TCP connectivity probe for forwarded local ports
//! - Transient credential files with process-exit cleanup
//! - Launching of the external forwarding process (kubectl)
//! - The blocking readiness gate tying the above together
//! - Persistence of named forward profiles

pub mod credentials;
pub mod errors;
pub mod gate;
pub mod launcher;
pub mod models;
pub mod probe;
pub mod profile_store;

// Re-export commonly used types
pub use credentials::{materialize_credentials, CleanupRegistry};
pub use errors::GateError;
pub use gate::{Clock, GateOptions, PortForwardGate, SystemClock};
pub use launcher::{ForwardProcess, KubectlLauncher, Launcher};
pub use models::{
    CredentialMaterial, ForwardProfile, ForwardProfiles, ForwardRequest, ForwardSession,
    ForwardTarget, RemotePort, ResourceKind,
};
pub use probe::{Probe, TcpProbe};
pub use profile_store::ProfileStore;
