//! Data models for port-forward targets, requests, profiles, and sessions.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::launcher::ForwardProcess;

// ============================================================================
// Targets
// ============================================================================

/// Kind of cluster resource a forward can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Deployment,
    Pod,
    Service,
    StatefulSet,
}

impl ResourceKind {
    /// Returns the token kubectl expects in `<kind>/<name>` arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::Pod => "pod",
            Self::Service => "service",
            Self::StatefulSet => "statefulset",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deployment" | "deploy" => Ok(Self::Deployment),
            "pod" => Ok(Self::Pod),
            "service" | "svc" => Ok(Self::Service),
            "statefulset" | "sts" => Ok(Self::StatefulSet),
            other => Err(format!(
                "unknown resource kind '{}' (expected deployment, pod, service, or statefulset)",
                other
            )),
        }
    }
}

/// Remote port of a forward target: numeric, or a named port on the resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemotePort {
    Number(u16),
    Named(String),
}

impl RemotePort {
    /// Parses a numeric port, falling back to a named port.
    pub fn parse(s: &str) -> Self {
        s.parse::<u16>()
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Named(s.to_string()))
    }
}

impl fmt::Display for RemotePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(port) => write!(f, "{}", port),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<u16> for RemotePort {
    fn from(port: u16) -> Self {
        Self::Number(port)
    }
}

impl From<&str> for RemotePort {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Identifies what to forward to. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardTarget {
    pub namespace: String,
    pub kind: ResourceKind,
    pub name: String,
    pub remote_port: RemotePort,
}

impl ForwardTarget {
    /// Creates a new forward target.
    pub fn new(
        namespace: impl Into<String>,
        kind: ResourceKind,
        name: impl Into<String>,
        remote_port: impl Into<RemotePort>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            kind,
            name: name.into(),
            remote_port: remote_port.into(),
        }
    }

    /// Returns the kubectl resource argument, e.g. "service/postgresql".
    pub fn resource_arg(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    /// Returns the kubectl port mapping argument, e.g. "15432:tcp-postgresql".
    pub fn port_mapping(&self, local_port: u16) -> String {
        format!("{}:{}", local_port, self.remote_port)
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Opaque credential blob (e.g. a kubeconfig document).
///
/// Kept out of Debug output so it never reaches logs.
#[derive(Clone)]
pub struct CredentialMaterial(Vec<u8>);

impl CredentialMaterial {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CredentialMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialMaterial({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for CredentialMaterial {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<String> for CredentialMaterial {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for CredentialMaterial {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// One port-forward request: a local/remote pairing plus policy.
///
/// Lifetime is a single gate call; requests are not persisted.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Local port the forward binds to (1-65535).
    pub local_port: u16,
    pub target: ForwardTarget,
    pub credential_material: CredentialMaterial,
    /// Short-circuit without side effects when the gate runs in plan-only mode.
    pub skip_on_dry_run: bool,
    /// Suppress the child's stdout; stderr stays visible for diagnostics.
    pub silent: bool,
}

impl ForwardRequest {
    /// Creates a request with the default policy (skip on dry run, silent child).
    pub fn new(
        local_port: u16,
        target: ForwardTarget,
        credential_material: impl Into<CredentialMaterial>,
    ) -> Self {
        Self {
            local_port,
            target,
            credential_material: credential_material.into(),
            skip_on_dry_run: true,
            silent: true,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_skip_on_dry_run(mut self, skip: bool) -> Self {
        self.skip_on_dry_run = skip;
        self
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// The live result of a successful forward, owned by the gate that created it.
///
/// Holds the child handle so the tunnel stays observable for the rest of the
/// run. The credential file's lifetime is tied to the host process, not this
/// session: the child may still be reading it after the gate call returns.
pub struct ForwardSession {
    process: Box<dyn ForwardProcess>,
    credential_path: PathBuf,
    established_at: Instant,
}

impl ForwardSession {
    pub(crate) fn new(
        process: Box<dyn ForwardProcess>,
        credential_path: PathBuf,
        established_at: Instant,
    ) -> Self {
        Self {
            process,
            credential_path,
            established_at,
        }
    }

    /// OS process id of the forwarding child.
    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    /// Path of the credential file the child was launched with.
    pub fn credential_path(&self) -> &Path {
        &self.credential_path
    }

    /// When the forward became connectable.
    pub fn established_at(&self) -> Instant {
        self.established_at
    }

    /// True if the forwarding child is still alive.
    pub fn is_running(&mut self) -> bool {
        self.process.is_running()
    }
}

impl fmt::Debug for ForwardSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardSession")
            .field("pid", &self.process.pid())
            .field("credential_path", &self.credential_path)
            .field("established_at", &self.established_at)
            .finish()
    }
}

// ============================================================================
// Profiles (persisted)
// ============================================================================

/// A persisted named forward definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardProfile {
    pub id: Uuid,
    pub name: String,
    pub namespace: String,
    pub kind: ResourceKind,
    pub resource: String,
    pub local_port: u16,
    pub remote_port: RemotePort,
    #[serde(default = "default_true")]
    pub silent: bool,
}

fn default_true() -> bool {
    true
}

impl ForwardProfile {
    /// Creates a new profile with default settings.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        kind: ResourceKind,
        resource: impl Into<String>,
        local_port: u16,
        remote_port: impl Into<RemotePort>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            namespace: namespace.into(),
            kind,
            resource: resource.into(),
            local_port,
            remote_port: remote_port.into(),
            silent: true,
        }
    }

    /// Builds the forward target this profile describes.
    pub fn target(&self) -> ForwardTarget {
        ForwardTarget::new(
            self.namespace.clone(),
            self.kind,
            self.resource.clone(),
            self.remote_port.clone(),
        )
    }
}

/// Full profile collection for persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardProfiles {
    pub profiles: Vec<ForwardProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_parsing() {
        assert_eq!("service".parse::<ResourceKind>(), Ok(ResourceKind::Service));
        assert_eq!("svc".parse::<ResourceKind>(), Ok(ResourceKind::Service));
        assert_eq!("Deployment".parse::<ResourceKind>(), Ok(ResourceKind::Deployment));
        assert_eq!("sts".parse::<ResourceKind>(), Ok(ResourceKind::StatefulSet));
        assert!("cronjob".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_remote_port_parsing() {
        assert_eq!(RemotePort::parse("5432"), RemotePort::Number(5432));
        assert_eq!(
            RemotePort::parse("tcp-postgresql"),
            RemotePort::Named("tcp-postgresql".to_string())
        );
        // Out-of-range numbers fall back to named ports; kubectl rejects them.
        assert_eq!(
            RemotePort::parse("70000"),
            RemotePort::Named("70000".to_string())
        );
    }

    #[test]
    fn test_target_argument_forms() {
        let target = ForwardTarget::new("immich", ResourceKind::Service, "postgresql", 5432u16);
        assert_eq!(target.resource_arg(), "service/postgresql");
        assert_eq!(target.port_mapping(15432), "15432:5432");

        let named = ForwardTarget::new(
            "immich",
            ResourceKind::StatefulSet,
            "postgresql",
            "tcp-postgresql",
        );
        assert_eq!(named.resource_arg(), "statefulset/postgresql");
        assert_eq!(named.port_mapping(15432), "15432:tcp-postgresql");
    }

    #[test]
    fn test_credential_material_debug_is_redacted() {
        let material = CredentialMaterial::from("apiVersion: v1\nkind: Config\n");
        let debug = format!("{:?}", material);
        assert!(!debug.contains("apiVersion"));
    }

    #[test]
    fn test_request_defaults() {
        let target = ForwardTarget::new("default", ResourceKind::Pod, "db-0", 5432u16);
        let request = ForwardRequest::new(15432, target, "kubeconfig");
        assert!(request.skip_on_dry_run);
        assert!(request.silent);

        let request = request.with_silent(false).with_skip_on_dry_run(false);
        assert!(!request.silent);
        assert!(!request.skip_on_dry_run);
    }

    #[test]
    fn test_profile_roundtrip() {
        let profile = ForwardProfile::new(
            "immich-db",
            "immich",
            ResourceKind::Service,
            "postgresql",
            15432,
            "tcp-postgresql",
        );

        let json = serde_json::to_string(&profile).unwrap();
        let parsed: ForwardProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
        assert_eq!(parsed.target().resource_arg(), "service/postgresql");
    }
}
