//! Forward command - establish a port forward and hold it open.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use portgate_core::{
    CleanupRegistry, ForwardRequest, ForwardTarget, GateOptions, PortForwardGate, ProfileStore,
    RemotePort, ResourceKind,
};

#[derive(Args)]
pub struct ForwardArgs {
    /// Namespace of the target resource
    pub namespace: String,

    /// Resource kind (deployment, pod, service, statefulset)
    pub kind: String,

    /// Resource name
    pub name: String,

    /// Port mapping as local:remote (remote may be a named port)
    pub mapping: String,

    /// Show the forwarding process's own stdout
    #[arg(long)]
    pub loud: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args)]
pub struct CommonArgs {
    /// Path to the kubeconfig file (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Plan-only mode: print the port without spawning anything
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait for the port to become connectable
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Milliseconds between connectivity attempts
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,
}

/// Drains the cleanup registry when the command unwinds.
///
/// Credential files must be removed on failure paths (timeout, early exit,
/// kubeconfig errors) as well as after Ctrl-C, so the drain rides on Drop
/// instead of living at the end of the happy path.
struct DrainGuard(Arc<CleanupRegistry>);

impl Drop for DrainGuard {
    fn drop(&mut self) {
        self.0.drain();
    }
}

pub async fn run(args: ForwardArgs) -> Result<()> {
    let (local_port, remote_port) = parse_mapping(&args.mapping)?;
    let kind: ResourceKind = args.kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let target = ForwardTarget::new(args.namespace, kind, args.name, remote_port);

    establish_and_hold(target, local_port, !args.loud, args.common).await
}

pub async fn up(name: String, common: CommonArgs) -> Result<()> {
    let store = ProfileStore::new()?;
    let profile = store
        .get_profile(&name)
        .await?
        .with_context(|| format!("no profile named '{}'", name))?;

    establish_and_hold(profile.target(), profile.local_port, profile.silent, common).await
}

async fn establish_and_hold(
    target: ForwardTarget,
    local_port: u16,
    silent: bool,
    common: CommonArgs,
) -> Result<()> {
    let kubeconfig = read_kubeconfig(common.kubeconfig.as_deref())?;

    let registry = Arc::new(CleanupRegistry::new());
    let _cleanup = DrainGuard(registry.clone());
    let options = GateOptions {
        poll_interval: Duration::from_millis(common.poll_ms),
        deadline: Duration::from_secs(common.timeout_secs),
        dry_run: common.dry_run,
    };
    let gate = PortForwardGate::new(registry.clone()).with_options(options);

    let request = ForwardRequest::new(local_port, target.clone(), kubeconfig).with_silent(silent);

    // The gate blocks while polling; keep it off the runtime thread.
    let port = tokio::task::spawn_blocking(move || gate.establish(request)).await??;

    println!("{}", port);
    if common.dry_run {
        return Ok(());
    }

    info!(port, target = %target.resource_arg(), "forward ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    // The forwarding child dies with this process; the credential files are
    // removed by the drain guard on the way out.
    Ok(())
}

fn read_kubeconfig(path: Option<&Path>) -> Result<Vec<u8>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match std::env::var_os("KUBECONFIG") {
            Some(env_path) => PathBuf::from(env_path),
            None => dirs::home_dir()
                .context("could not determine home directory")?
                .join(".kube")
                .join("config"),
        },
    };

    std::fs::read(&path)
        .with_context(|| format!("failed to read kubeconfig at {}", path.display()))
}

/// Parses "local:remote" where remote may be numeric or a named port.
fn parse_mapping(mapping: &str) -> Result<(u16, RemotePort)> {
    let Some((local, remote)) = mapping.split_once(':') else {
        bail!(
            "port mapping must be of the form local:remote, got '{}'",
            mapping
        );
    };

    let local_port: u16 = local
        .parse()
        .with_context(|| format!("invalid local port '{}'", local))?;
    if local_port == 0 {
        bail!("local port must be in 1..=65535");
    }
    if remote.is_empty() {
        bail!("remote port must not be empty");
    }

    Ok((local_port, RemotePort::parse(remote)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_numeric() {
        let (local, remote) = parse_mapping("15432:5432").unwrap();
        assert_eq!(local, 15432);
        assert_eq!(remote, RemotePort::Number(5432));
    }

    #[test]
    fn test_parse_mapping_named_remote() {
        let (local, remote) = parse_mapping("15432:tcp-postgresql").unwrap();
        assert_eq!(local, 15432);
        assert_eq!(remote, RemotePort::Named("tcp-postgresql".to_string()));
    }

    #[test]
    fn test_parse_mapping_rejects_bad_input() {
        assert!(parse_mapping("15432").is_err());
        assert!(parse_mapping("zero:5432").is_err());
        assert!(parse_mapping("0:5432").is_err());
        assert!(parse_mapping("15432:").is_err());
    }

    #[test]
    fn test_drain_guard_removes_credentials_on_unwind() {
        let registry = Arc::new(CleanupRegistry::new());
        let (_, path) = tempfile::NamedTempFile::new().unwrap().keep().unwrap();
        registry.register(path.clone());

        {
            let _cleanup = DrainGuard(registry.clone());
            // An error return path drops the guard here.
        }

        assert!(!path.exists());
        assert!(registry.is_empty());
    }
}
