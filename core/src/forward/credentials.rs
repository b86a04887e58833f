//! Transient credential materialization and process-exit cleanup.
//!
//! A credential file must outlive the gate call that wrote it: the spawned
//! child may still be reading the file after the forward is established.
//! Files are therefore only deleted when the host process drains the cleanup
//! registry during its shutdown sequence, never earlier.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::errors::GateError;

/// Registry of files to delete at host-process exit.
///
/// The host owns one registry for the whole run (shared via `Arc`) and
/// drains it from its shutdown path. Registrations are independent and
/// order-insensitive; concurrent gate calls append under the lock.
pub struct CleanupRegistry {
    paths: Mutex<Vec<PathBuf>>,
}

impl CleanupRegistry {
    pub const fn new() -> Self {
        Self {
            paths: Mutex::new(Vec::new()),
        }
    }

    /// Schedules a file for deletion at process exit.
    pub fn register(&self, path: impl Into<PathBuf>) {
        self.paths.lock().push(path.into());
    }

    /// Paths currently scheduled for deletion.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }

    /// True if the path is scheduled for deletion.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.lock().iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }

    /// Deletes every registered file.
    ///
    /// Called from the host's shutdown path. Missing files are ignored.
    pub fn drain(&self) {
        let paths = std::mem::take(&mut *self.paths.lock());
        for path in paths {
            if let Err(e) = fs::remove_file(&path) {
                debug!(path = %path.display(), error = %e, "failed to remove credential file");
            }
        }
    }
}

impl Default for CleanupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a credential blob to a uniquely named temp file and schedules it
/// for deletion at process exit.
///
/// The file is flushed to disk before the path is returned, so a subprocess
/// launched with it immediately afterwards sees the full contents.
pub fn materialize_credentials(
    blob: &[u8],
    registry: &CleanupRegistry,
) -> Result<PathBuf, GateError> {
    let mut file = tempfile::Builder::new()
        .prefix("portgate-kubeconfig-")
        .tempfile()
        .map_err(|source| GateError::ResourceUnavailable { source })?;

    file.write_all(blob)
        .map_err(|source| GateError::ResourceUnavailable { source })?;
    file.as_file()
        .sync_all()
        .map_err(|source| GateError::ResourceUnavailable { source })?;

    // Persist the file past this call; deletion happens via the registry.
    let (_, path) = file
        .keep()
        .map_err(|e| GateError::ResourceUnavailable { source: e.error })?;

    registry.register(path.clone());
    debug!(path = %path.display(), "credential file written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_writes_and_registers() {
        let registry = CleanupRegistry::new();
        let path = materialize_credentials(b"apiVersion: v1\nkind: Config\n", &registry).unwrap();

        assert!(path.exists());
        assert!(registry.contains(&path));
        assert_eq!(
            fs::read(&path).unwrap(),
            b"apiVersion: v1\nkind: Config\n".to_vec()
        );

        // The file survives the call; only drain removes it.
        registry.drain();
        assert!(!path.exists());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_materializations_get_unique_paths() {
        let registry = CleanupRegistry::new();
        let first = materialize_credentials(b"a", &registry).unwrap();
        let second = materialize_credentials(b"b", &registry).unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        registry.drain();
    }

    #[test]
    fn test_drain_tolerates_missing_files() {
        let registry = CleanupRegistry::new();
        registry.register("/nonexistent/portgate-test-credential");
        registry.drain();
        assert!(registry.is_empty());
    }
}
