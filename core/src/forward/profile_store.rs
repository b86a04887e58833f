//! Forward profile persistence.
//!
//! Stores named forward definitions in `~/.portgate/forwards.json`.

use std::path::PathBuf;

use tokio::fs;

use crate::error::{Error, Result};

use super::models::{ForwardProfile, ForwardProfiles};

/// Store for named forward profiles.
pub struct ProfileStore {
    store_path: PathBuf,
}

impl ProfileStore {
    /// Creates a store with the default path (~/.portgate/forwards.json).
    pub fn new() -> Result<Self> {
        let store_dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not find home directory".to_string()))?
            .join(".portgate");

        Ok(Self {
            store_path: store_dir.join("forwards.json"),
        })
    }

    /// Creates a store with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { store_path: path }
    }

    /// Returns the store file path.
    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }

    /// Loads all profiles from disk.
    pub async fn load(&self) -> Result<ForwardProfiles> {
        if !self.store_path.exists() {
            return Ok(ForwardProfiles::default());
        }

        let content = fs::read_to_string(&self.store_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read profiles: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse profiles: {}", e)))
    }

    /// Saves all profiles to disk.
    pub async fn save(&self, profiles: &ForwardProfiles) -> Result<()> {
        // Ensure the directory exists
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Config(format!("Failed to create store dir: {}", e)))?;
        }

        // Write to a temp file first, then rename (atomic write)
        let temp_path = self.store_path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(profiles)
            .map_err(|e| Error::Config(format!("Failed to serialize profiles: {}", e)))?;

        fs::write(&temp_path, content)
            .await
            .map_err(|e| Error::Config(format!("Failed to write profiles: {}", e)))?;

        fs::rename(&temp_path, &self.store_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to save profiles: {}", e)))?;

        Ok(())
    }

    /// Gets all profiles.
    pub async fn get_profiles(&self) -> Result<Vec<ForwardProfile>> {
        let profiles = self.load().await?;
        Ok(profiles.profiles)
    }

    /// Gets a single profile by name.
    pub async fn get_profile(&self, name: &str) -> Result<Option<ForwardProfile>> {
        let profiles = self.load().await?;
        Ok(profiles.profiles.into_iter().find(|p| p.name == name))
    }

    /// Adds a new profile. Names must be unique.
    pub async fn add_profile(&self, profile: ForwardProfile) -> Result<()> {
        let mut profiles = self.load().await?;

        if profiles.profiles.iter().any(|p| p.name == profile.name) {
            return Err(Error::Config(format!(
                "Profile '{}' already exists",
                profile.name
            )));
        }

        profiles.profiles.push(profile);
        self.save(&profiles).await
    }

    /// Removes a profile by name.
    pub async fn remove_profile(&self, name: &str) -> Result<()> {
        let mut profiles = self.load().await?;
        let original_len = profiles.profiles.len();

        profiles.profiles.retain(|p| p.name != name);

        if profiles.profiles.len() == original_len {
            return Err(Error::ProfileNotFound(name.to_string()));
        }

        self.save(&profiles).await
    }

    /// Clears all profiles.
    pub async fn clear(&self) -> Result<()> {
        self.save(&ForwardProfiles::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::models::ResourceKind;
    use tempfile::tempdir;

    fn profile(name: &str) -> ForwardProfile {
        ForwardProfile::new(
            name,
            "immich",
            ResourceKind::Service,
            "postgresql",
            15432,
            5432u16,
        )
    }

    #[tokio::test]
    async fn test_profile_store_crud() {
        let temp_dir = tempdir().unwrap();
        let store = ProfileStore::with_path(temp_dir.path().join("forwards.json"));

        // Initially empty
        assert!(store.get_profiles().await.unwrap().is_empty());

        // Add a profile
        store.add_profile(profile("immich-db")).await.unwrap();

        let profiles = store.get_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "immich-db");

        // Get by name
        let found = store.get_profile("immich-db").await.unwrap();
        assert!(found.is_some());
        assert!(store.get_profile("missing").await.unwrap().is_none());

        // Remove
        store.remove_profile("immich-db").await.unwrap();
        assert!(store.get_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let temp_dir = tempdir().unwrap();
        let store = ProfileStore::with_path(temp_dir.path().join("forwards.json"));

        store.add_profile(profile("db")).await.unwrap();
        assert!(store.add_profile(profile("db")).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_removes_all_profiles() {
        let temp_dir = tempdir().unwrap();
        let store = ProfileStore::with_path(temp_dir.path().join("forwards.json"));

        store.add_profile(profile("immich-db")).await.unwrap();
        store.add_profile(profile("grafana")).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.get_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_profile_fails() {
        let temp_dir = tempdir().unwrap();
        let store = ProfileStore::with_path(temp_dir.path().join("forwards.json"));

        let result = store.remove_profile("ghost").await;
        assert!(matches!(result, Err(Error::ProfileNotFound(_))));
    }
}
