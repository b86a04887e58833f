//! Profile commands - manage stored forward profiles.

use anyhow::{anyhow, Result};
use portgate_core::{ForwardProfile, ProfileStore, RemotePort, ResourceKind};

pub async fn add(
    name: String,
    namespace: String,
    kind: String,
    resource: String,
    local_port: u16,
    remote_port: String,
) -> Result<()> {
    let kind: ResourceKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let profile = ForwardProfile::new(
        name,
        namespace,
        kind,
        resource,
        local_port,
        RemotePort::parse(&remote_port),
    );

    let store = ProfileStore::new()?;
    store.add_profile(profile.clone()).await?;

    println!(
        "Added profile '{}' ({} in {}, {})",
        profile.name,
        profile.target().resource_arg(),
        profile.namespace,
        profile.target().port_mapping(profile.local_port),
    );
    Ok(())
}

pub async fn remove(name: String) -> Result<()> {
    let store = ProfileStore::new()?;
    store.remove_profile(&name).await?;
    println!("Removed profile '{}'", name);
    Ok(())
}

pub async fn clear() -> Result<()> {
    let store = ProfileStore::new()?;
    store.clear().await?;
    println!("Cleared all profiles");
    Ok(())
}

pub async fn list(json: bool) -> Result<()> {
    let profiles = ProfileStore::new()?.get_profiles().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No profiles stored.");
        return Ok(());
    }

    // Table header
    println!(
        "{:<16} {:<12} {:<28} {:<8} REMOTE",
        "NAME", "NAMESPACE", "RESOURCE", "LOCAL"
    );
    println!("{}", "-".repeat(72));

    for profile in &profiles {
        println!(
            "{:<16} {:<12} {:<28} {:<8} {}",
            profile.name,
            profile.namespace,
            profile.target().resource_arg(),
            profile.local_port,
            profile.remote_port,
        );
    }

    println!("\nTotal: {} profiles", profiles.len());
    Ok(())
}
