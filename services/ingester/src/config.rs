//! Configuration loading for stations and model profiles.
//!
//! Stations live in `config/stations.yaml`; model profiles in
//! `config/models/*.yaml`, one model per file. Both are loaded once at
//! startup and treated as immutable reference data afterwards.

use std::path::Path;

use anyhow::{Context, Result};
use rain_common::{ModelProfile, Station};
use tracing::{debug, info, warn};

/// Load the station catalog.
pub fn load_stations(config_dir: &Path) -> Result<Vec<Station>> {
    let path = config_dir.join("stations.yaml");
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read station catalog: {}", path.display()))?;

    let stations: Vec<Station> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse station catalog: {}", path.display()))?;

    info!(count = stations.len(), "Loaded station catalog");
    Ok(stations)
}

/// Load all enabled model profiles from `config/models/`.
///
/// A file that fails to parse is logged and skipped rather than failing
/// the whole load; a missing directory yields an empty set.
pub fn load_model_profiles(config_dir: &Path) -> Result<Vec<ModelProfile>> {
    let models_dir = config_dir.join("models");

    if !models_dir.exists() {
        warn!(path = %models_dir.display(), "Models config directory not found");
        return Ok(Vec::new());
    }

    let mut profiles = Vec::new();

    for entry in std::fs::read_dir(&models_dir)? {
        let path = entry?.path();
        if !path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            continue;
        }

        match load_profile(&path) {
            Ok(profile) if profile.enabled => {
                info!(model = %profile.id, name = %profile.name, "Loaded model profile");
                profiles.push(profile);
            }
            Ok(profile) => {
                debug!(model = %profile.id, "Skipping disabled model");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load model profile");
            }
        }
    }

    profiles.sort_by(|a, b| a.id.cmp(&b.id));
    info!(count = profiles.len(), "Loaded model profiles");
    Ok(profiles)
}

fn load_profile(path: &Path) -> Result<ModelProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model profile: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse model profile: {}", path.display()))
}
