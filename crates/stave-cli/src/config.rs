//! `Stave.toml` discovery and loading.
//!
//! The file is looked up from the current directory upward. Missing
//! sections and keys fall back to defaults; command line flags override
//! whatever the file sets.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use stave_serialize::MarkerConfig;

pub const CONFIG_FILE_NAME: &str = "Stave.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaveConfig {
    pub markers: MarkerConfig,
    pub render: RenderSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Coalesce adjacent text nodes before printing
    pub normalize: bool,
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: StaveConfig,
    pub source: ConfigSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from a Stave.toml
    File(PathBuf),
    /// Default values (no config found)
    Default,
}

/// Search upward from `start` for a `Stave.toml`.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn parse_config(content: &str) -> Result<StaveConfig> {
    toml::from_str(content).context("Invalid Stave.toml")
}

fn read_config(path: &Path) -> Result<StaveConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("In {}", path.display()))
}

/// Load an explicit config file, or discover one from `start`.
///
/// An explicit path must exist; a failed search yields defaults.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(start),
    };

    match path {
        Some(path) => {
            let config = read_config(&path)?;
            log::debug!("Loaded config from {}", path.display());
            Ok(LoadedConfig {
                config,
                source: ConfigSource::File(path),
            })
        }
        None => Ok(LoadedConfig {
            config: StaveConfig::default(),
            source: ConfigSource::Default,
        }),
    }
}
