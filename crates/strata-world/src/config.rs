//! World configuration.
//!
//! Configurable parameters for world generation, chunk caching, and
//! persistence. Configuration can be loaded from and saved to a TOML file;
//! a missing or unreadable file falls back to defaults with a warning so a
//! bad config never blocks world startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "strata.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File contents were not valid TOML
    #[error("Parse error: {0}")]
    Parse(String),
}

/// World configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed
    pub seed: u64,
    /// Radius (in chunks) kept resident around each tracked entity
    pub view_distance: i32,
    /// Near-cache budget; eviction starts above this
    pub max_loaded_chunks: usize,
    /// World save directory
    pub save_dir: PathBuf,
    /// Ticks between automatic saves of dirty chunks
    pub autosave_interval: u32,
    /// Worker threads for first-pass chunk generation
    pub generation_threads: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            view_distance: 4,
            max_loaded_chunks: 256,
            save_dir: PathBuf::from("saves/world"),
            autosave_interval: 6000,
            generation_threads: 4,
        }
    }
}

impl WorldConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads configuration, falling back to defaults if the file is missing
    /// or invalid.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!(target: "strata::config", ?path, "loaded world config");
                config
            }
            Err(e) => {
                warn!(target: "strata::config", ?path, error = %e, "using default world config");
                Self::default()
            }
        }
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
