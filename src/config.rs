//! Generation config
//!
//! Every tuning knob in one RON file. Missing sections fall back to their
//! defaults so a config only needs to name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generation::GeneratorSettings;
use crate::physics::PhysicsConfig;
use crate::room::{BiomeTable, PipelineConfig};
use crate::solver::SolverConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// District solver tuning
    pub solver: SolverConfig,
    /// Jump arc bonuses
    pub physics: PhysicsConfig,
    /// Per-generator tuning
    pub generators: GeneratorSettings,
    pub pipeline: PipelineConfig,
    /// Noise, feature and override table per biome type
    pub biomes: BiomeTable,
}

impl GenerationConfig {
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(4);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&content)
    }

    /// Load a config file, falling back to defaults when it is missing or
    /// does not parse
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write the default config, for editing
    pub fn export_default(path: &Path) -> Result<(), ConfigError> {
        let content = Self::default().to_ron()?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
