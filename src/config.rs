//! JSON configuration for the world and its streaming behavior.
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```json
//! { "radius": 3, "shape": "sphere", "terrain": { "method": "flat", "base_height": 20 } }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine_state::{chunk_manager::RequiredShape, voxels::terrain::TerrainConfig};

/// Largest accepted streaming radius, in chunks.
pub const MAX_RADIUS: i32 = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Streaming radius in chunks around the viewpoint's chunk
    pub radius: i32,
    /// Shape of the required region
    pub shape: RequiredShape,
    /// Background generation workers; `0` generates synchronously inside each frame
    pub worker_threads: usize,
    pub terrain: TerrainConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            radius: 2,
            shape: RequiredShape::Cube,
            worker_threads: 0,
            terrain: TerrainConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Reads and validates a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: WorldConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_RADIUS).contains(&self.radius) {
            return Err(invalid("radius", format!("{} is outside 0..={}", self.radius, MAX_RADIUS)));
        }

        let terrain = &self.terrain;
        if terrain.dirt_depth < 0 {
            return Err(invalid("terrain.dirt_depth", format!("{} is negative", terrain.dirt_depth)));
        }
        if !terrain.noise_scale.is_finite() || terrain.noise_scale <= 0.0 {
            return Err(invalid(
                "terrain.noise_scale",
                format!("{} must be finite and positive", terrain.noise_scale),
            ));
        }
        if !terrain.amplitude.is_finite() || terrain.amplitude < 0.0 {
            return Err(invalid(
                "terrain.amplitude",
                format!("{} must be finite and non-negative", terrain.amplitude),
            ));
        }
        if !(0.0..=1.0).contains(&terrain.tree_density) {
            return Err(invalid(
                "terrain.tree_density",
                format!("{} is not a probability", terrain.tree_density),
            ));
        }
        if !terrain.cave_threshold.is_finite() {
            return Err(invalid("terrain.cave_threshold", "must be finite".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::terrain::GenerationMethod;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = WorldConfig::from_json_str(
            r#"{ "radius": 3, "shape": "sphere", "terrain": { "method": "flat" } }"#,
        )
        .unwrap();

        assert_eq!(config.radius, 3);
        assert_eq!(config.shape, RequiredShape::Sphere);
        assert_eq!(config.terrain.method, GenerationMethod::Flat);
        assert_eq!(config.terrain.base_height, TerrainConfig::default().base_height);
        assert_eq!(config.worker_threads, 0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = WorldConfig::from_json_str(r#"{ "radius": -1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "radius", .. }));

        let err = WorldConfig::from_json_str(r#"{ "terrain": { "tree_density": 2.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "terrain.tree_density", .. }));
    }

    #[test]
    fn unknown_terrain_method_is_a_parse_error() {
        let err = WorldConfig::from_json_str(r#"{ "terrain": { "method": "voronoi" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
