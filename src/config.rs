//! Scene configuration, loadable from JSON.
//!
//! Every section has defaults, so a config file only needs the fields it
//! overrides:
//!
//! ```ignore
//! let config = SceneConfig::from_json(r#"{ "seed": 7, "camera": { "smoothing": 0.12 } }"#)?;
//! let scene = Scene::new(config)?;
//! ```

use crate::ambient::AmbientParams;
use crate::animation::AssemblyParams;
use crate::camera::CameraParams;
use crate::error::{ConfigError, SceneError};
use crate::flow::FlowParams;
use crate::progress::ProgressCurve;
use crate::structure::{ensure_non_negative, ensure_positive, StructureConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to build a [`Scene`](crate::scene::Scene).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// RNG seed for generation. `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
    pub progress: ProgressCurve,
    pub structure: StructureConfig,
    pub assembly: AssemblyParams,
    pub camera: CameraParams,
    pub flow: FlowParams,
    pub ambient: AmbientParams,
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.structure.validate()?;
        self.camera.validate()?;

        let a = &self.assembly;
        ensure_positive("assembly.window", a.window)?;
        ensure_non_negative("assembly.drift_amplitude", a.drift_amplitude)?;
        ensure_non_negative("assembly.drift_floor", a.drift_floor)?;
        ensure_positive("assembly.min_distance", a.min_distance)?;
        ensure_non_negative("assembly.min_size", a.min_size)?;
        ensure_non_negative("assembly.max_size", a.max_size - a.min_size)?;

        let f = &self.flow;
        for (i, path) in f.paths.iter().enumerate() {
            if path.segments.is_empty() {
                log::warn!("flow path {} ({:?}) has no segments", i, path.name);
            }
        }
        let [start, end] = f.visibility_edges;
        ensure_non_negative("flow.visibility_edges", start)?;
        ensure_positive("flow.visibility_edges", end - start)?;
        ensure_non_negative("flow.max_size", f.max_size - f.min_size)?;

        let fog = &self.ambient.fog_dust;
        ensure_non_negative("ambient.fog_dust.radius", fog.radius)?;
        ensure_positive("ambient.scene_dust.extent.y", self.ambient.scene_dust.extent.y)?;
        Ok(())
    }
}
