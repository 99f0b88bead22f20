//! # rigcloud
//!
//! Procedural drilling-rig point clouds that assemble out of fog as a
//! function of a single progress value.
//!
//! rigcloud generates the target geometry, pairs every point with a dispersed
//! starting position, and evaluates each frame from `(progress, time)`. It
//! never touches a GPU device: the output is plain `Pod` records, a uniform
//! block and WGSL vertex stages for whatever renderer draws them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rigcloud::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = Scene::new(SceneConfig::default())?;
//!     for i in 0..=100 {
//!         let frame = scene.frame(i as f32 / 100.0, i as f32 / 60.0);
//!         println!("{} particles, camera at {}", frame.assembly.len(), frame.pose.position);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Progress
//!
//! Everything is a function of one externally supplied scalar in `[0, 1]`
//! (typically scroll position). [`ProgressCurve`] derives build progress,
//! fog density, glow and flow speed from it as clamped ramps. Progress may
//! move backwards; nothing depends on its history except camera smoothing.
//!
//! ### Structure
//!
//! The rig is four sub-assemblies, each a [`SubAssembly`]:
//!
//! | Subsystem | Shape | Reveals |
//! |-----------|-------|---------|
//! | Substructure | Base frame, bracing, deck | First, bottom-up |
//! | Facility | Tanks, pumps, power units | Module by module |
//! | Derrick | Tapered lattice tower with crown | Top-down |
//! | Accessory | Guy cables, pipes, catwalk | Last |
//!
//! Each emits target points with a reveal delay. Delays never exceed
//! [`MAX_DELAY`](structure::MAX_DELAY), so every particle is home by build
//! progress 1.
//!
//! ### Assembly
//!
//! A particle travels from its fog origin to its target over a window of
//! build progress starting at its delay, drifting along a noise field that
//! calms as it settles. [`animation::evaluate`] is the CPU reference;
//! [`shader::assembly_shader`] produces the matching WGSL.
//!
//! ### Camera
//!
//! [`CameraController`] interpolates keyframes by progress, layers a gentle
//! idle sway near the end, and eases toward the result each frame.
//!
//! ## Randomness
//!
//! All sampling goes through [`Sampler`]. A seeded sampler makes generation
//! fully reproducible; point counts never depend on the random stream.

pub mod ambient;
pub mod animation;
pub mod camera;
pub mod config;
pub mod easing;
mod error;
pub mod flow;
pub mod memo;
pub mod noise;
pub mod particles;
pub mod progress;
pub mod sampler;
pub mod scene;
pub mod shader;
pub mod structure;
pub mod uniforms;

pub use bytemuck;
pub use glam::{Mat4, Vec3};

pub use ambient::{AmbientOutput, AmbientParams, AmbientStars, FogDust, SceneDust};
pub use animation::{AssemblyParams, AssemblyUniforms, ParticleOutput};
pub use camera::{CameraController, CameraKeyframe, CameraParams, CameraPath, CameraPose, SmoothingMode};
pub use config::SceneConfig;
pub use error::{ConfigError, SceneError};
pub use flow::{EnergyFlow, FlowOutput, FlowParams, FlowPath, FlowSegment};
pub use memo::Memo;
pub use particles::{GpuParticle, ParticleAttributes, ParticleRecord, ParticleSet};
pub use progress::{ProgressCurve, SceneState};
pub use sampler::Sampler;
pub use scene::{Frame, Scene};
pub use structure::{StructureConfig, SubAssembly, Subsystem};
pub use uniforms::FrameUniforms;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use rigcloud::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{CameraController, CameraParams, CameraPose};
    pub use crate::config::SceneConfig;
    pub use crate::error::{ConfigError, SceneError};
    pub use crate::progress::SceneState;
    pub use crate::sampler::Sampler;
    pub use crate::scene::{Frame, Scene};
    pub use crate::structure::{StructureConfig, Subsystem};
    pub use crate::uniforms::FrameUniforms;
    pub use crate::Vec3;
}
