//! The scene: configuration, memoized generation and per-frame evaluation.
//!
//! A [`Scene`] owns everything that outlives a frame: the generated point
//! cloud, the flow and ambient systems, the camera's smoothed pose and the
//! output buffers. [`Scene::frame`] turns a progress value and a timestamp
//! into render-ready attributes:
//!
//! ```ignore
//! let mut scene = Scene::new(SceneConfig::default())?;
//! loop {
//!     let frame = scene.frame(scroll_progress, clock.elapsed_secs());
//!     queue.write_buffer(&uniform_buffer, 0, frame.uniforms.as_bytes());
//!     renderer.draw_points(frame.assembly);
//! }
//! ```

use crate::ambient::{AmbientOutput, AmbientStars, FogDust, SceneDust};
use crate::animation::{self, AssemblyUniforms, ParticleOutput};
use crate::camera::{CameraController, CameraPose};
use crate::config::SceneConfig;
use crate::error::{ConfigError, SceneError};
use crate::flow::{EnergyFlow, FlowOutput, FlowUniforms};
use crate::memo::Memo;
use crate::particles::ParticleSet;
use crate::progress::SceneState;
use crate::sampler::Sampler;
use crate::structure::StructureConfig;
use crate::uniforms::FrameUniforms;

/// Mixed into the seed for flow and ambient generation so they do not share
/// the structure's random stream.
const AMBIENT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

type GenerationKey = (StructureConfig, Option<u64>);

/// Flow and ambient systems, all drawn from one salted stream.
#[derive(Debug)]
struct Surroundings {
    flow: EnergyFlow,
    fog_dust: FogDust,
    scene_dust: SceneDust,
    stars: AmbientStars,
}

impl Surroundings {
    fn build(config: &SceneConfig) -> Self {
        let mut sampler = Sampler::from_seed_option(config.seed.map(|s| s ^ AMBIENT_SEED_SALT));
        Self {
            flow: EnergyFlow::build(config.flow.paths.clone(), &mut sampler),
            fog_dust: FogDust::build(config.ambient.fog_dust.clone(), &mut sampler),
            scene_dust: SceneDust::build(config.ambient.scene_dust.clone(), &mut sampler),
            stars: AmbientStars::build(config.ambient.stars.clone(), &mut sampler),
        }
    }
}

/// Everything one frame produces. Slices borrow the scene's buffers.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub state: SceneState,
    pub pose: CameraPose,
    pub uniforms: FrameUniforms,
    pub assembly: &'a [ParticleOutput],
    pub flow: &'a [FlowOutput],
    pub fog_dust: &'a [AmbientOutput],
    pub scene_dust: &'a [AmbientOutput],
    pub stars: &'a [AmbientOutput],
}

#[derive(Debug, Default)]
struct FrameBuffers {
    assembly: Vec<ParticleOutput>,
    flow: Vec<FlowOutput>,
    fog_dust: Vec<AmbientOutput>,
    scene_dust: Vec<AmbientOutput>,
    stars: Vec<AmbientOutput>,
}

/// Owns configuration, generated geometry and per-frame state.
#[derive(Debug)]
pub struct Scene {
    config: SceneConfig,
    particles: Memo<GenerationKey, ParticleSet>,
    camera: CameraController,
    flow: EnergyFlow,
    fog_dust: FogDust,
    scene_dust: SceneDust,
    stars: AmbientStars,
    viewport: [f32; 2],
    last_time: Option<f32>,
    buffers: FrameBuffers,
}

impl Scene {
    /// Validate `config` and generate everything.
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        let camera = CameraController::from_params(config.camera.clone())?;

        let Surroundings {
            flow,
            fog_dust,
            scene_dust,
            stars,
        } = Surroundings::build(&config);

        let mut scene = Self {
            config,
            particles: Memo::new(),
            camera,
            flow,
            fog_dust,
            scene_dust,
            stars,
            viewport: [1280.0, 720.0],
            last_time: None,
            buffers: FrameBuffers::default(),
        };
        scene.particles()?;
        Ok(scene)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The generated point cloud, regenerating if the structure or seed changed.
    pub fn particles(&mut self) -> Result<&ParticleSet, ConfigError> {
        let key = (self.config.structure.clone(), self.config.seed);
        self.particles.try_get_or_insert_with(&key, |(structure, seed)| {
            let mut sampler = Sampler::from_seed_option(*seed);
            let set = structure.build_particles(&mut sampler)?;
            log::info!("generated {} rig particles", set.len());
            Ok(set)
        })
    }

    /// Replace the structure parameters and regenerate.
    ///
    /// Invalid parameters are rejected and leave the scene unchanged.
    pub fn set_structure(&mut self, structure: StructureConfig) -> Result<(), ConfigError> {
        structure.validate()?;
        let previous = std::mem::replace(&mut self.config.structure, structure);
        if let Err(e) = self.particles() {
            self.config.structure = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Change the seed and regenerate the rig, the flow particles and the
    /// ambient systems from it.
    pub fn set_seed(&mut self, seed: Option<u64>) -> Result<(), ConfigError> {
        let previous = std::mem::replace(&mut self.config.seed, seed);
        if let Err(e) = self.particles() {
            self.config.seed = previous;
            return Err(e);
        }
        let surroundings = Surroundings::build(&self.config);
        self.flow = surroundings.flow;
        self.fog_dust = surroundings.fog_dust;
        self.scene_dust = surroundings.scene_dust;
        self.stars = surroundings.stars;
        Ok(())
    }

    /// How many times the point cloud has been generated.
    pub fn generation_count(&self) -> u64 {
        self.particles.misses()
    }

    /// Render target size in pixels, used for the projection aspect ratio.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = [width, height];
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn flow(&self) -> &EnergyFlow {
        &self.flow
    }

    /// Evaluate one frame with per-tick camera smoothing.
    pub fn frame(&mut self, progress: f32, time: f32) -> Frame<'_> {
        let dt = self.last_time.map_or(0.0, |last| time - last);
        self.evaluate(progress, time, dt)
    }

    /// Jump straight to `progress`, skipping camera smoothing.
    pub fn seek(&mut self, progress: f32, time: f32) -> Frame<'_> {
        self.camera.reset();
        self.frame(progress, time)
    }

    fn evaluate(&mut self, progress: f32, time: f32, dt: f32) -> Frame<'_> {
        self.last_time = Some(time);
        let state = self.config.progress.evaluate(progress);
        let pose = self.camera.update_with_delta(state.progress, time, dt);
        let flow_speed = state.energy_flow_speed * self.config.flow.speed_scale;
        let camera_position = pose.position;

        let buffers = &mut self.buffers;
        match self.particles.get() {
            Some(set) => {
                let uniforms = AssemblyUniforms {
                    time,
                    build_progress: state.build_progress,
                    camera_position,
                    view_direction: pose.view_direction(),
                };
                animation::evaluate_into(set, &uniforms, &self.config.assembly, &mut buffers.assembly);
            }
            None => buffers.assembly.clear(),
        }

        let flow_uniforms = FlowUniforms {
            time,
            build_progress: state.build_progress,
            flow_speed,
            camera_position,
        };
        self.flow.evaluate_into(&flow_uniforms, &self.config.flow, &mut buffers.flow);

        self.fog_dust.evaluate_into(
            time,
            state.fog_density,
            state.build_progress,
            camera_position,
            &mut buffers.fog_dust,
        );
        self.scene_dust.evaluate_into(time, camera_position, &mut buffers.scene_dust);
        self.stars.evaluate_into(time, camera_position, &mut buffers.stars);

        Frame {
            state,
            pose,
            uniforms: FrameUniforms::new(&pose, self.viewport, time, &state, flow_speed),
            assembly: &self.buffers.assembly,
            flow: &self.buffers.flow,
            fog_dust: &self.buffers.fog_dust,
            scene_dust: &self.buffers.scene_dust,
            stars: &self.buffers.stars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SceneConfig {
        let mut config = SceneConfig {
            seed: Some(11),
            ..Default::default()
        };
        config.ambient.scene_dust.count = 50;
        config.ambient.stars.count = 50;
        config.ambient.fog_dust.count = 50;
        config
    }

    #[test]
    fn test_new_generates_once() {
        let mut scene = Scene::new(config()).unwrap();
        assert_eq!(scene.generation_count(), 1);
        let n = scene.particles().unwrap().len();
        assert!(n > 0);
        for i in 0..10 {
            let frame = scene.frame(i as f32 / 10.0, i as f32 / 60.0);
            assert_eq!(frame.assembly.len(), n);
        }
        assert_eq!(scene.generation_count(), 1);
    }

    #[test]
    fn test_frame_buffer_sizes() {
        let mut scene = Scene::new(config()).unwrap();
        let flow_len = scene.flow().len();
        let frame = scene.frame(0.5, 1.0);
        assert_eq!(frame.flow.len(), flow_len);
        assert_eq!(frame.fog_dust.len(), 50);
        assert_eq!(frame.scene_dust.len(), 50);
        assert_eq!(frame.stars.len(), 50);
        assert_eq!(frame.uniforms.build_progress, frame.state.build_progress);
    }

    #[test]
    fn test_set_structure_regenerates() {
        let mut scene = Scene::new(config()).unwrap();
        let before = scene.particles().unwrap().len();

        let mut structure = scene.config().structure.clone();
        structure.derrick.num_levels += 5;
        scene.set_structure(structure.clone()).unwrap();
        assert_eq!(scene.generation_count(), 2);
        assert!(scene.particles().unwrap().len() > before);

        scene.set_structure(structure).unwrap();
        assert_eq!(scene.generation_count(), 2);
    }

    #[test]
    fn test_set_seed_reseeds_everything() {
        let mut reseeded = Scene::new(config()).unwrap();
        reseeded.set_seed(Some(12)).unwrap();
        assert_eq!(reseeded.generation_count(), 2);
        let mut fresh = Scene::new(SceneConfig {
            seed: Some(12),
            ..config()
        })
        .unwrap();

        let a = reseeded.frame(0.95, 4.0);
        let (assembly, flow, fog_dust, scene_dust, stars) = (
            a.assembly.to_vec(),
            a.flow.to_vec(),
            a.fog_dust.to_vec(),
            a.scene_dust.to_vec(),
            a.stars.to_vec(),
        );
        let b = fresh.frame(0.95, 4.0);
        assert_eq!(assembly, b.assembly);
        assert_eq!(flow, b.flow);
        assert_eq!(fog_dust, b.fog_dust);
        assert_eq!(scene_dust, b.scene_dust);
        assert_eq!(stars, b.stars);
    }

    #[test]
    fn test_invalid_structure_is_rejected() {
        let mut scene = Scene::new(config()).unwrap();
        let mut structure = scene.config().structure.clone();
        structure.derrick.height = -1.0;
        assert!(scene.set_structure(structure).is_err());
        assert_eq!(scene.config().structure, StructureConfig::default());
        assert_eq!(scene.generation_count(), 1);
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = config();
        config.camera.keyframes.truncate(1);
        assert!(matches!(Scene::new(config), Err(SceneError::Config(_))));
    }

    #[test]
    fn test_seek_skips_smoothing() {
        let mut scene = Scene::new(config()).unwrap();
        scene.frame(0.0, 0.0);
        let pose = scene.seek(0.6, 0.1).pose;
        let (target, _) = scene.camera().target(0.6, 0.1);
        assert!(pose.position.distance(target) < 1e-4);
    }
}
