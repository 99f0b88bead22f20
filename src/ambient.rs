//! Ambient point systems that frame the rig: drifting scene dust, a distant
//! star shell, and the fog dust that thins out as the rig assembles.
//!
//! None of these take part in the assembly. They are generated once and
//! then evaluated per frame from time and a couple of progress scalars.

use crate::easing::saturate;
use crate::noise::noise3_vec;
use crate::sampler::Sampler;
use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Evaluated ambient point.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AmbientOutput {
    pub position: [f32; 3],
    pub size: f32,
    pub alpha: f32,
    pub _padding: [f32; 3],
}

impl AmbientOutput {
    fn new(position: Vec3, size: f32, alpha: f32) -> Self {
        Self {
            position: position.to_array(),
            size,
            alpha,
            _padding: [0.0; 3],
        }
    }
}

/// `x` wrapped into `[0, period)`.
fn wrap(x: f32, period: f32) -> f32 {
    let period = period.max(f32::EPSILON);
    let r = x.rem_euclid(period);
    if r >= period {
        0.0
    } else {
        r
    }
}

fn attenuated(size: f32, numerator: f32, distance: f32, [lo, hi]: [f32; 2]) -> f32 {
    (size * numerator / distance.max(1e-3)).clamp(lo, hi)
}

// ========== Scene dust ==========

/// Scene-wide dust drifting in a box, wrapping vertically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDustParams {
    pub count: usize,
    /// Box extent; the box sits on the ground plane, centered on x and z.
    pub extent: Vec3,
    pub size_range: [f32; 2],
    pub speed_range: [f32; 2],
    /// Upward drift in units per second before wrapping.
    pub rise_speed: f32,
    pub size_attenuation: f32,
    pub size_clamp: [f32; 2],
    pub opacity: f32,
}

impl Default for SceneDustParams {
    fn default() -> Self {
        Self {
            count: 4000,
            extent: Vec3::new(280.0, 100.0, 220.0),
            size_range: [0.8, 2.8],
            speed_range: [0.06, 0.26],
            rise_speed: 0.05,
            size_attenuation: 150.0,
            size_clamp: [0.5, 3.5],
            opacity: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DustMote {
    position: Vec3,
    size: f32,
    speed: f32,
    phase: f32,
}

/// Generated scene dust.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDust {
    params: SceneDustParams,
    motes: Vec<DustMote>,
}

impl SceneDust {
    pub fn build<R: Rng>(params: SceneDustParams, sampler: &mut Sampler<R>) -> Self {
        let center = Vec3::new(0.0, params.extent.y * 0.5, 0.0);
        let motes = (0..params.count)
            .map(|_| DustMote {
                position: sampler.random_in_box(center, params.extent),
                size: sampler.random_range(params.size_range[0], params.size_range[1]),
                speed: sampler.random_range(params.speed_range[0], params.speed_range[1]),
                phase: sampler.random_range(0.0, std::f32::consts::TAU),
            })
            .collect();
        Self { params, motes }
    }

    pub fn len(&self) -> usize {
        self.motes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motes.is_empty()
    }

    /// Position of a mote at `time`.
    fn position(&self, mote: &DustMote, time: f32) -> Vec3 {
        let d = time * mote.speed;
        let phase = mote.phase;
        let mut p = mote.position
            + Vec3::new(
                (d + phase).sin() * 2.0,
                (d * 0.7 + phase * 2.0).sin(),
                (d * 0.5 + phase * 3.0).cos() * 2.0,
            );
        p.y = wrap(p.y + time * self.params.rise_speed, self.params.extent.y);
        p
    }

    pub fn evaluate_into(&self, time: f32, camera: Vec3, out: &mut Vec<AmbientOutput>) {
        out.clear();
        out.extend(self.motes.iter().map(|mote| {
            let p = self.position(mote, time);
            let size = attenuated(mote.size, self.params.size_attenuation, p.distance(camera), self.params.size_clamp);
            AmbientOutput::new(p, size, self.params.opacity)
        }));
    }
}

// ========== Stars ==========

/// Far shell of stars above the horizon, slowly turning about Y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarParams {
    pub count: usize,
    pub radius_range: [f32; 2],
    /// Vertical squash applied to the upper hemisphere.
    pub height_scale: f32,
    pub height_offset: f32,
    pub size_range: [f32; 2],
    pub brightness_range: [f32; 2],
    /// Radians per second.
    pub rotation_rate: f32,
    pub size_attenuation: f32,
    pub size_clamp: [f32; 2],
}

impl Default for StarParams {
    fn default() -> Self {
        Self {
            count: 1500,
            radius_range: [200.0, 400.0],
            height_scale: 0.6,
            height_offset: 30.0,
            size_range: [1.5, 4.0],
            brightness_range: [0.4, 1.0],
            rotation_rate: 0.001,
            size_attenuation: 80.0,
            size_clamp: [1.0, 5.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Star {
    position: Vec3,
    size: f32,
    brightness: f32,
}

/// Generated star shell.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientStars {
    params: StarParams,
    stars: Vec<Star>,
}

impl AmbientStars {
    pub fn build<R: Rng>(params: StarParams, sampler: &mut Sampler<R>) -> Self {
        let stars = (0..params.count)
            .map(|_| {
                let (r, theta, phi) = sampler.random_in_shell(params.radius_range[0], params.radius_range[1]);
                let position = Vec3::new(
                    r * phi.sin() * theta.cos(),
                    (r * phi.sin() * theta.sin()).abs() * params.height_scale + params.height_offset,
                    r * phi.cos(),
                );
                Star {
                    position,
                    size: sampler.random_range(params.size_range[0], params.size_range[1]),
                    brightness: sampler.random_range(params.brightness_range[0], params.brightness_range[1]),
                }
            })
            .collect();
        Self { params, stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn evaluate_into(&self, time: f32, camera: Vec3, out: &mut Vec<AmbientOutput>) {
        let rotation = Quat::from_rotation_y(time * self.params.rotation_rate);
        out.clear();
        out.extend(self.stars.iter().map(|star| {
            let p = rotation * star.position;
            let size = attenuated(star.size, self.params.size_attenuation, p.distance(camera), self.params.size_clamp);
            AmbientOutput::new(p, size, star.brightness)
        }));
    }
}

// ========== Fog dust ==========

/// Dust cloud around the rig that fades as the structure assembles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogDustParams {
    pub count: usize,
    pub center: Vec3,
    pub radius: f32,
    /// Vertical flattening of the cloud.
    pub flatten: f32,
    pub noise_freq_range: [f32; 2],
    pub size_range: [f32; 2],
    /// Drift amplitude per axis.
    pub drift: Vec3,
    pub noise_time_scale: f32,
    /// Upward drift in units per second, wrapped within the cloud's height.
    pub rise_speed: f32,
    /// How much of the opacity is gone at full build.
    pub build_fade: f32,
    pub size_attenuation: f32,
    pub size_clamp: [f32; 2],
}

impl Default for FogDustParams {
    fn default() -> Self {
        Self {
            count: 6000,
            center: Vec3::new(25.0, 35.0, 0.0),
            radius: 50.0,
            flatten: 0.6,
            noise_freq_range: [0.2, 0.5],
            size_range: [0.5, 2.0],
            drift: Vec3::new(2.0, 1.5, 2.0),
            noise_time_scale: 0.06,
            rise_speed: 0.3,
            build_fade: 0.7,
            size_attenuation: 150.0,
            size_clamp: [0.3, 3.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FogMote {
    position: Vec3,
    noise_freq: f32,
    size: f32,
    phase: f32,
}

/// Generated fog dust.
#[derive(Debug, Clone, PartialEq)]
pub struct FogDust {
    params: FogDustParams,
    motes: Vec<FogMote>,
}

impl FogDust {
    pub fn build<R: Rng>(params: FogDustParams, sampler: &mut Sampler<R>) -> Self {
        let motes = (0..params.count)
            .map(|_| {
                let mut p = sampler.random_in_sphere(Vec3::ZERO, params.radius);
                p.y *= params.flatten;
                FogMote {
                    position: params.center + p,
                    noise_freq: sampler.random_range(params.noise_freq_range[0], params.noise_freq_range[1]),
                    size: sampler.random_range(params.size_range[0], params.size_range[1]),
                    phase: sampler.random(),
                }
            })
            .collect();
        Self { params, motes }
    }

    pub fn len(&self) -> usize {
        self.motes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motes.is_empty()
    }

    /// Cloud opacity for the given fog density and build progress.
    pub fn alpha(&self, fog_density: f32, build_progress: f32) -> f32 {
        saturate(fog_density) * (1.0 - saturate(build_progress) * self.params.build_fade)
    }

    pub fn evaluate_into(
        &self,
        time: f32,
        fog_density: f32,
        build_progress: f32,
        camera: Vec3,
        out: &mut Vec<AmbientOutput>,
    ) {
        let alpha = self.alpha(fog_density, build_progress);
        let half_height = (self.params.radius * self.params.flatten).max(f32::EPSILON);
        let floor = self.params.center.y - half_height;
        let t = Vec3::splat(time * self.params.noise_time_scale);

        out.clear();
        out.extend(self.motes.iter().map(|mote| {
            let mut p = mote.position + noise3_vec(mote.position * mote.noise_freq + t) * self.params.drift;
            p.y = floor + wrap(p.y - floor + time * self.params.rise_speed, half_height * 2.0);
            let pulse = 1.0 + 0.1 * (time + mote.phase * 8.0).sin();
            let size = attenuated(mote.size * pulse, self.params.size_attenuation, p.distance(camera), self.params.size_clamp);
            AmbientOutput::new(p, size, alpha)
        }));
    }
}

/// Settings for every ambient system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientParams {
    pub scene_dust: SceneDustParams,
    pub stars: StarParams,
    pub fog_dust: FogDustParams,
}
