//! Per-frame assembly evaluation.
//!
//! Each particle is a pure function of the frame uniforms and its own static
//! attributes: it travels from its fog origin to its target once build
//! progress passes its delay, wanders along a noise field while in flight,
//! and settles into a faint residual shimmer once assembled.
//!
//! [`ASSEMBLY_WGSL`](crate::shader::ASSEMBLY_WGSL) is the GPU version of
//! [`evaluate`].

use crate::easing::{lerp_exact, saturate, smootherstep, smoothstep};
use crate::noise::noise3_vec;
use crate::particles::{ParticleRecord, ParticleSet};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Per-frame inputs shared by every particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyUniforms {
    /// Elapsed seconds.
    pub time: f32,
    /// Build progress in `[0, 1]`; clamped on use.
    pub build_progress: f32,
    pub camera_position: Vec3,
    /// Camera forward axis; need not be normalized.
    pub view_direction: Vec3,
}

impl Default for AssemblyUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            build_progress: 0.0,
            camera_position: Vec3::new(0.0, 40.0, 95.0),
            view_direction: Vec3::NEG_Z,
        }
    }
}

/// Tunables of the assembly animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyParams {
    /// Build-progress span over which one particle travels.
    pub window: f32,
    /// Drift amplitude while fully dispersed.
    pub drift_amplitude: f32,
    /// Multiplier on vertical drift.
    pub vertical_drift: f32,
    /// Residual drift once assembled.
    pub drift_floor: f32,
    /// How fast the noise field scrolls with time.
    pub noise_time_scale: f32,
    /// Size attenuation numerator: size scales with `attenuation / distance`.
    pub size_attenuation: f32,
    /// Distance floor for size attenuation.
    pub min_distance: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Relative size pulse.
    pub pulse_amplitude: f32,
    /// Pulse angular rate in radians per second.
    pub pulse_rate: f32,
}

impl Default for AssemblyParams {
    fn default() -> Self {
        Self {
            window: 0.3,
            drift_amplitude: 1.2,
            vertical_drift: 0.3,
            drift_floor: 0.02,
            noise_time_scale: 0.1,
            size_attenuation: 180.0,
            min_distance: 1.0,
            min_size: 0.5,
            max_size: 4.0,
            pulse_amplitude: 0.03,
            pulse_rate: 1.5,
        }
    }
}

/// Evaluated particle, laid out for direct upload as a vertex stream.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ParticleOutput {
    pub position: [f32; 3],
    /// Point size in pixels.
    pub size: f32,
    /// Eased travel progress in `[0, 1]`.
    pub local_progress: f32,
    /// Signed distance along the view axis.
    pub depth: f32,
    pub subsystem_id: u32,
    /// Target height, for height-based shading.
    pub height: f32,
}

/// Eased travel progress of a particle with the given delay.
///
/// Exactly 0 while `build <= delay`, exactly 1 once `build >= delay + window`,
/// and nondecreasing in `build` in between.
#[inline]
pub fn local_progress(build: f32, delay: f32, window: f32) -> f32 {
    smootherstep(smoothstep(delay, delay + window, build))
}

/// Noise drift offset for a particle.
///
/// Zero for a non-positive or non-finite frequency.
pub fn drift(target: Vec3, noise_freq: f32, time: f32, local: f32, params: &AssemblyParams) -> Vec3 {
    if !(noise_freq.is_finite() && noise_freq > 0.0) {
        return Vec3::ZERO;
    }
    let sample = target * noise_freq + Vec3::splat(time * params.noise_time_scale);
    let amplitude = (1.0 - local) * params.drift_amplitude + params.drift_floor;
    noise3_vec(sample) * Vec3::new(1.0, params.vertical_drift, 1.0) * amplitude
}

/// Distance-attenuated, pulsing point size.
pub fn point_size(base: f32, distance: f32, time: f32, delay: f32, params: &AssemblyParams) -> f32 {
    let pulse = 1.0 + params.pulse_amplitude * (time * params.pulse_rate + delay * 10.0).sin();
    let attenuation = params.size_attenuation / distance.max(params.min_distance);
    (base * attenuation * pulse).clamp(params.min_size, params.max_size)
}

/// Evaluate one particle.
pub fn evaluate(record: &ParticleRecord, uniforms: &AssemblyUniforms, params: &AssemblyParams) -> ParticleOutput {
    let build = saturate(uniforms.build_progress);
    let local = local_progress(build, record.delay, params.window);

    let position = lerp_exact(record.origin, record.target, local)
        + drift(record.target, record.noise_freq, uniforms.time, local, params);

    let to_particle = position - uniforms.camera_position;
    let forward = uniforms.view_direction.try_normalize().unwrap_or(Vec3::NEG_Z);
    let size = point_size(record.size, to_particle.length(), uniforms.time, record.delay, params);

    ParticleOutput {
        position: position.to_array(),
        size,
        local_progress: local,
        depth: to_particle.dot(forward),
        subsystem_id: record.subsystem.id(),
        height: record.target.y,
    }
}

/// Evaluate every particle of `set` into `out`, reusing its allocation.
pub fn evaluate_into(
    set: &ParticleSet,
    uniforms: &AssemblyUniforms,
    params: &AssemblyParams,
    out: &mut Vec<ParticleOutput>,
) {
    out.clear();
    out.reserve(set.len());
    out.extend(set.iter().map(|record| evaluate(&record, uniforms, params)));
}
