//! Energy flow: particles cycling along polylines once the rig is built.
//!
//! Each path is a list of segments. A particle carries a single path
//! position in `[0, 1)` that advances with time and wraps; the position is
//! mapped onto the path by segment *count*, not segment length, so every
//! segment gets the same share of the cycle however long it is.

use crate::easing::{fract, saturate, smoothstep};
use crate::sampler::Sampler;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Upper bound of the random path-position offset per particle.
pub const PATH_JITTER: f32 = 0.1;

/// One straight leg of a flow path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowSegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl FlowSegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }
}

/// Named polyline with a particle density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPath {
    pub name: String,
    pub segments: Vec<FlowSegment>,
    /// Particles spawned per segment.
    pub particles_per_segment: u32,
}

impl FlowPath {
    pub fn new(name: impl Into<String>, segments: Vec<FlowSegment>, particles_per_segment: u32) -> Self {
        Self {
            name: name.into(),
            segments,
            particles_per_segment,
        }
    }
}

/// Static attributes of one flow particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParticle {
    /// Start of the segment that spawned the particle.
    pub origin: Vec3,
    /// End of the segment that spawned the particle.
    pub target: Vec3,
    /// Phase along the whole path in `[0, 1)`.
    pub path_position: f32,
    /// Index of the owning path.
    pub path: usize,
}

/// Map a path position to `(segment index, parameter within segment)`.
///
/// `index = min(floor(p·N), N−1)`, `t = p·N − index`. `p = 0` gives
/// `(0, 0)`; `p` just below 1 gives the last segment with `t` just below 1.
pub fn segment_at(p: f32, total: usize) -> (usize, f32) {
    let n = total.max(1);
    let scaled = saturate(p) * n as f32;
    let index = (scaled.floor() as usize).min(n - 1);
    (index, scaled - index as f32)
}

/// Flow animation tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    pub paths: Vec<FlowPath>,
    /// Multiplier from `energyFlowSpeed` to path positions per second.
    pub speed_scale: f32,
    /// Build progress range over which the flow fades in.
    pub visibility_edges: [f32; 2],
    /// Size attenuation numerator.
    pub size_attenuation: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Wobble amplitude per axis.
    pub wobble: Vec3,
}

impl Default for FlowParams {
    fn default() -> Self {
        let seg = |a: [f32; 3], b: [f32; 3]| FlowSegment::new(Vec3::from_array(a), Vec3::from_array(b));
        Self {
            paths: vec![
                FlowPath::new(
                    "derrick",
                    vec![seg([25.0, 0.0, 0.0], [25.0, 35.0, 0.0]), seg([25.0, 25.0, 0.0], [25.0, 60.0, 0.0])],
                    55,
                ),
                FlowPath::new(
                    "mud pits",
                    vec![seg([0.0, 0.0, 0.0], [4.0, 0.0, 2.0]), seg([0.0, 0.0, -2.0], [10.0, 3.0, 5.0])],
                    5,
                ),
                FlowPath::new(
                    "power",
                    vec![seg([20.0, 0.0, 0.0], [40.0, 2.0, 0.0]), seg([30.0, 2.0, 0.0], [80.0, 0.0, 0.0])],
                    10,
                ),
                FlowPath::new("substructure", vec![seg([-8.0, 0.0, 5.0], [8.0, 0.0, 5.0])], 10),
                FlowPath::new(
                    "return",
                    vec![seg([-8.0, 3.0, -5.0], [-4.0, 4.0, 0.0]), seg([-4.0, 4.0, 0.0], [8.0, 6.0, 0.0])],
                    5,
                ),
            ],
            speed_scale: 0.3,
            visibility_edges: [0.85, 0.98],
            size_attenuation: 180.0,
            min_size: 1.0,
            max_size: 20.0,
            wobble: Vec3::new(0.15, 0.1, 0.15),
        }
    }
}

/// Per-frame flow inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowUniforms {
    pub time: f32,
    pub build_progress: f32,
    /// Path positions per second, already scaled by `speed_scale`.
    pub flow_speed: f32,
    pub camera_position: Vec3,
}

/// Evaluated flow particle, ready for upload.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FlowOutput {
    pub position: [f32; 3],
    pub size: f32,
    /// `visibility · trail`.
    pub alpha: f32,
    /// Trail brightness, `sin(p_eff·π)`.
    pub glow: f32,
    pub _padding: [f32; 2],
}

/// Segment record for the GPU segment storage buffer; `w` is unused.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuFlowSegment {
    pub start: [f32; 4],
    pub end: [f32; 4],
}

/// Range of [`GpuFlowSegment`]s that make up one path.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuFlowPath {
    pub first: u32,
    pub count: u32,
}

/// Per-instance vertex input for the flow vertex stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuFlowParticle {
    pub path_position: f32,
    pub path: u32,
}

/// Flow particles for every path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyFlow {
    paths: Vec<FlowPath>,
    particles: Vec<FlowParticle>,
}

impl EnergyFlow {
    /// Spawn `particles_per_segment` particles for every segment of every path.
    ///
    /// Particle `i` of segment `s` (of `N`) starts at
    /// `fract((s + i/k + U[0, 0.1)) / N)`, spreading each segment's share of
    /// particles across that segment's slice of the cycle.
    pub fn build<R: Rng>(paths: Vec<FlowPath>, sampler: &mut Sampler<R>) -> Self {
        let mut particles = Vec::new();
        for (path_index, path) in paths.iter().enumerate() {
            let n = path.segments.len() as f32;
            let k = path.particles_per_segment;
            for (s, segment) in path.segments.iter().enumerate() {
                for i in 0..k {
                    let phase = s as f32 + i as f32 / k as f32 + sampler.random_range(0.0, PATH_JITTER);
                    particles.push(FlowParticle {
                        origin: segment.start,
                        target: segment.end,
                        path_position: fract(phase / n),
                        path: path_index,
                    });
                }
            }
        }
        log::debug!("energy flow: {} particles on {} paths", particles.len(), paths.len());
        Self { paths, particles }
    }

    pub fn paths(&self) -> &[FlowPath] {
        &self.paths
    }

    pub fn particles(&self) -> &[FlowParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Flatten all paths into the storage buffers read by the flow vertex stage.
    pub fn gpu_paths(&self) -> (Vec<GpuFlowSegment>, Vec<GpuFlowPath>) {
        let mut segments = Vec::new();
        let mut ranges = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            ranges.push(GpuFlowPath {
                first: segments.len() as u32,
                count: path.segments.len() as u32,
            });
            segments.extend(path.segments.iter().map(|seg| GpuFlowSegment {
                start: seg.start.extend(1.0).to_array(),
                end: seg.end.extend(1.0).to_array(),
            }));
        }
        (segments, ranges)
    }

    /// Per-instance records for the flow vertex stage.
    pub fn gpu_particles(&self) -> Vec<GpuFlowParticle> {
        self.particles
            .iter()
            .map(|p| GpuFlowParticle {
                path_position: p.path_position,
                path: p.path as u32,
            })
            .collect()
    }

    /// Evaluate one particle.
    pub fn evaluate(&self, particle: &FlowParticle, uniforms: &FlowUniforms, params: &FlowParams) -> FlowOutput {
        let p_eff = fract(particle.path_position + uniforms.time * uniforms.flow_speed);

        let on_path = match self.paths.get(particle.path) {
            Some(path) if !path.segments.is_empty() => {
                let (index, t) = segment_at(p_eff, path.segments.len());
                let seg = path.segments[index];
                seg.start.lerp(seg.end, t)
            }
            _ => particle.origin.lerp(particle.target, p_eff),
        };

        let w = uniforms.time * 3.0 + p_eff * 20.0;
        let position = on_path
            + Vec3::new(
                w.sin() * params.wobble.x,
                (w * 0.8).cos() * params.wobble.y,
                (w * 1.2).sin() * params.wobble.z,
            );

        let [lo, hi] = params.visibility_edges;
        let visibility = smoothstep(lo, hi, saturate(uniforms.build_progress));
        let trail = (p_eff * PI).sin();
        let distance = position.distance(uniforms.camera_position).max(1e-3);
        let size = ((4.0 + trail * 6.0) * (params.size_attenuation / distance) * visibility)
            .clamp(params.min_size, params.max_size);

        FlowOutput {
            position: position.to_array(),
            size,
            alpha: visibility * trail,
            glow: trail,
            _padding: [0.0; 2],
        }
    }

    /// Evaluate every particle into `out`, reusing its allocation.
    pub fn evaluate_into(&self, uniforms: &FlowUniforms, params: &FlowParams, out: &mut Vec<FlowOutput>) {
        out.clear();
        out.reserve(self.particles.len());
        out.extend(self.particles.iter().map(|p| self.evaluate(p, uniforms, params)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms(time: f32, build: f32) -> FlowUniforms {
        FlowUniforms {
            time,
            build_progress: build,
            flow_speed: 0.3,
            camera_position: Vec3::new(0.0, 40.0, 95.0),
        }
    }

    #[test]
    fn test_segment_mapping_endpoints() {
        assert_eq!(segment_at(0.0, 3), (0, 0.0));
        let (index, t) = segment_at(1.0 - 1e-6, 3);
        assert_eq!(index, 2);
        assert!(t > 0.999);
        assert_eq!(segment_at(1.0, 3).0, 2);
        assert_eq!(segment_at(0.5, 2), (1, 0.0));
        assert_eq!(segment_at(0.3, 0), (0, 0.3));
    }

    #[test]
    fn test_segment_share_ignores_length() {
        // Half the cycle on each segment even though the second is 10x longer
        let (index, t) = segment_at(0.25, 2);
        assert_eq!(index, 0);
        assert!((t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_build_counts_and_range() {
        let mut sampler = Sampler::seeded(21);
        let flow = EnergyFlow::build(FlowParams::default().paths, &mut sampler);
        assert_eq!(flow.len(), 2 * 55 + 2 * 5 + 2 * 10 + 10 + 2 * 5);
        for p in flow.particles() {
            assert!((0.0..1.0).contains(&p.path_position));
        }
    }

    #[test]
    fn test_path_positions_spread_per_segment() {
        let mut sampler = Sampler::seeded(21);
        let paths = vec![FlowPath::new(
            "two",
            vec![
                FlowSegment::new(Vec3::ZERO, Vec3::X),
                FlowSegment::new(Vec3::X, Vec3::new(2.0, 0.0, 0.0)),
            ],
            4,
        )];
        let flow = EnergyFlow::build(paths, &mut sampler);
        let first: Vec<f32> = flow.particles()[..4].iter().map(|p| p.path_position).collect();
        assert!(first.iter().all(|p| *p < 0.55));
        assert!((first[0] - 0.0).abs() < 0.05 + 1e-6);
        assert!((first[2] - 0.25).abs() < 0.05 + 1e-6);
    }

    #[test]
    fn test_invisible_until_nearly_built() {
        let mut sampler = Sampler::seeded(2);
        let params = FlowParams::default();
        let flow = EnergyFlow::build(params.paths.clone(), &mut sampler);
        let mut out = Vec::new();
        flow.evaluate_into(&uniforms(1.0, 0.5), &params, &mut out);
        assert_eq!(out.len(), flow.len());
        assert!(out.iter().all(|o| o.alpha == 0.0 && o.size == params.min_size));

        flow.evaluate_into(&uniforms(1.0, 1.0), &params, &mut out);
        assert!(out.iter().any(|o| o.alpha > 0.5));
        assert!(out.iter().all(|o| (params.min_size..=params.max_size).contains(&o.size)));
    }

    #[test]
    fn test_position_stays_near_path() {
        let mut sampler = Sampler::seeded(2);
        let params = FlowParams::default();
        let flow = EnergyFlow::build(params.paths.clone(), &mut sampler);
        let mut out = Vec::new();
        flow.evaluate_into(&uniforms(7.3, 1.0), &params, &mut out);
        // Derrick path particles stay on the x = 25 column up to wobble
        for (p, o) in flow.particles().iter().zip(&out) {
            if p.path == 0 {
                assert!((o.position[0] - 25.0).abs() <= 0.15 + 1e-4);
                assert!(o.position[1] >= -0.1 - 1e-4 && o.position[1] <= 60.1 + 1e-4);
            }
        }
    }

    #[test]
    fn test_gpu_paths_flatten() {
        let mut sampler = Sampler::seeded(2);
        let flow = EnergyFlow::build(FlowParams::default().paths, &mut sampler);
        let (segments, ranges) = flow.gpu_paths();
        assert_eq!(segments.len(), 9);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[3], GpuFlowPath { first: 6, count: 1 });
        assert_eq!(segments[6].start, [-8.0, 0.0, 5.0, 1.0]);
        assert_eq!(flow.gpu_particles().len(), flow.len());
    }

    #[test]
    fn test_output_layout() {
        assert_eq!(std::mem::size_of::<FlowOutput>(), 32);
        assert_eq!(std::mem::size_of::<GpuFlowSegment>(), 32);
        assert_eq!(std::mem::size_of::<GpuFlowParticle>(), 8);
    }
}
