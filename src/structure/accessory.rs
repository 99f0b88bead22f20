use super::primitives::{
    generate_cable_points, generate_cylinder_points, generate_frame_points, generate_line_points, sample_count,
};
use super::{ensure_density, ensure_non_negative, ensure_positive, DelaySchedule, FogVolume, StructurePoints, SubAssembly, Subsystem};
use crate::error::ConfigError;
use crate::sampler::Sampler;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

const CATWALK: DelaySchedule = DelaySchedule::new(0.48, 0.04, 0.02);
const PIPES: DelaySchedule = DelaySchedule::new(0.50, 0.10, 0.03);
const CABLES: DelaySchedule = DelaySchedule::new(0.58, 0.10, 0.02);

/// Guy line between two anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableSpec {
    pub start: Vec3,
    pub end: Vec3,
    /// Drop at the midpoint.
    pub sag: f32,
}

/// Straight pipe run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeSpec {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

/// Catwalk frame; `center` is the ground-level center of its footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatwalkSpec {
    pub center: Vec3,
    pub size: Vec3,
}

/// Cables, pipes and the catwalk. These appear after everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessoryParams {
    pub cables: Vec<CableSpec>,
    pub pipes: Vec<PipeSpec>,
    pub catwalk: Option<CatwalkSpec>,
    /// Points per unit length.
    pub density: f32,
    /// Per-axis position jitter.
    pub jitter: f32,
    /// Dispersed starting volume.
    pub fog: FogVolume,
}

impl Default for AccessoryParams {
    fn default() -> Self {
        // Guy lines from just under the crown out to ground anchors
        let crown_y = 55.0;
        let cables = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .into_iter()
            .map(|(sx, sz)| CableSpec {
                start: Vec3::new(25.0 + sx, crown_y, sz),
                end: Vec3::new(25.0 + 30.0 * sx, 0.0, 22.0 * sz),
                sag: 2.5,
            })
            .collect();

        Self {
            cables,
            pipes: vec![
                // Standpipe up a derrick leg
                PipeSpec { start: Vec3::new(28.5, 8.0, 3.0), end: Vec3::new(26.5, 40.0, 1.5), radius: 0.35 },
                // Mud line from the pumps to the rig floor
                PipeSpec { start: Vec3::new(-6.0, 1.8, 8.0), end: Vec3::new(22.0, 1.8, 6.0), radius: 0.4 },
                // Drill string
                PipeSpec { start: Vec3::new(25.0, 8.0, 0.0), end: Vec3::new(25.0, 42.0, 0.0), radius: 0.3 },
            ],
            catwalk: Some(CatwalkSpec {
                center: Vec3::new(25.0, 0.0, 19.0),
                size: Vec3::new(3.0, 1.5, 22.0),
            }),
            density: 2.0,
            jitter: 0.04,
            fog: FogVolume::new(Vec3::new(30.0, 20.0, 0.0), 45.0),
        }
    }
}

impl SubAssembly for AccessoryParams {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Accessory
    }

    fn fog(&self) -> FogVolume {
        self.fog
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_density("accessory.density", self.density)?;
        ensure_non_negative("accessory.jitter", self.jitter)?;
        ensure_non_negative("accessory.fog.radius", self.fog.radius)?;
        for cable in &self.cables {
            ensure_non_negative("accessory.cable.sag", cable.sag)?;
        }
        for pipe in &self.pipes {
            ensure_positive("accessory.pipe.radius", pipe.radius)?;
        }
        if let Some(catwalk) = &self.catwalk {
            ensure_positive("accessory.catwalk.size.x", catwalk.size.x)?;
            ensure_positive("accessory.catwalk.size.y", catwalk.size.y)?;
            ensure_positive("accessory.catwalk.size.z", catwalk.size.z)?;
        }
        Ok(())
    }

    fn generate<R: Rng>(&self, sampler: &mut Sampler<R>) -> StructurePoints {
        let mut out = StructurePoints::new();

        if let Some(CatwalkSpec { center, size }) = self.catwalk {
            let frame = generate_frame_points(size.x, size.y, size.z, center, self.density, self.jitter, sampler);
            out.extend_along(frame, &CATWALK, 0.0, 1.0, sampler);
            // Handrail along the spine
            let rail_y = center.y + size.y * 2.0;
            let rail = generate_line_points(
                Vec3::new(center.x, rail_y, center.z - size.z * 0.5),
                Vec3::new(center.x, rail_y, center.z + size.z * 0.5),
                self.density,
                self.jitter,
                sampler,
            );
            out.extend_at(rail, &CATWALK, 1.0, sampler);
        }

        let pipe_count = self.pipes.len().max(1) as f32;
        for (i, pipe) in self.pipes.iter().enumerate() {
            let run = pipe.end - pipe.start;
            let length = run.length();
            let rings = sample_count(length * self.density * 0.5, 0, 2);
            let pts = generate_cylinder_points(pipe.start, run, length, pipe.radius, rings, 8, self.jitter, sampler);
            out.extend_at(pts, &PIPES, i as f32 / pipe_count, sampler);
        }

        for cable in &self.cables {
            let pts = generate_cable_points(cable.start, cable.end, cable.sag, self.density, self.jitter, sampler);
            out.extend_along(pts, &CABLES, 0.0, 1.0, sampler);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessories_reveal_last() {
        let pts = AccessoryParams::default().generate(&mut Sampler::seeded(8));
        assert!(!pts.is_empty());
        assert!(pts.delays.iter().all(|d| *d >= 0.48));
    }

    #[test]
    fn test_cable_reveals_along_length() {
        let params = AccessoryParams {
            cables: vec![CableSpec {
                start: Vec3::new(0.0, 20.0, 0.0),
                end: Vec3::new(20.0, 0.0, 0.0),
                sag: 1.0,
            }],
            pipes: Vec::new(),
            catwalk: None,
            jitter: 0.0,
            ..Default::default()
        };
        let pts = params.generate(&mut Sampler::seeded(8));
        let n = pts.len();
        assert!(n > 10);
        assert!(pts.delays[0] < pts.delays[n - 1]);
    }

    #[test]
    fn test_zero_length_pipe() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let params = AccessoryParams {
            cables: Vec::new(),
            pipes: vec![PipeSpec { start: p, end: p, radius: 0.5 }],
            catwalk: None,
            ..Default::default()
        };
        let pts = params.generate(&mut Sampler::seeded(8));
        assert!(!pts.is_empty());
        assert!(pts.points.iter().all(|q| q.is_finite()));
    }
}
