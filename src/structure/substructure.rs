use super::primitives::{generate_line_points, prism_edges};
use super::{ensure_density, ensure_non_negative, ensure_positive, DelaySchedule, FogVolume, StructurePoints, SubAssembly, Subsystem};
use crate::error::ConfigError;
use crate::sampler::Sampler;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

const FRAME: DelaySchedule = DelaySchedule::new(0.0, 0.10, 0.03);
const BRACING: DelaySchedule = DelaySchedule::new(0.06, 0.08, 0.03);
const DECK: DelaySchedule = DelaySchedule::new(0.12, 0.08, 0.03);

/// Box-frame base platform the derrick stands on.
///
/// The first thing to appear: columns rise from the ground, the front and
/// back faces brace bay by bay, then the deck grid closes the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstructureParams {
    /// Center of the platform's ground footprint.
    pub position: Vec3,
    /// Extent along x.
    pub width: f32,
    /// Extent along z.
    pub depth: f32,
    /// Deck height.
    pub height: f32,
    /// Number of bays along x.
    pub bays: u32,
    /// Points per unit length.
    pub density: f32,
    /// Per-axis position jitter.
    pub jitter: f32,
    /// Dispersed starting volume.
    pub fog: FogVolume,
}

impl Default for SubstructureParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(25.0, 0.0, 0.0),
            width: 20.0,
            depth: 16.0,
            height: 8.0,
            bays: 4,
            density: 2.5,
            jitter: 0.05,
            fog: FogVolume::new(Vec3::new(25.0, 5.0, 0.0), 35.0),
        }
    }
}

impl SubAssembly for SubstructureParams {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Substructure
    }

    fn fog(&self) -> FogVolume {
        self.fog
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("substructure.width", self.width)?;
        ensure_positive("substructure.depth", self.depth)?;
        ensure_positive("substructure.height", self.height)?;
        ensure_positive("substructure.bays", self.bays as f32)?;
        ensure_density("substructure.density", self.density)?;
        ensure_non_negative("substructure.jitter", self.jitter)?;
        ensure_non_negative("substructure.fog.radius", self.fog.radius)
    }

    fn generate<R: Rng>(&self, sampler: &mut Sampler<R>) -> StructurePoints {
        let mut out = StructurePoints::new();
        let bays = self.bays.max(1);
        let bottom_up = |p: Vec3| (p.y - self.position.y) / self.height;

        for (a, b) in prism_edges(self.width, self.height, self.depth, self.position) {
            let pts = generate_line_points(a, b, self.density, self.jitter, sampler);
            out.extend_by(pts, &FRAME, sampler, bottom_up);
        }

        let x0 = self.position.x - self.width * 0.5;
        let bay_width = self.width / bays as f32;
        let column_x = |i: u32| x0 + bay_width * i as f32;
        let up = Vec3::new(0.0, self.height, 0.0);

        // Front (-z) and back (+z) faces
        for z in [-self.depth * 0.5, self.depth * 0.5] {
            let ground = |x: f32| Vec3::new(x, self.position.y, self.position.z + z);

            for i in 1..bays {
                let foot = ground(column_x(i));
                let pts = generate_line_points(foot, foot + up, self.density, self.jitter, sampler);
                out.extend_by(pts, &FRAME, sampler, bottom_up);
            }

            for i in 0..bays {
                let left = ground(column_x(i));
                let right = ground(column_x(i + 1));
                let frac = i as f32 / bays as f32;
                let a = generate_line_points(left, right + up, self.density, self.jitter, sampler);
                let b = generate_line_points(right, left + up, self.density, self.jitter, sampler);
                out.extend_at(a, &BRACING, frac, sampler);
                out.extend_at(b, &BRACING, frac, sampler);
            }
        }

        // Deck grid: joists across the depth at each column line, stringers along the width
        let deck_y = self.position.y + self.height;
        let z0 = self.position.z - self.depth * 0.5;
        let z1 = self.position.z + self.depth * 0.5;
        let stringers = bays.max(2);
        let total = (bays + 1 + stringers) as f32;
        for i in 0..=bays {
            let x = column_x(i);
            let pts = generate_line_points(
                Vec3::new(x, deck_y, z0),
                Vec3::new(x, deck_y, z1),
                self.density,
                self.jitter,
                sampler,
            );
            out.extend_at(pts, &DECK, i as f32 / total, sampler);
        }
        for j in 1..stringers {
            let z = z0 + self.depth * j as f32 / stringers as f32;
            let pts = generate_line_points(
                Vec3::new(x0, deck_y, z),
                Vec3::new(x0 + self.width, deck_y, z),
                self.density,
                self.jitter,
                sampler,
            );
            out.extend_at(pts, &DECK, (bays + 1 + j) as f32 / total, sampler);
        }

        out
    }
}
