use super::primitives::{generate_frame_points, generate_line_points, generate_ring_points};
use super::{ensure_density, ensure_non_negative, ensure_positive, DelaySchedule, FogVolume, StructurePoints, SubAssembly, Subsystem};
use crate::error::ConfigError;
use crate::sampler::Sampler;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

const CROWN: DelaySchedule = DelaySchedule::new(0.30, 0.04, 0.03);
const LEGS: DelaySchedule = DelaySchedule::new(0.32, 0.20, 0.04);
const GIRTS: DelaySchedule = DelaySchedule::new(0.34, 0.20, 0.04);
const BRACING: DelaySchedule = DelaySchedule::new(0.42, 0.22, 0.05);

/// Tapered four-legged lattice tower with a crown block on top.
///
/// The tower stands with its base centered on `position`. It assembles
/// top-down: the crown appears first, then the legs and girts sweep down
/// the height, and the X-bracing fills in behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerrickParams {
    /// Center of the tower footing.
    pub position: Vec3,
    /// Leg spacing at the footing.
    pub base_width: f32,
    /// Leg spacing under the crown.
    pub top_width: f32,
    /// Height of the lattice, excluding the crown.
    pub height: f32,
    /// Number of bays between girt levels.
    pub num_levels: u32,
    /// Height of the crown block above the lattice.
    pub crown_height: f32,
    /// Points per unit length on legs, girts and crown.
    pub density: f32,
    /// Points per unit length on bracing members.
    pub bracing_density: f32,
    /// Per-axis position jitter.
    pub jitter: f32,
    /// Dispersed starting volume.
    pub fog: FogVolume,
}

impl Default for DerrickParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(25.0, 8.0, 0.0),
            base_width: 8.0,
            top_width: 2.0,
            height: 45.0,
            num_levels: 20,
            crown_height: 4.0,
            density: 3.0,
            bracing_density: 1.5,
            jitter: 0.05,
            fog: FogVolume::new(Vec3::new(25.0, 35.0, 0.0), 50.0),
        }
    }
}

impl DerrickParams {
    /// Leg corners at height `y` above the footing, counter-clockwise from -x/-z.
    fn corners_at(&self, y: f32) -> [Vec3; 4] {
        let t = if self.height > 0.0 { y / self.height } else { 0.0 };
        let half = (self.base_width + (self.top_width - self.base_width) * t) * 0.5;
        let c = self.position + Vec3::new(0.0, y, 0.0);
        [
            c + Vec3::new(-half, 0.0, -half),
            c + Vec3::new(half, 0.0, -half),
            c + Vec3::new(half, 0.0, half),
            c + Vec3::new(-half, 0.0, half),
        ]
    }

    fn sheave_radius(&self) -> f32 {
        self.top_width * 0.4
    }

    /// Sheave ring center; the ring stands upright with its top on the crown cap.
    fn sheave_center(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.height + self.crown_height - self.sheave_radius(), 0.0)
    }

    /// Ordering fraction for a point at absolute height `y`: 0 at the top.
    fn top_down(&self, y: f32) -> f32 {
        1.0 - (y - self.position.y) / self.height.max(f32::EPSILON)
    }
}

impl SubAssembly for DerrickParams {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Derrick
    }

    fn fog(&self) -> FogVolume {
        self.fog
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("derrick.base_width", self.base_width)?;
        ensure_positive("derrick.top_width", self.top_width)?;
        ensure_positive("derrick.height", self.height)?;
        ensure_positive("derrick.num_levels", self.num_levels as f32)?;
        ensure_non_negative("derrick.crown_height", self.crown_height)?;
        ensure_density("derrick.density", self.density)?;
        ensure_density("derrick.bracing_density", self.bracing_density)?;
        ensure_non_negative("derrick.jitter", self.jitter)?;
        ensure_non_negative("derrick.fog.radius", self.fog.radius)
    }

    fn generate<R: Rng>(&self, sampler: &mut Sampler<R>) -> StructurePoints {
        let mut out = StructurePoints::new();
        let h = self.height;
        let levels = self.num_levels.max(1);
        let top = self.position + Vec3::new(0.0, h, 0.0);

        // Crown block: a short frame capped by the sheave ring
        let crown_width = self.top_width * 1.5;
        let crown = generate_frame_points(
            crown_width,
            self.crown_height,
            crown_width,
            top,
            self.density,
            self.jitter,
            sampler,
        );
        out.extend_along(crown, &CROWN, 0.0, 0.8, sampler);
        let sheave = generate_ring_points(
            self.sheave_center(),
            self.sheave_radius(),
            Vec3::X,
            16,
            self.jitter,
            sampler,
        );
        out.extend_at(sheave, &CROWN, 1.0, sampler);

        let base = self.corners_at(0.0);
        let head = self.corners_at(h);
        for leg in 0..4 {
            let pts = generate_line_points(base[leg], head[leg], self.density, self.jitter, sampler);
            out.extend_by(pts, &LEGS, sampler, |p| self.top_down(p.y));
        }

        for level in 0..=levels {
            let frac = level as f32 / levels as f32;
            let ring = self.corners_at(h * frac);
            for side in 0..4 {
                let pts = generate_line_points(ring[side], ring[(side + 1) % 4], self.density, self.jitter, sampler);
                out.extend_at(pts, &GIRTS, 1.0 - frac, sampler);
            }
        }

        for level in 0..levels {
            let lower = self.corners_at(h * level as f32 / levels as f32);
            let upper = self.corners_at(h * (level + 1) as f32 / levels as f32);
            let frac = 1.0 - (level as f32 + 0.5) / levels as f32;
            for side in 0..4 {
                let next = (side + 1) % 4;
                let a = generate_line_points(lower[side], upper[next], self.bracing_density, self.jitter, sampler);
                let b = generate_line_points(lower[next], upper[side], self.bracing_density, self.jitter, sampler);
                out.extend_at(a, &BRACING, frac, sampler);
                out.extend_at(b, &BRACING, frac, sampler);
            }
        }

        out.clamp_heights(self.position.y, self.position.y + h + self.crown_height);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::MAX_DELAY;

    fn tower_at_origin() -> DerrickParams {
        DerrickParams {
            position: Vec3::ZERO,
            base_width: 8.0,
            top_width: 2.0,
            height: 45.0,
            num_levels: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_tower_height_envelope() {
        let params = tower_at_origin();
        let mut sampler = Sampler::seeded(3);
        let pts = params.generate(&mut sampler);
        assert!(!pts.is_empty());
        assert_eq!(pts.points.len(), pts.delays.len());
        let max_y = 45.0 + params.crown_height;
        for p in &pts.points {
            assert!(p.y >= 0.0 && p.y <= max_y, "y = {}", p.y);
        }
    }

    #[test]
    fn test_sheave_ring_keeps_its_shape() {
        let params = DerrickParams {
            jitter: 0.0,
            ..tower_at_origin()
        };
        let pts = params.generate(&mut Sampler::seeded(3));
        let center = params.sheave_center();
        let radius = params.sheave_radius();
        let on_ring = pts
            .points
            .iter()
            .filter(|p| (p.distance(center) - radius).abs() < 1e-3)
            .count();
        assert_eq!(on_ring, 16);
        assert!(center.y + radius <= 45.0 + params.crown_height + 1e-4);
    }

    #[test]
    fn test_tower_tapers() {
        let params = DerrickParams {
            jitter: 0.0,
            ..tower_at_origin()
        };
        let mut sampler = Sampler::seeded(3);
        let pts = params.generate(&mut sampler);
        for p in &pts.points {
            let half = 4.0 - 3.0 * (p.y / 45.0).min(1.0);
            assert!(p.x.abs() <= half.max(1.5) + 1e-3, "x = {} at y = {}", p.x, p.y);
        }
    }

    #[test]
    fn test_point_count_independent_of_seed() {
        let params = tower_at_origin();
        let a = params.generate(&mut Sampler::seeded(1));
        let b = params.generate(&mut Sampler::seeded(2));
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_targets_fixed_without_jitter() {
        let params = DerrickParams {
            jitter: 0.0,
            ..tower_at_origin()
        };
        let a = params.generate(&mut Sampler::seeded(1));
        let b = params.generate(&mut Sampler::seeded(2));
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_same_seed_is_identical() {
        let params = tower_at_origin();
        let a = params.generate(&mut Sampler::seeded(77));
        let b = params.generate(&mut Sampler::seeded(77));
        assert_eq!(a, b);
    }

    #[test]
    fn test_higher_reveals_first() {
        let params = tower_at_origin();
        let pts = params.generate(&mut Sampler::seeded(5));
        let mean_delay = |lo: f32, hi: f32| {
            let ds: Vec<f32> = pts
                .points
                .iter()
                .zip(&pts.delays)
                .filter(|(p, _)| p.y >= lo && p.y < hi)
                .map(|(_, d)| *d)
                .collect();
            ds.iter().sum::<f32>() / ds.len() as f32
        };
        assert!(mean_delay(35.0, 45.0) < mean_delay(0.0, 10.0));
        assert!(pts.delays.iter().all(|d| (0.0..=MAX_DELAY).contains(d)));
    }

    #[test]
    fn test_rejects_non_positive_height() {
        let params = DerrickParams {
            height: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidDimension { field: "derrick.height", .. })
        ));
    }

    #[test]
    fn test_rejects_runaway_density() {
        let params = DerrickParams {
            density: 1e30,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::DensityOutOfRange { field: "derrick.density", .. })
        ));
    }

    #[test]
    fn test_densest_accepted_tower_generates() {
        let params = DerrickParams {
            density: crate::structure::MAX_DENSITY,
            ..tower_at_origin()
        };
        assert!(params.validate().is_ok());
        let pts = params.generate(&mut Sampler::seeded(9));
        assert!(!pts.is_empty());
        assert!(pts.points.iter().all(|p| p.is_finite()));
    }
}
