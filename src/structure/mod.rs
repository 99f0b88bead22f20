//! Procedural target geometry for the rig.
//!
//! Each sub-assembly turns its shape parameters into an ordered list of
//! target points plus a reveal delay per point. Shapes are fixed by their
//! parameters; randomness only enters through position jitter and delay
//! jitter, both drawn from the caller's [`Sampler`].
//!
//! # Sub-assemblies
//!
//! | Type | Subsystem | Reveal window |
//! |------|-----------|---------------|
//! | [`DerrickParams`] | [`Subsystem::Derrick`] | crown first, then downward |
//! | [`SubstructureParams`] | [`Subsystem::Substructure`] | first, bottom-up |
//! | [`FacilityParams`] | [`Subsystem::Facility`] | module by module |
//! | [`AccessoryParams`] | [`Subsystem::Accessory`] | last |

mod accessory;
mod derrick;
mod facility;
pub mod primitives;
mod substructure;

pub use accessory::{AccessoryParams, CableSpec, CatwalkSpec, PipeSpec};
pub use derrick::DerrickParams;
pub use facility::{FacilityModule, FacilityParams};
pub use substructure::SubstructureParams;

use crate::error::ConfigError;
use crate::particles::{ParticleAttributes, ParticleSet};
use crate::sampler::Sampler;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Latest reveal delay any point may get.
///
/// With a 0.3 assembly window this guarantees every particle has fully
/// arrived when build progress reaches 1.
pub const MAX_DELAY: f32 = 0.7;

/// Highest accepted sampling density, in points per unit length.
pub const MAX_DENSITY: f32 = 100.0;

/// Which structural unit (or ambient category) a particle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    /// Tapered lattice tower with crown block.
    Derrick,
    /// Base platform the derrick stands on.
    Substructure,
    /// Mud tanks, pumps and power units.
    Facility,
    /// Cables, pipes and catwalk.
    Accessory,
    /// Ambient fog dust around the rig.
    FogDust,
}

impl Subsystem {
    /// All subsystems in id order.
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Derrick,
        Subsystem::Substructure,
        Subsystem::Facility,
        Subsystem::Accessory,
        Subsystem::FogDust,
    ];

    /// Numeric id written into particle buffers.
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Subsystem::Derrick => "derrick",
            Subsystem::Substructure => "substructure",
            Subsystem::Facility => "facility",
            Subsystem::Accessory => "accessory",
            Subsystem::FogDust => "fog dust",
        }
    }
}

impl From<Subsystem> for u32 {
    fn from(s: Subsystem) -> Self {
        s.id()
    }
}

impl TryFrom<u32> for Subsystem {
    type Error = u32;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Subsystem::ALL.get(id as usize).copied().ok_or(id)
    }
}

/// Spherical region a sub-assembly's particles start dispersed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogVolume {
    /// Sphere center.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f32,
}

impl FogVolume {
    /// Create a fog volume.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Maps a normalized ordering fraction to a reveal delay.
///
/// `delay(frac) = clamp(start + span·frac + U[0, jitter), 0, MAX_DELAY)`.
/// The jitter keeps points scheduled for the same instant from popping in
/// unison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySchedule {
    /// Delay of the first point in the ordering.
    pub start: f32,
    /// Delay added across the whole ordering.
    pub span: f32,
    /// Upper bound of the random offset.
    pub jitter: f32,
}

impl DelaySchedule {
    /// Create a schedule.
    pub const fn new(start: f32, span: f32, jitter: f32) -> Self {
        Self { start, span, jitter }
    }

    /// Delay for a point at ordering fraction `frac` (clamped to `[0, 1]`).
    pub fn delay<R: Rng>(&self, frac: f32, sampler: &mut Sampler<R>) -> f32 {
        let frac = crate::easing::saturate(frac);
        let offset = sampler.random_range(0.0, self.jitter);
        (self.start + self.span * frac + offset).clamp(0.0, MAX_DELAY)
    }

    /// Sub-schedule covering `[from, to]` of this schedule's span.
    pub fn slice(&self, from: f32, to: f32) -> Self {
        Self {
            start: self.start + self.span * from,
            span: self.span * (to - from),
            jitter: self.jitter,
        }
    }
}

/// Generated target points with one reveal delay each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructurePoints {
    /// Assembled positions.
    pub points: Vec<Vec3>,
    /// Reveal delays, parallel to `points`.
    pub delays: Vec<f32>,
}

impl StructurePoints {
    /// Empty point set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points were generated.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add one point with an explicit delay.
    pub fn push(&mut self, point: Vec3, delay: f32) {
        self.points.push(point);
        self.delays.push(delay);
    }

    /// Add points that all share the ordering fraction `frac`.
    pub fn extend_at<R: Rng>(
        &mut self,
        points: Vec<Vec3>,
        schedule: &DelaySchedule,
        frac: f32,
        sampler: &mut Sampler<R>,
    ) {
        for p in points {
            let delay = schedule.delay(frac, sampler);
            self.push(p, delay);
        }
    }

    /// Add points revealed in list order, sweeping `frac` from `from` to `to`.
    pub fn extend_along<R: Rng>(
        &mut self,
        points: Vec<Vec3>,
        schedule: &DelaySchedule,
        from: f32,
        to: f32,
        sampler: &mut Sampler<R>,
    ) {
        let last = points.len().saturating_sub(1).max(1) as f32;
        for (i, p) in points.into_iter().enumerate() {
            let frac = from + (to - from) * (i as f32 / last);
            let delay = schedule.delay(frac, sampler);
            self.push(p, delay);
        }
    }

    /// Add points whose ordering fraction is computed from the point itself.
    pub fn extend_by<R: Rng>(
        &mut self,
        points: Vec<Vec3>,
        schedule: &DelaySchedule,
        sampler: &mut Sampler<R>,
        frac: impl Fn(Vec3) -> f32,
    ) {
        for p in points {
            let delay = schedule.delay(frac(p), sampler);
            self.push(p, delay);
        }
    }

    /// Clamp every point's height into `[min_y, max_y]`.
    pub fn clamp_heights(&mut self, min_y: f32, max_y: f32) {
        for p in &mut self.points {
            p.y = p.y.clamp(min_y, max_y);
        }
    }

    /// Append another point set.
    pub fn append(&mut self, mut other: StructurePoints) {
        self.points.append(&mut other.points);
        self.delays.append(&mut other.delays);
    }
}

/// A named structural unit that can synthesize its own target points.
pub trait SubAssembly {
    /// Subsystem tag written into every particle of this unit.
    fn subsystem(&self) -> Subsystem;

    /// Fog volume the unit's particles start dispersed in.
    fn fog(&self) -> FogVolume;

    /// Reject non-positive or non-finite shape parameters.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Generate target points and reveal delays.
    fn generate<R: Rng>(&self, sampler: &mut Sampler<R>) -> StructurePoints;

    /// Generate points and pair each with a dispersed origin.
    fn build_particles<R: Rng>(&self, sampler: &mut Sampler<R>) -> Result<ParticleAttributes, ConfigError> {
        let generated = self.generate(sampler);
        let fog = self.fog();
        log::debug!(
            "{}: {} target points, fog center {:?} radius {}",
            self.subsystem().name(),
            generated.len(),
            fog.center,
            fog.radius
        );
        ParticleAttributes::build(
            generated.points,
            generated.delays,
            fog.center,
            fog.radius,
            self.subsystem(),
            sampler,
        )
    }
}

/// Shape parameters for every sub-assembly of the rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Tower/mast.
    pub derrick: DerrickParams,
    /// Base platform.
    pub substructure: SubstructureParams,
    /// Facility modules.
    pub facility: FacilityParams,
    /// Accessory systems.
    pub accessory: AccessoryParams,
}

impl StructureConfig {
    /// Validate every sub-assembly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.derrick.validate()?;
        self.substructure.validate()?;
        self.facility.validate()?;
        self.accessory.validate()?;
        Ok(())
    }

    /// Generate every sub-assembly and pack the particles into one set.
    ///
    /// Sub-assemblies are generated in subsystem order, so the set is laid
    /// out derrick, substructure, facility, accessory.
    pub fn build_particles<R: Rng>(&self, sampler: &mut Sampler<R>) -> Result<ParticleSet, ConfigError> {
        let mut set = ParticleSet::new();
        set.push(self.derrick.build_particles(sampler)?);
        set.push(self.substructure.build_particles(sampler)?);
        set.push(self.facility.build_particles(sampler)?);
        set.push(self.accessory.build_particles(sampler)?);
        Ok(set)
    }
}

/// Positive and finite, or an [`ConfigError::InvalidDimension`].
pub(crate) fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimension { field, value })
    }
}

/// Positive, finite and no more than [`MAX_DENSITY`].
pub(crate) fn ensure_density(field: &'static str, value: f32) -> Result<(), ConfigError> {
    ensure_positive(field, value)?;
    if value <= MAX_DENSITY {
        Ok(())
    } else {
        Err(ConfigError::DensityOutOfRange {
            field,
            value,
            max: MAX_DENSITY,
        })
    }
}

/// Zero or positive and finite.
pub(crate) fn ensure_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimension { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_ids_round_trip() {
        for s in Subsystem::ALL {
            assert_eq!(Subsystem::try_from(s.id()), Ok(s));
        }
        assert_eq!(Subsystem::try_from(99), Err(99));
    }

    #[test]
    fn test_delay_schedule_bounds() {
        let mut sampler = Sampler::seeded(11);
        let schedule = DelaySchedule::new(0.6, 0.3, 0.2);
        for i in 0..100 {
            let d = schedule.delay(i as f32 / 99.0, &mut sampler);
            assert!((0.0..=MAX_DELAY).contains(&d));
        }
    }

    #[test]
    fn test_delay_schedule_orders_without_jitter() {
        let mut sampler = Sampler::seeded(0);
        let schedule = DelaySchedule::new(0.1, 0.2, 0.0);
        assert!((schedule.delay(0.0, &mut sampler) - 0.1).abs() < 1e-6);
        assert!((schedule.delay(1.0, &mut sampler) - 0.3).abs() < 1e-6);
        let slice = schedule.slice(0.5, 1.0);
        assert!((slice.start - 0.2).abs() < 1e-6);
        assert!((slice.span - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_extend_along_sweeps() {
        let mut sampler = Sampler::seeded(0);
        let schedule = DelaySchedule::new(0.0, 0.5, 0.0);
        let mut pts = StructurePoints::new();
        pts.extend_along(vec![Vec3::ZERO; 3], &schedule, 0.0, 1.0, &mut sampler);
        assert_eq!(pts.delays, vec![0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_default_structure_is_valid() {
        assert!(StructureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_all_delays_in_range() {
        let mut sampler = Sampler::seeded(2024);
        let set = StructureConfig::default().build_particles(&mut sampler).unwrap();
        assert!(!set.is_empty());
        for d in set.delays() {
            assert!(*d >= 0.0 && *d < 1.0);
            assert!(*d <= MAX_DELAY);
        }
    }
}
