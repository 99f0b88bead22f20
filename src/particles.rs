//! Static per-particle attributes.
//!
//! Every target point gets a randomized starting position inside its
//! sub-assembly's fog sphere, a base size and a drift frequency. Attributes
//! are stored as parallel arrays so they can be uploaded as separate vertex
//! streams.
//!
//! ```ignore
//! let mut sampler = Sampler::seeded(1);
//! let attrs = ParticleAttributes::build(points, delays, fog_center, 50.0, Subsystem::Derrick, &mut sampler)?;
//! let mut set = ParticleSet::new();
//! set.push(attrs);
//! ```

use crate::error::ConfigError;
use crate::sampler::Sampler;
use crate::structure::Subsystem;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;
use std::ops::Range;

/// Base point size range.
pub const SIZE_RANGE: Range<f32> = 1.5..3.5;

/// Drift noise frequency range.
pub const NOISE_FREQ_RANGE: Range<f32> = 0.3..1.0;

/// One particle's static attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    /// Dispersed starting position.
    pub origin: Vec3,
    /// Assembled position.
    pub target: Vec3,
    /// Build progress at which the particle starts moving.
    pub delay: f32,
    /// Spatial frequency of the drift noise.
    pub noise_freq: f32,
    /// Base point size.
    pub size: f32,
    /// Owning subsystem.
    pub subsystem: Subsystem,
}

/// Interleaved per-instance vertex record for the assembly vertex stage.
///
/// Field order matches the `@location`s of `ParticleIn` in the assembly shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    /// Dispersed starting position.
    pub origin: [f32; 3],
    /// Build progress at which travel begins.
    pub delay: f32,
    /// Assembled position.
    pub target: [f32; 3],
    /// Drift noise frequency.
    pub noise_freq: f32,
    /// Base point size.
    pub size: f32,
    /// [`Subsystem::id`] of the owning unit.
    pub subsystem: u32,
}

/// Parallel attribute arrays for one sub-assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleAttributes {
    /// Unit every particle in the block belongs to.
    pub subsystem: Subsystem,
    /// Fog starting positions.
    pub origins: Vec<Vec3>,
    /// Assembled positions.
    pub targets: Vec<Vec3>,
    /// Reveal delays in `[0, MAX_DELAY]`.
    pub delays: Vec<f32>,
    /// Drift noise frequencies.
    pub noise_freqs: Vec<f32>,
    /// Base point sizes.
    pub sizes: Vec<f32>,
}

impl ParticleAttributes {
    /// Pair each target point with a dispersed origin and random styling.
    ///
    /// Origins are uniform by volume inside the fog sphere. `points` and
    /// `delays` must have the same length.
    pub fn build<R: Rng>(
        points: Vec<Vec3>,
        delays: Vec<f32>,
        fog_center: Vec3,
        fog_radius: f32,
        subsystem: Subsystem,
        sampler: &mut Sampler<R>,
    ) -> Result<Self, ConfigError> {
        if points.len() != delays.len() {
            return Err(ConfigError::AttributeLengthMismatch {
                points: points.len(),
                delays: delays.len(),
            });
        }

        let n = points.len();
        let mut origins = Vec::with_capacity(n);
        let mut noise_freqs = Vec::with_capacity(n);
        let mut sizes = Vec::with_capacity(n);
        for _ in 0..n {
            origins.push(sampler.random_in_sphere(fog_center, fog_radius));
            sizes.push(sampler.random_range(SIZE_RANGE.start, SIZE_RANGE.end));
            noise_freqs.push(sampler.random_range(NOISE_FREQ_RANGE.start, NOISE_FREQ_RANGE.end));
        }

        Ok(Self {
            subsystem,
            origins,
            targets: points,
            delays,
            noise_freqs,
            sizes,
        })
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no particles.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Attributes of particle `i`.
    pub fn record(&self, i: usize) -> Option<ParticleRecord> {
        Some(ParticleRecord {
            origin: *self.origins.get(i)?,
            target: *self.targets.get(i)?,
            delay: *self.delays.get(i)?,
            noise_freq: *self.noise_freqs.get(i)?,
            size: *self.sizes.get(i)?,
            subsystem: self.subsystem,
        })
    }
}

/// Every sub-assembly's particles, concatenated in push order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSet {
    origins: Vec<Vec3>,
    targets: Vec<Vec3>,
    delays: Vec<f32>,
    noise_freqs: Vec<f32>,
    sizes: Vec<f32>,
    subsystem_ids: Vec<u32>,
    ranges: Vec<(Subsystem, Range<usize>)>,
}

impl ParticleSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sub-assembly's attributes.
    pub fn push(&mut self, attrs: ParticleAttributes) {
        let start = self.targets.len();
        let n = attrs.len();
        self.origins.extend(attrs.origins);
        self.targets.extend(attrs.targets);
        self.delays.extend(attrs.delays);
        self.noise_freqs.extend(attrs.noise_freqs);
        self.sizes.extend(attrs.sizes);
        self.subsystem_ids.extend(std::iter::repeat(attrs.subsystem.id()).take(n));
        self.ranges.push((attrs.subsystem, start..start + n));
    }

    /// Total particle count.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the set holds no particles.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Attributes of particle `i`.
    pub fn record(&self, i: usize) -> Option<ParticleRecord> {
        let subsystem = Subsystem::try_from(*self.subsystem_ids.get(i)?).ok()?;
        Some(ParticleRecord {
            origin: self.origins[i],
            target: self.targets[i],
            delay: self.delays[i],
            noise_freq: self.noise_freqs[i],
            size: self.sizes[i],
            subsystem,
        })
    }

    /// Iterate over all particles.
    pub fn iter(&self) -> impl Iterator<Item = ParticleRecord> + '_ {
        (0..self.len()).filter_map(move |i| self.record(i))
    }

    /// Particles belonging to `subsystem`.
    pub fn count(&self, subsystem: Subsystem) -> usize {
        self.ranges
            .iter()
            .filter(|(s, _)| *s == subsystem)
            .map(|(_, r)| r.len())
            .sum()
    }

    /// Index ranges of each pushed block, in push order.
    pub fn ranges(&self) -> &[(Subsystem, Range<usize>)] {
        &self.ranges
    }

    /// Fog starting positions, in particle order.
    pub fn origins(&self) -> &[Vec3] {
        &self.origins
    }

    /// Assembled positions.
    pub fn targets(&self) -> &[Vec3] {
        &self.targets
    }

    /// Reveal delays.
    pub fn delays(&self) -> &[f32] {
        &self.delays
    }

    /// Drift noise frequencies.
    pub fn noise_freqs(&self) -> &[f32] {
        &self.noise_freqs
    }

    /// Base point sizes.
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Subsystem id per particle.
    pub fn subsystem_ids(&self) -> &[u32] {
        &self.subsystem_ids
    }

    /// Interleave the parallel arrays into one instance buffer.
    pub fn gpu_vertices(&self) -> Vec<GpuParticle> {
        (0..self.len())
            .map(|i| GpuParticle {
                origin: self.origins[i].to_array(),
                delay: self.delays[i],
                target: self.targets[i].to_array(),
                noise_freq: self.noise_freqs[i],
                size: self.sizes[i],
                subsystem: self.subsystem_ids[i],
            })
            .collect()
    }
}
