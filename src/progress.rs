//! Scalars derived from the external progress value.
//!
//! Every derived value is a clamped affine ramp of progress, recomputed on
//! each call; nothing here keeps state between frames, so scrubbing
//! progress backwards is as safe as moving forwards.

use crate::easing::{ramp, saturate};
use serde::{Deserialize, Serialize};

/// `clamp((progress - start) * scale, 0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub start: f32,
    pub scale: f32,
}

impl Ramp {
    pub const fn new(start: f32, scale: f32) -> Self {
        Self { start, scale }
    }

    #[inline]
    pub fn at(&self, progress: f32) -> f32 {
        ramp(progress, self.start, self.scale)
    }
}

/// Ramp constants for every derived scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressCurve {
    /// Build runs slightly ahead of progress so the rig completes before the end.
    pub build: Ramp,
    pub glow: Ramp,
    /// Fog density falls as `1 - progress * fog_falloff`.
    pub fog_falloff: f32,
    pub flow: Ramp,
    pub headline: Ramp,
    pub subhead: Ramp,
}

impl Default for ProgressCurve {
    fn default() -> Self {
        Self {
            build: Ramp::new(0.0, 1.15),
            glow: Ramp::new(0.75, 4.0),
            fog_falloff: 2.0,
            flow: Ramp::new(0.85, 6.67),
            headline: Ramp::new(0.88, 8.0),
            subhead: Ramp::new(0.92, 12.5),
        }
    }
}

/// Everything derived from one progress value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneState {
    /// Input progress after clamping.
    pub progress: f32,
    pub build_progress: f32,
    pub glow_intensity: f32,
    pub fog_density: f32,
    pub energy_flow_speed: f32,
    pub headline_opacity: f32,
    pub subhead_opacity: f32,
}

impl ProgressCurve {
    /// Derive the scene state for `progress`.
    ///
    /// Progress is clamped to `[0, 1]` first; non-finite progress counts as 0.
    pub fn evaluate(&self, progress: f32) -> SceneState {
        let p = if progress.is_finite() {
            saturate(progress)
        } else {
            log::trace!("non-finite progress {}, using 0", progress);
            0.0
        };
        if p != progress && progress.is_finite() {
            log::trace!("progress {} clamped to {}", progress, p);
        }

        SceneState {
            progress: p,
            build_progress: self.build.at(p),
            glow_intensity: self.glow.at(p),
            fog_density: saturate(1.0 - p * self.fog_falloff),
            energy_flow_speed: self.flow.at(p),
            headline_opacity: self.headline.at(p),
            subhead_opacity: self.subhead.at(p),
        }
    }
}

impl SceneState {
    /// State under the default curve.
    pub fn from_progress(progress: f32) -> Self {
        ProgressCurve::default().evaluate(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_state() {
        let s = SceneState::from_progress(0.0);
        assert_eq!(s.build_progress, 0.0);
        assert_eq!(s.fog_density, 1.0);
        assert_eq!(s.glow_intensity, 0.0);
        assert_eq!(s.energy_flow_speed, 0.0);
        assert_eq!(s.headline_opacity, 0.0);
    }

    #[test]
    fn test_end_state() {
        let s = SceneState::from_progress(1.0);
        assert_eq!(s.build_progress, 1.0);
        assert_eq!(s.fog_density, 0.0);
        assert_eq!(s.glow_intensity, 1.0);
        assert_eq!(s.energy_flow_speed, 1.0);
        assert!((s.headline_opacity - 0.96).abs() < 1e-5);
        assert!((s.subhead_opacity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_build_leads_progress() {
        let s = SceneState::from_progress(0.5);
        assert!((s.build_progress - 0.575).abs() < 1e-6);
        assert_eq!(SceneState::from_progress(0.9).build_progress, 1.0);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(SceneState::from_progress(-2.0), SceneState::from_progress(0.0));
        assert_eq!(SceneState::from_progress(9.0), SceneState::from_progress(1.0));
        assert_eq!(SceneState::from_progress(f32::NAN), SceneState::from_progress(0.0));
        assert_eq!(SceneState::from_progress(f32::INFINITY), SceneState::from_progress(0.0));
    }

    #[test]
    fn test_all_scalars_in_unit_range() {
        for i in 0..=200 {
            let s = SceneState::from_progress(i as f32 / 200.0);
            for v in [
                s.build_progress,
                s.glow_intensity,
                s.fog_density,
                s.energy_flow_speed,
                s.headline_opacity,
                s.subhead_opacity,
            ] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
