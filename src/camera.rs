//! Progress-driven camera path.
//!
//! A [`CameraPath`] maps progress to a pose by easing between keyframes.
//! A [`CameraController`] layers idle motion near the end of the path on
//! top and smooths the result exponentially across frames, so scrubbing
//! progress back and forth never makes the camera jump.
//!
//! ```ignore
//! let mut controller = CameraController::new(CameraPath::new(keyframes)?, CameraParams::default());
//! let pose = controller.update(progress, time);
//! let view_proj = pose.view_proj(16.0 / 9.0);
//! ```

use crate::easing::{lerp_exact, saturate, smootherstep, smoothstep};
use crate::error::ConfigError;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// A pose pinned to a progress value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraKeyframe {
    /// Progress at which the camera is exactly at this pose.
    pub anchor: f32,
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraKeyframe {
    pub fn new(anchor: f32, position: Vec3, look_at: Vec3) -> Self {
        Self {
            anchor,
            position,
            look_at,
        }
    }
}

/// Camera placement plus projection settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraPose {
    /// Unit forward axis; `-Z` when position and look-at coincide.
    pub fn view_direction(&self) -> Vec3 {
        (self.look_at - self.position).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    /// Right-handed view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.view_direction();
        let up = if self.view_direction().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, target, up)
    }

    /// Right-handed perspective projection with depth in `[0, 1]`.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect.max(1e-4), self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }
}

/// Validated keyframe list.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPath {
    keyframes: Vec<CameraKeyframe>,
}

impl CameraPath {
    /// Validate and wrap a keyframe list.
    ///
    /// Requires at least two keyframes, anchors starting at exactly 0 and
    /// ending at exactly 1, and nondecreasing anchors in between.
    pub fn new(keyframes: Vec<CameraKeyframe>) -> Result<Self, ConfigError> {
        if keyframes.len() < 2 {
            return Err(ConfigError::TooFewKeyframes {
                count: keyframes.len(),
            });
        }
        let first = keyframes[0].anchor;
        let last = keyframes[keyframes.len() - 1].anchor;
        if first != 0.0 || last != 1.0 {
            return Err(ConfigError::KeyframeAnchors { first, last });
        }
        for (i, pair) in keyframes.windows(2).enumerate() {
            if !(pair[1].anchor >= pair[0].anchor) {
                return Err(ConfigError::KeyframeOrder { index: i + 1 });
            }
        }
        Ok(Self { keyframes })
    }

    pub fn keyframes(&self) -> &[CameraKeyframe] {
        &self.keyframes
    }

    /// Eased position and look-at for `progress` (clamped to `[0, 1]`).
    ///
    /// At a keyframe's anchor the result is that keyframe exactly.
    pub fn sample(&self, progress: f32) -> (Vec3, Vec3) {
        let p = saturate(progress);
        let last_segment = self.keyframes.len() - 2;
        let i = self
            .keyframes
            .iter()
            .rposition(|k| k.anchor <= p)
            .unwrap_or(0)
            .min(last_segment);

        let a = &self.keyframes[i];
        let b = &self.keyframes[i + 1];
        let span = b.anchor - a.anchor;
        let t = if span > 0.0 { (p - a.anchor) / span } else { 0.0 };
        let eased = smootherstep(t);

        (
            lerp_exact(a.position, b.position, eased),
            lerp_exact(a.look_at, b.look_at, eased),
        )
    }
}

/// How the per-frame smoothing factor responds to frame time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SmoothingMode {
    /// Same factor every update regardless of elapsed time.
    #[default]
    PerTick,
    /// Factor rescaled so convergence speed is the same at any frame rate;
    /// `smoothing` is the factor at `reference_fps`.
    TimeScaled { reference_fps: f32 },
}

/// Camera tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub keyframes: Vec<CameraKeyframe>,
    /// Fraction of the remaining distance covered per update.
    pub smoothing: f32,
    pub smoothing_mode: SmoothingMode,
    /// Progress above which idle motion fades in.
    pub idle_threshold: f32,
    /// Idle offset amplitude on x (sine) and y (cosine).
    pub idle_amplitude: [f32; 2],
    /// Idle angular frequency on x and y, radians per second.
    pub idle_frequency: [f32; 2],
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        let kf = |anchor: f32, position: [f32; 3], look_at: [f32; 3]| {
            CameraKeyframe::new(anchor, Vec3::from_array(position), Vec3::from_array(look_at))
        };
        Self {
            keyframes: vec![
                kf(0.0, [0.0, 40.0, 95.0], [25.0, 22.0, 0.0]),
                kf(0.2, [50.0, 35.0, 80.0], [25.0, 20.0, 0.0]),
                kf(0.4, [65.0, 28.0, 60.0], [25.0, 18.0, 0.0]),
                kf(0.6, [70.0, 20.0, 50.0], [25.0, 15.0, 0.0]),
                kf(0.8, [60.0, 15.0, 42.0], [25.0, 14.0, 0.0]),
                kf(1.0, [53.0, 14.0, 40.0], [25.0, 15.0, 0.0]),
            ],
            smoothing: 0.08,
            smoothing_mode: SmoothingMode::PerTick,
            idle_threshold: 0.95,
            idle_amplitude: [0.3, 0.1],
            idle_frequency: [0.5, 0.3],
            fov_y: 50.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraParams {
    /// Validate keyframes and projection settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        CameraPath::new(self.keyframes.clone())?;
        crate::structure::ensure_positive("camera.fov_y", self.fov_y)?;
        crate::structure::ensure_positive("camera.near", self.near)?;
        crate::structure::ensure_positive("camera.far", self.far - self.near)?;
        crate::structure::ensure_positive("camera.smoothing", self.smoothing)?;
        if let SmoothingMode::TimeScaled { reference_fps } = self.smoothing_mode {
            crate::structure::ensure_positive("camera.smoothing_mode.reference_fps", reference_fps)?;
        }
        Ok(())
    }
}

/// Smoothed camera state carried across frames.
#[derive(Debug, Clone)]
pub struct CameraController {
    path: CameraPath,
    params: CameraParams,
    current: Option<(Vec3, Vec3)>,
}

impl CameraController {
    pub fn new(path: CameraPath, params: CameraParams) -> Self {
        Self {
            path,
            params,
            current: None,
        }
    }

    /// Build the path from `params.keyframes`.
    pub fn from_params(params: CameraParams) -> Result<Self, ConfigError> {
        let path = CameraPath::new(params.keyframes.clone())?;
        Ok(Self::new(path, params))
    }

    pub fn path(&self) -> &CameraPath {
        &self.path
    }

    /// Forget the smoothed state; the next update snaps to its target.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Keyframe pose plus idle motion, before smoothing.
    pub fn target(&self, progress: f32, time: f32) -> (Vec3, Vec3) {
        let (mut position, look_at) = self.path.sample(progress);
        let weight = smoothstep(self.params.idle_threshold, 1.0, saturate(progress));
        if weight > 0.0 {
            let [ax, ay] = self.params.idle_amplitude;
            let [fx, fy] = self.params.idle_frequency;
            position.x += (time * fx).sin() * ax * weight;
            position.y += (time * fy).cos() * ay * weight;
        }
        (position, look_at)
    }

    /// Advance one tick with the configured per-tick smoothing.
    pub fn update(&mut self, progress: f32, time: f32) -> CameraPose {
        self.step(progress, time, self.params.smoothing)
    }

    /// Advance by `dt` seconds. Only differs from [`update`](Self::update)
    /// under [`SmoothingMode::TimeScaled`].
    pub fn update_with_delta(&mut self, progress: f32, time: f32, dt: f32) -> CameraPose {
        let factor = match self.params.smoothing_mode {
            SmoothingMode::PerTick => self.params.smoothing,
            SmoothingMode::TimeScaled { reference_fps } => {
                let ticks = (dt.max(0.0) * reference_fps).max(0.0);
                1.0 - (1.0 - saturate(self.params.smoothing)).powf(ticks)
            }
        };
        self.step(progress, time, factor)
    }

    fn step(&mut self, progress: f32, time: f32, factor: f32) -> CameraPose {
        let (target_position, target_look) = self.target(progress, time);
        let factor = saturate(factor);
        let (position, look_at) = match self.current {
            None => (target_position, target_look),
            Some((p, l)) => (p + (target_position - p) * factor, l + (target_look - l) * factor),
        };
        self.current = Some((position, look_at));
        self.pose(position, look_at)
    }

    /// Current smoothed pose, if any update has run.
    pub fn current(&self) -> Option<CameraPose> {
        self.current.map(|(p, l)| self.pose(p, l))
    }

    fn pose(&self, position: Vec3, look_at: Vec3) -> CameraPose {
        CameraPose {
            position,
            look_at,
            fov_y: self.params.fov_y,
            near: self.params.near,
            far: self.params.far,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyframes() -> Vec<CameraKeyframe> {
        vec![
            CameraKeyframe::new(0.0, Vec3::new(0.0, 40.0, 95.0), Vec3::new(25.0, 25.0, 0.0)),
            CameraKeyframe::new(0.4, Vec3::new(60.0, 30.0, 80.0), Vec3::new(25.0, 20.0, 0.0)),
            CameraKeyframe::new(1.0, Vec3::new(10.0, 45.0, 110.0), Vec3::new(25.0, 28.0, 0.0)),
        ]
    }

    #[test]
    fn test_path_validation() {
        assert_eq!(
            CameraPath::new(keyframes()[..1].to_vec()),
            Err(ConfigError::TooFewKeyframes { count: 1 })
        );

        let mut bad = keyframes();
        bad[0].anchor = 0.1;
        assert!(matches!(CameraPath::new(bad), Err(ConfigError::KeyframeAnchors { .. })));

        let mut bad = keyframes();
        bad[2].anchor = 0.9;
        assert!(matches!(CameraPath::new(bad), Err(ConfigError::KeyframeAnchors { .. })));

        let mut bad = keyframes();
        bad.insert(2, CameraKeyframe::new(0.2, Vec3::ZERO, Vec3::ONE));
        assert_eq!(CameraPath::new(bad), Err(ConfigError::KeyframeOrder { index: 2 }));
    }

    #[test]
    fn test_sample_hits_keyframes_exactly() {
        let path = CameraPath::new(keyframes()).unwrap();
        for k in keyframes() {
            let (p, l) = path.sample(k.anchor);
            assert_eq!(p, k.position);
            assert_eq!(l, k.look_at);
        }
    }

    #[test]
    fn test_sample_clamps_progress() {
        let path = CameraPath::new(keyframes()).unwrap();
        assert_eq!(path.sample(-3.0), path.sample(0.0));
        assert_eq!(path.sample(4.0), path.sample(1.0));
        assert_eq!(path.sample(f32::NAN), path.sample(0.0));
    }

    #[test]
    fn test_zero_span_segment() {
        let frames = vec![
            CameraKeyframe::new(0.0, Vec3::ZERO, Vec3::NEG_Z),
            CameraKeyframe::new(0.5, Vec3::X, Vec3::NEG_Z),
            CameraKeyframe::new(0.5, Vec3::Y, Vec3::NEG_Z),
            CameraKeyframe::new(1.0, Vec3::Z, Vec3::NEG_Z),
        ];
        let path = CameraPath::new(frames).unwrap();
        let (p, _) = path.sample(0.5);
        assert!(p.is_finite());
        assert_eq!(p, Vec3::Y);
    }

    #[test]
    fn test_first_update_snaps_then_smooths() {
        let params = CameraParams {
            keyframes: keyframes(),
            ..Default::default()
        };
        let mut controller = CameraController::from_params(params).unwrap();
        let first = controller.update(0.0, 0.0);
        assert_eq!(first.position, keyframes()[0].position);

        let next = controller.update(0.4, 0.0);
        let target = keyframes()[1].position;
        let expected = first.position + (target - first.position) * 0.08;
        assert!((next.position - expected).length() < 1e-4);
    }

    #[test]
    fn test_smoothing_converges() {
        let mut controller = CameraController::from_params(CameraParams {
            keyframes: keyframes(),
            ..Default::default()
        })
        .unwrap();
        controller.update(0.0, 0.0);
        let mut pose = controller.update(0.4, 0.0);
        for _ in 0..400 {
            pose = controller.update(0.4, 0.0);
        }
        assert!((pose.position - keyframes()[1].position).length() < 1e-3);
    }

    #[test]
    fn test_idle_motion_only_near_end() {
        let controller = CameraController::from_params(CameraParams {
            keyframes: keyframes(),
            ..Default::default()
        })
        .unwrap();
        let (still, _) = controller.target(0.5, 3.0);
        assert_eq!(still, controller.path().sample(0.5).0);

        let (a, _) = controller.target(1.0, 1.0);
        let (b, _) = controller.target(1.0, 4.0);
        assert!(a != b);
        assert!((a.x - keyframes()[2].position.x).abs() <= 0.3 + 1e-4);
        assert!((a.y - keyframes()[2].position.y).abs() <= 0.1 + 1e-4);
        assert_eq!(a.z, keyframes()[2].position.z);
    }

    #[test]
    fn test_time_scaled_smoothing() {
        let params = CameraParams {
            keyframes: keyframes(),
            smoothing_mode: SmoothingMode::TimeScaled { reference_fps: 60.0 },
            ..Default::default()
        };
        let mut one_step = CameraController::from_params(params.clone()).unwrap();
        let mut two_steps = CameraController::from_params(params).unwrap();
        one_step.update(0.0, 0.0);
        two_steps.update(0.0, 0.0);

        let a = one_step.update_with_delta(0.4, 0.0, 2.0 / 60.0);
        two_steps.update_with_delta(0.4, 0.0, 1.0 / 60.0);
        let b = two_steps.update_with_delta(0.4, 0.0, 1.0 / 60.0);
        assert!((a.position - b.position).length() < 1e-3);
    }

    #[test]
    fn test_rejects_bad_reference_fps() {
        for fps in [0.0, -30.0, f32::NAN] {
            let params = CameraParams {
                smoothing_mode: SmoothingMode::TimeScaled { reference_fps: fps },
                ..Default::default()
            };
            assert!(matches!(
                params.validate(),
                Err(ConfigError::InvalidDimension {
                    field: "camera.smoothing_mode.reference_fps",
                    ..
                })
            ));
        }
        let params = CameraParams {
            smoothing_mode: SmoothingMode::TimeScaled { reference_fps: 60.0 },
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_view_proj_is_finite() {
        let pose = CameraPose {
            position: Vec3::new(5.0, 5.0, 5.0),
            look_at: Vec3::new(5.0, 5.0, 5.0),
            fov_y: 50.0,
            near: 0.1,
            far: 1000.0,
        };
        assert!(pose.view_proj(16.0 / 9.0).is_finite());
        assert_eq!(pose.view_direction(), Vec3::NEG_Z);

        let straight_down = CameraPose {
            look_at: Vec3::new(5.0, 0.0, 5.0),
            ..pose
        };
        assert!(straight_down.view_matrix().is_finite());
    }

    #[test]
    fn test_default_params_valid() {
        assert!(CameraParams::default().validate().is_ok());
    }
}
