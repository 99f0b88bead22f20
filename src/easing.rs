//! Scalar easing and interpolation helpers shared by every evaluator.
//!
//! These mirror the WGSL builtins (`smoothstep`, `mix`, `fract`) so CPU and
//! GPU evaluation agree.

use glam::Vec3;

/// Clamp to `[0, 1]`. Non-finite input maps to 0.
#[inline]
pub fn saturate(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Hermite step between two edges, matching WGSL `smoothstep`.
///
/// Returns exactly 0 for `x <= edge0` and exactly 1 for `x >= edge1`.
/// Reversed edges (`edge0 > edge1`) produce a falling step, like GLSL.
/// Coincident edges degrade to a hard step at the edge.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span == 0.0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = saturate((x - edge0) / span);
    t * t * (3.0 - 2.0 * t)
}

/// The `p²(3−2p)` ease used for C¹ continuity at transition boundaries.
#[inline]
pub fn smootherstep(p: f32) -> f32 {
    let p = saturate(p);
    p * p * (3.0 - 2.0 * p)
}

/// Fractional part in `[0, 1)`, matching WGSL `fract` for finite input.
#[inline]
pub fn fract(x: f32) -> f32 {
    let f = x - x.floor();
    // x - floor(x) rounds up to 1.0 for tiny negative x
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

/// Linear interpolation that returns the endpoints bit-exactly at `t <= 0`
/// and `t >= 1`.
#[inline]
pub fn lerp_exact(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a.lerp(b, t)
    }
}

/// Affine ramp `(x - start) * scale`, clamped to `[0, 1]`.
#[inline]
pub fn ramp(x: f32, start: f32, scale: f32) -> f32 {
    saturate((x - start) * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges_are_exact() {
        assert_eq!(smoothstep(0.2, 0.5, 0.1), 0.0);
        assert_eq!(smoothstep(0.2, 0.5, 0.2), 0.0);
        assert_eq!(smoothstep(0.2, 0.5, 0.5), 1.0);
        assert_eq!(smoothstep(0.2, 0.5, 0.9), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_smoothstep_reversed_edges_fall() {
        assert_eq!(smoothstep(350.0, 40.0, 400.0), 0.0);
        assert_eq!(smoothstep(350.0, 40.0, 10.0), 1.0);
    }

    #[test]
    fn test_smoothstep_zero_span() {
        assert_eq!(smoothstep(0.5, 0.5, 0.4), 0.0);
        assert_eq!(smoothstep(0.5, 0.5, 0.5), 1.0);
    }

    #[test]
    fn test_fract_range() {
        for x in [-3.75_f32, -1e-9, 0.0, 0.25, 1.0, 7.999] {
            let f = fract(x);
            assert!((0.0..1.0).contains(&f), "fract({}) = {}", x, f);
        }
        assert!((fract(-0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_exact_endpoints() {
        let a = Vec3::new(0.1, 0.2, 0.3);
        let b = Vec3::new(10.7, -3.3, 99.9);
        assert_eq!(lerp_exact(a, b, 0.0), a);
        assert_eq!(lerp_exact(a, b, 1.0), b);
    }

    #[test]
    fn test_saturate_nan() {
        assert_eq!(saturate(f32::NAN), 0.0);
        assert_eq!(saturate(f32::INFINITY), 1.0);
        assert_eq!(saturate(-2.0), 0.0);
    }
}
