//! Point-sampling primitives the sub-assemblies are built from.
//!
//! All functions are total: degenerate input (zero-length segments, zero
//! radius, zero counts) falls back to a minimum point count instead of
//! failing or dividing by zero.

use crate::sampler::Sampler;
use glam::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Most samples any single member may produce.
pub const MAX_MEMBER_SAMPLES: usize = 65_536;

/// `floor(amount) + offset`, kept within `[min, MAX_MEMBER_SAMPLES]`.
///
/// Non-finite or negative amounts give `min`.
pub fn sample_count(amount: f32, offset: usize, min: usize) -> usize {
    let n = amount.floor();
    let n = if n.is_finite() && n > 0.0 {
        (n.min(MAX_MEMBER_SAMPLES as f32) as usize).saturating_add(offset)
    } else {
        offset
    };
    n.clamp(min, MAX_MEMBER_SAMPLES.max(min))
}

/// Number of samples for a segment: `max(2, floor(length·density) + 1)`,
/// capped at [`MAX_MEMBER_SAMPLES`].
pub fn line_point_count(start: Vec3, end: Vec3, density: f32) -> usize {
    sample_count(start.distance(end) * density.max(0.0), 1, 2)
}

/// Evenly spaced points from `start` to `end`, each jittered per axis.
pub fn generate_line_points<R: Rng>(
    start: Vec3,
    end: Vec3,
    density: f32,
    jitter: f32,
    sampler: &mut Sampler<R>,
) -> Vec<Vec3> {
    let count = line_point_count(start, end, density);
    let last = (count - 1) as f32;
    (0..count)
        .map(|i| start.lerp(end, i as f32 / last) + sampler.jitter(jitter))
        .collect()
}

/// The 12 edges of an axis-aligned box whose bottom face is centered at `origin`.
///
/// Order: bottom rectangle, top rectangle, verticals.
pub fn prism_edges(width: f32, height: f32, depth: f32, origin: Vec3) -> [(Vec3, Vec3); 12] {
    let hx = width * 0.5;
    let hz = depth * 0.5;
    let b = [
        origin + Vec3::new(-hx, 0.0, -hz),
        origin + Vec3::new(hx, 0.0, -hz),
        origin + Vec3::new(hx, 0.0, hz),
        origin + Vec3::new(-hx, 0.0, hz),
    ];
    let up = Vec3::new(0.0, height, 0.0);
    let t = [b[0] + up, b[1] + up, b[2] + up, b[3] + up];

    [
        (b[0], b[1]),
        (b[1], b[2]),
        (b[2], b[3]),
        (b[3], b[0]),
        (t[0], t[1]),
        (t[1], t[2]),
        (t[2], t[3]),
        (t[3], t[0]),
        (b[0], t[0]),
        (b[1], t[1]),
        (b[2], t[2]),
        (b[3], t[3]),
    ]
}

/// Wireframe of a rectangular prism, sampled edge by edge.
pub fn generate_frame_points<R: Rng>(
    width: f32,
    height: f32,
    depth: f32,
    origin: Vec3,
    density: f32,
    jitter: f32,
    sampler: &mut Sampler<R>,
) -> Vec<Vec3> {
    prism_edges(width, height, depth, origin)
        .iter()
        .flat_map(|&(a, b)| generate_line_points(a, b, density, jitter, sampler))
        .collect()
}

/// Unit axis, or +Y when `axis` has no usable direction.
fn unit_axis(axis: Vec3) -> Vec3 {
    axis.try_normalize().unwrap_or(Vec3::Y)
}

/// `count` points on a circle around `center`, perpendicular to `axis`.
pub fn generate_ring_points<R: Rng>(
    center: Vec3,
    radius: f32,
    axis: Vec3,
    count: usize,
    jitter: f32,
    sampler: &mut Sampler<R>,
) -> Vec<Vec3> {
    let (u, v) = unit_axis(axis).any_orthonormal_pair();
    let count = count.max(3);
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            center + (u * angle.cos() + v * angle.sin()) * radius + sampler.jitter(jitter)
        })
        .collect()
}

/// Stacked rings along `axis` plus four longitudinal seams.
#[allow(clippy::too_many_arguments)]
pub fn generate_cylinder_points<R: Rng>(
    base: Vec3,
    axis: Vec3,
    length: f32,
    radius: f32,
    rings: usize,
    per_ring: usize,
    jitter: f32,
    sampler: &mut Sampler<R>,
) -> Vec<Vec3> {
    let dir = unit_axis(axis);
    let rings = rings.max(2);
    let mut points = Vec::with_capacity(rings * per_ring.max(3) + rings * 8);

    for r in 0..rings {
        let center = base + dir * (length * r as f32 / (rings - 1) as f32);
        points.extend(generate_ring_points(center, radius, dir, per_ring, jitter, sampler));
    }

    let (u, v) = dir.any_orthonormal_pair();
    let seam_samples = rings * 2;
    for seam in 0..4 {
        let angle = TAU * seam as f32 / 4.0;
        let offset = (u * angle.cos() + v * angle.sin()) * radius;
        for k in 0..seam_samples {
            let t = k as f32 / (seam_samples - 1) as f32;
            points.push(base + offset + dir * (length * t) + sampler.jitter(jitter));
        }
    }

    points
}

/// Cable between two points, sagging by `sin(t·π)·sag` at parameter `t`.
///
/// A sine sag rather than a true catenary: no tension model, just the
/// familiar droop, deepest at the midpoint and zero at both anchors.
pub fn generate_cable_points<R: Rng>(
    start: Vec3,
    end: Vec3,
    sag: f32,
    density: f32,
    jitter: f32,
    sampler: &mut Sampler<R>,
) -> Vec<Vec3> {
    let count = line_point_count(start, end, density);
    let last = (count - 1) as f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / last;
            let mut p = start.lerp(end, t);
            p.y -= (t * PI).sin() * sag;
            p + sampler.jitter(jitter)
        })
        .collect()
}
