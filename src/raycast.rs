//! Ray/triangle intersection and scanline hit collection
//!
//! Intersections use the Möller–Trumbore method in double precision so that
//! rays crossing a shared edge report the same hit from both triangles, which
//! the scanline deduplication then collapses into one crossing.

use glam::{DVec3, Vec3};

use crate::mesh::{Mesh, Triangle};

/// Determinant, hit-distance and barycentric tolerance
pub const INTERSECT_EPSILON: f64 = 1e-8;

/// Distance along the ray to the triangle, if the ray hits it in front of the
/// origin.
///
/// Triangles (near-)parallel to the ray, or degenerate ones, never hit.
pub fn intersect_ray_triangle(origin: Vec3, direction: Vec3, triangle: &Triangle) -> Option<f64> {
    let [v0, v1, v2] = triangle.vertices.map(|v| v.as_dvec3());
    let origin = origin.as_dvec3();
    let direction = direction.as_dvec3();

    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let p = direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < INTERSECT_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - v0;
    let u = s.dot(p) * inv_det;
    if !(-INTERSECT_EPSILON..=1.0 + INTERSECT_EPSILON).contains(&u) {
        return None;
    }

    let q: DVec3 = s.cross(e1);
    let v = direction.dot(q) * inv_det;
    if v < -INTERSECT_EPSILON || u + v > 1.0 + INTERSECT_EPSILON {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (t > INTERSECT_EPSILON).then_some(t)
}

/// World-X coordinates where a +X ray from `origin` crosses the mesh,
/// sorted ascending, with hits closer than `dedup_epsilon` merged.
pub fn scanline_hits(mesh: &Mesh, origin: Vec3, dedup_epsilon: f32) -> Vec<f32> {
    let mut hits: Vec<f64> = mesh
        .triangles()
        .iter()
        .filter_map(|tri| intersect_ray_triangle(origin, Vec3::X, tri))
        .map(|t| origin.x as f64 + t)
        .collect();

    hits.sort_by(f64::total_cmp);

    let mut deduped: Vec<f32> = Vec::with_capacity(hits.len());
    for hit in hits {
        let hit = hit as f32;
        match deduped.last() {
            Some(&last) if hit - last < dedup_epsilon => {}
            _ => deduped.push(hit),
        }
    }
    deduped
}
