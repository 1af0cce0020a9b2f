//! Closed primitive meshes
//!
//! Watertight shapes used as built-in volumes by the CLI and as fixtures for
//! voxelization and simulation tests.

use glam::Vec3;
use std::collections::HashMap;

use crate::mesh::{Mesh, Triangle};

/// Generate a closed icosphere with the given subdivision level and radius.
///
/// # Arguments
///
/// * `subdivisions` - Number of subdivision iterations:
///   - 0: 12 vertices, 20 faces (basic icosahedron)
///   - 1: 42 vertices, 80 faces
///   - 2: 162 vertices, 320 faces
///   - 3: 642 vertices, 1280 faces
/// * `radius` - Distance of every vertex from the origin
///
/// # Example
///
/// ```
/// use voxlayout::geometry::icosphere;
///
/// let mesh = icosphere(2, 1.0);
/// assert_eq!(mesh.len(), 320);
/// ```
pub fn icosphere(subdivisions: u32, radius: f32) -> Mesh {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut vertices: Vec<Vec3> = [
        [-1.0, phi, 0.0],
        [1.0, phi, 0.0],
        [-1.0, -phi, 0.0],
        [1.0, -phi, 0.0],
        [0.0, -1.0, phi],
        [0.0, 1.0, phi],
        [0.0, -1.0, -phi],
        [0.0, 1.0, -phi],
        [phi, 0.0, -1.0],
        [phi, 0.0, 1.0],
        [-phi, 0.0, -1.0],
        [-phi, 0.0, 1.0],
    ]
    .into_iter()
    .map(|v| Vec3::from_array(v).normalize())
    .collect();

    let mut faces: Vec<[u32; 3]> = vec![
        // 5 faces around point 0
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        // 5 adjacent faces
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        // 5 faces around point 3
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        // 5 adjacent faces
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut new_faces = Vec::with_capacity(faces.len() * 4);
        let mut midpoint_cache: HashMap<(u32, u32), u32> = HashMap::new();

        for &[v1, v2, v3] in &faces {
            let a = midpoint(v1, v2, &mut vertices, &mut midpoint_cache);
            let b = midpoint(v2, v3, &mut vertices, &mut midpoint_cache);
            let c = midpoint(v3, v1, &mut vertices, &mut midpoint_cache);

            new_faces.push([v1, a, c]);
            new_faces.push([v2, b, a]);
            new_faces.push([v3, c, b]);
            new_faces.push([a, b, c]);
        }

        faces = new_faces;
    }

    let triangles = faces
        .iter()
        .map(|f| {
            Triangle::new(
                vertices[f[0] as usize] * radius,
                vertices[f[1] as usize] * radius,
                vertices[f[2] as usize] * radius,
            )
        })
        .collect();

    Mesh::new(triangles)
}

/// Shared midpoint vertex of an edge, projected back onto the unit sphere.
/// Sharing keeps the subdivided surface watertight.
fn midpoint(
    v1: u32,
    v2: u32,
    vertices: &mut Vec<Vec3>,
    cache: &mut HashMap<(u32, u32), u32>,
) -> u32 {
    let key = if v1 < v2 { (v1, v2) } else { (v2, v1) };

    if let Some(&index) = cache.get(&key) {
        return index;
    }

    let mid = ((vertices[v1 as usize] + vertices[v2 as usize]) * 0.5).normalize_or(Vec3::Z);

    let index = vertices.len() as u32;
    vertices.push(mid);
    cache.insert(key, index);
    index
}

/// Generate a closed axis-aligned box spanning `min..max` (12 triangles)
pub fn cuboid(min: Vec3, max: Vec3) -> Mesh {
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };

    // Quads as corner indices (bit 0 = x, bit 1 = y, bit 2 = z), wound outward
    const QUADS: [[usize; 4]; 6] = [
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
    ];

    let triangles = QUADS
        .iter()
        .flat_map(|&[a, b, c, d]| {
            [
                Triangle::new(corner(a), corner(b), corner(c)),
                Triangle::new(corner(a), corner(c), corner(d)),
            ]
        })
        .collect();

    Mesh::new(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icosphere_face_counts() {
        assert_eq!(icosphere(0, 1.0).len(), 20);
        assert_eq!(icosphere(1, 1.0).len(), 80);
        assert_eq!(icosphere(2, 1.0).len(), 320);
        assert_eq!(icosphere(3, 1.0).len(), 1280);
    }

    #[test]
    fn test_icosphere_vertices_on_sphere() {
        let mesh = icosphere(2, 3.0);
        for tri in mesh.triangles() {
            for v in tri.vertices {
                assert!(
                    (v.length() - 3.0).abs() < 0.001,
                    "Vertex at {:?} has length {} (expected 3.0)",
                    v,
                    v.length()
                );
            }
        }
    }

    #[test]
    fn test_icosphere_edges_are_shared() {
        // Every edge of a closed surface belongs to exactly two triangles
        let mesh = icosphere(1, 1.0);
        let key = |v: Vec3| (v * 1e4).round().as_ivec3().to_array();
        let mut edges: HashMap<([i32; 3], [i32; 3]), usize> = HashMap::new();

        for tri in mesh.triangles() {
            for i in 0..3 {
                let (a, b) = (key(tri.vertices[i]), key(tri.vertices[(i + 1) % 3]));
                let edge = if a < b { (a, b) } else { (b, a) };
                *edges.entry(edge).or_default() += 1;
            }
        }

        assert!(edges.values().all(|&count| count == 2));
    }

    #[test]
    fn test_cuboid_spans_bounds() {
        let mesh = cuboid(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 1.0, 4.0));
        let bounds = mesh.bounds();

        assert_eq!(mesh.len(), 12);
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 2.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 4.0));
    }

    #[test]
    fn test_cuboid_faces_are_non_degenerate() {
        let mesh = cuboid(Vec3::ZERO, Vec3::ONE);
        for tri in mesh.triangles() {
            let [a, b, c] = tri.vertices;
            assert!((b - a).cross(c - a).length() > 0.5);
        }
    }
}
