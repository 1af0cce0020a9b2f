//! Triangle meshes, bounding boxes and mesh normalization

use glam::Vec3;

use crate::error::{LayoutError, LayoutResult};

/// A single triangle as three vertex positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }
}

/// A coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index of this axis in a `Vec3`
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Axis-aligned bounding box of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub size: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            size: max - min,
        }
    }

    /// Bounding box of a set of points, `None` when there are none
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::new(min, max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f32 {
        self.size.length()
    }

    /// Axis with the largest extent. Ties resolve in X, Y, Z order.
    pub fn principal_axis(&self) -> Axis {
        let s = self.size;
        if s.x >= s.y && s.x >= s.z {
            Axis::X
        } else if s.y >= s.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

/// An ordered collection of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create a mesh from a triangle soup
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Create a mesh from a vertex list and triangle indices
    pub fn from_indexed(vertices: &[Vec3], indices: &[u32]) -> LayoutResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(LayoutError::InvalidIndices(indices.len()));
        }

        let vertex = |i: u32| {
            vertices
                .get(i as usize)
                .copied()
                .ok_or(LayoutError::IndexOutOfRange {
                    index: i as usize,
                    len: vertices.len(),
                })
        };

        let triangles = indices
            .chunks_exact(3)
            .map(|tri| Ok(Triangle::new(vertex(tri[0])?, vertex(tri[1])?, vertex(tri[2])?)))
            .collect::<LayoutResult<Vec<_>>>()?;

        Ok(Self { triangles })
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of all vertices (a zero box at the origin for an empty mesh)
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.triangles.iter().flat_map(|t| t.vertices))
            .unwrap_or_else(|| Bounds::new(Vec3::ZERO, Vec3::ZERO))
    }

    /// Center the bounding box on the origin and scale uniformly so the
    /// largest dimension equals `target_size`.
    ///
    /// A mesh with no extent is only translated.
    pub fn normalized(&self, target_size: f32) -> (Mesh, Bounds) {
        let bounds = self.bounds();
        let center = bounds.center();
        let largest = bounds.size.max_element();
        let scale = if largest > 0.0 {
            target_size / largest
        } else {
            1.0
        };

        let triangles: Vec<Triangle> = self
            .triangles
            .iter()
            .map(|t| Triangle {
                vertices: t.vertices.map(|v| (v - center) * scale),
            })
            .collect();

        let mesh = Mesh { triangles };
        let bounds = mesh.bounds();
        (mesh, bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed_tetrahedron() -> Mesh {
        let a = Vec3::new(1.0, 1.0, 1.0);
        let b = Vec3::new(5.0, 1.0, 1.0);
        let c = Vec3::new(1.0, 3.0, 1.0);
        let d = Vec3::new(1.0, 1.0, 2.0);
        Mesh::new(vec![
            Triangle::new(a, c, b),
            Triangle::new(a, b, d),
            Triangle::new(a, d, c),
            Triangle::new(b, c, d),
        ])
    }

    #[test]
    fn normalize_centers_and_scales_largest_dimension() {
        let (mesh, bounds) = skewed_tetrahedron().normalized(10.0);

        assert_eq!(mesh.len(), 4);
        assert!(bounds.center().length() < 1e-5);
        assert!((bounds.size.x - 10.0).abs() < 1e-5);
        // Uniform scale: y extent 2 and z extent 1 scale by 10/4
        assert!((bounds.size.y - 5.0).abs() < 1e-5);
        assert!((bounds.size.z - 2.5).abs() < 1e-5);
    }

    #[test]
    fn normalize_is_deterministic() {
        let first = skewed_tetrahedron().normalized(10.0);
        let second = skewed_tetrahedron().normalized(10.0);
        assert_eq!(first, second);
    }

    #[test]
    fn normalize_flat_mesh_keeps_zero_axis() {
        let mesh = Mesh::new(vec![Triangle::new(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(4.0, 0.0, 3.0),
            Vec3::new(0.0, 2.0, 3.0),
        )]);
        let (_, bounds) = mesh.normalized(10.0);

        assert_eq!(bounds.size.z, 0.0);
        assert_eq!(bounds.min.z, 0.0);
        assert!((bounds.size.x - 10.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_point_mesh_only_translates() {
        let p = Vec3::new(2.0, -1.0, 7.0);
        let mesh = Mesh::new(vec![Triangle::new(p, p, p)]);
        let (normalized, bounds) = mesh.normalized(10.0);

        assert_eq!(normalized.triangles()[0].vertices, [Vec3::ZERO; 3]);
        assert_eq!(bounds.size, Vec3::ZERO);
    }

    #[test]
    fn empty_mesh_has_zero_bounds() {
        let mesh = Mesh::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.bounds(), Bounds::new(Vec3::ZERO, Vec3::ZERO));
    }

    #[test]
    fn from_indexed_builds_triangles() {
        let vertices = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        let mesh = Mesh::from_indexed(&vertices, &[0, 1, 2, 0, 2, 3]).unwrap();

        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.triangles()[1].vertices, [Vec3::ZERO, Vec3::Y, Vec3::Z]);
    }

    #[test]
    fn from_indexed_rejects_bad_input() {
        let vertices = [Vec3::ZERO, Vec3::X, Vec3::Y];

        assert!(matches!(
            Mesh::from_indexed(&vertices, &[0, 1]),
            Err(LayoutError::InvalidIndices(2))
        ));
        assert!(matches!(
            Mesh::from_indexed(&vertices, &[0, 1, 3]),
            Err(LayoutError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn principal_axis_picks_largest_extent() {
        let b = Bounds::new(Vec3::ZERO, Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(b.principal_axis(), Axis::Y);

        let b = Bounds::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 3.0));
        assert_eq!(b.principal_axis(), Axis::Z);

        // Cube: ties resolve to X
        let b = Bounds::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(b.principal_axis(), Axis::X);
        assert!((b.diagonal() - 12.0_f32.sqrt()).abs() < 1e-6);
    }
}
