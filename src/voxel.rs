//! Voxelization of a normalized mesh into an inside/outside grid
//!
//! [`VoxelJob`] is a resumable unit of work: every call to
//! [`VoxelJob::advance`] classifies a few grid rows and hands control back to
//! the caller together with a progress report. The grid only becomes visible
//! once the final row is done, so abandoning a job (dropping it) can never
//! leave a half-built grid behind.

use std::sync::Arc;

use glam::Vec3;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::{debug, info, warn};

use crate::config::VoxelConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::mesh::{Bounds, Mesh};
use crate::raycast::scanline_hits;

/// Integer cell coordinate that may lie outside the grid
pub type CellIndex = [i64; 3];

/// A G×G×G boolean grid over a bounding box; `true` marks interior cells
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    resolution: usize,
    bounds: Bounds,
    cell_size: Vec3,
    cells: Vec<bool>,
}

impl VoxelGrid {
    fn new(resolution: usize, bounds: Bounds, cells: Vec<bool>) -> Self {
        Self {
            resolution,
            bounds,
            cell_size: bounds.size / resolution as f32,
            cells,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    fn flat_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + self.resolution * (iy + self.resolution * iz)
    }

    /// Interior test for an in-grid cell
    pub fn is_inside(&self, ix: usize, iy: usize, iz: usize) -> bool {
        ix < self.resolution
            && iy < self.resolution
            && iz < self.resolution
            && self.cells[self.flat_index(ix, iy, iz)]
    }

    /// Interior test for any cell coordinate; cells outside the grid are exterior
    pub fn is_inside_cell(&self, cell: CellIndex) -> bool {
        let r = self.resolution as i64;
        if cell.iter().any(|&c| c < 0 || c >= r) {
            return false;
        }
        self.is_inside(cell[0] as usize, cell[1] as usize, cell[2] as usize)
    }

    /// Cell coordinate containing `point`, unclamped.
    ///
    /// Along an axis with no extent only the exact bounds coordinate maps to
    /// cell 0; anything else maps outside the grid.
    pub fn cell_index_of(&self, point: Vec3) -> CellIndex {
        let rel = point - self.bounds.min;
        let axis = |i: usize| {
            if self.cell_size[i] > 0.0 {
                (rel[i] / self.cell_size[i]).floor() as i64
            } else if rel[i] == 0.0 {
                0
            } else {
                -1
            }
        };
        [axis(0), axis(1), axis(2)]
    }

    /// In-grid cell containing `point`, if any
    pub fn cell_of(&self, point: Vec3) -> Option<[usize; 3]> {
        if !point.is_finite() {
            return None;
        }
        let r = self.resolution as i64;
        let cell = self.cell_index_of(point);
        cell.iter()
            .all(|&c| (0..r).contains(&c))
            .then(|| cell.map(|c| c as usize))
    }

    /// World-space center of a cell; extrapolates for cells outside the grid
    pub fn cell_center(&self, cell: CellIndex) -> Vec3 {
        let offset = Vec3::new(cell[0] as f32, cell[1] as f32, cell[2] as f32) + Vec3::splat(0.5);
        self.bounds.min + offset * self.cell_size
    }

    /// Point-in-solid test. Non-finite points are exterior.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.cell_of(point)
            .is_some_and(|[ix, iy, iz]| self.is_inside(ix, iy, iz))
    }

    /// Number of interior cells
    pub fn inside_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Fraction of cells classified interior
    pub fn fill_ratio(&self) -> f32 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.inside_count() as f32 / self.cells.len() as f32
    }

    /// Interior cells in z, y, x order
    pub fn inside_cells(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let r = self.resolution;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &inside)| inside)
            .map(move |(i, _)| [i % r, (i / r) % r, i / (r * r)])
    }
}

/// Interior cell coordinates in shuffled order, for uniform sampling
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsideCache {
    cells: Vec<[usize; 3]>,
}

impl InsideCache {
    /// Collect every interior cell of `grid` and shuffle with a fixed seed
    pub fn build(grid: &VoxelGrid, seed: u64) -> Self {
        let mut cells: Vec<[usize; 3]> = grid.inside_cells().collect();
        let mut rng = StdRng::seed_from_u64(seed);
        cells.shuffle(&mut rng);
        Self { cells }
    }

    pub fn cells(&self) -> &[[usize; 3]] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Progress report handed back at every yield point
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelProgress {
    /// Completed fraction, 0.0 to 1.0
    pub fraction: f32,
    pub label: String,
}

/// Finished voxelization output
#[derive(Debug, Clone)]
pub struct Voxelized {
    pub grid: VoxelGrid,
    pub cache: InsideCache,
}

/// Result of advancing a [`VoxelJob`] by one slice
#[derive(Debug)]
pub enum VoxelStep {
    /// More rows remain; call [`VoxelJob::advance`] again to continue
    Yield(VoxelJob, VoxelProgress),
    /// Every row has been classified
    Done(Voxelized),
}

/// Resumable scanline voxelizer
#[derive(Debug)]
pub struct VoxelJob {
    mesh: Arc<Mesh>,
    bounds: Bounds,
    config: VoxelConfig,
    cells: Vec<bool>,
    next_row: usize,
    odd_scanlines: usize,
}

impl VoxelJob {
    /// Prepare a job over `bounds` (normally the normalized mesh bounds)
    pub fn new(mesh: Arc<Mesh>, bounds: Bounds, config: VoxelConfig) -> LayoutResult<Self> {
        if config.resolution == 0 {
            return Err(LayoutError::InvalidResolution(config.resolution));
        }
        let r = config.resolution;
        Ok(Self {
            mesh,
            bounds,
            cells: vec![false; r * r * r],
            config,
            next_row: 0,
            odd_scanlines: 0,
        })
    }

    /// Fraction of rows classified so far
    pub fn progress(&self) -> f32 {
        self.next_row as f32 / self.config.resolution as f32
    }

    /// Classify the next slice of rows, then yield or finish
    pub fn advance(mut self) -> VoxelStep {
        let r = self.config.resolution;
        let end = (self.next_row + self.config.rows_per_slice.max(1)).min(r);

        for iz in self.next_row..end {
            self.classify_row(iz);
        }
        self.next_row = end;

        if self.next_row < r {
            let progress = VoxelProgress {
                fraction: self.progress(),
                label: format!("Voxelizing {}/{} rows", self.next_row, r),
            };
            debug!(row = self.next_row, of = r, "voxelizer yielded");
            return VoxelStep::Yield(self, progress);
        }

        VoxelStep::Done(self.finish())
    }

    /// Drive the job synchronously to the end
    pub fn run_to_completion(self) -> Voxelized {
        let mut job = self;
        loop {
            match job.advance() {
                VoxelStep::Yield(next, _) => job = next,
                VoxelStep::Done(out) => return out,
            }
        }
    }

    /// Fill every scanline of the Z row `iz` using the even-odd rule
    fn classify_row(&mut self, iz: usize) {
        let r = self.config.resolution;
        let min = self.bounds.min;
        let cell = self.bounds.size / r as f32;
        let cz = min.z + (iz as f32 + 0.5) * cell.z;

        for iy in 0..r {
            let cy = min.y + (iy as f32 + 0.5) * cell.y;
            let origin = Vec3::new(min.x - 1.0, cy, cz);
            let hits = scanline_hits(&self.mesh, origin, self.config.dedup_epsilon);

            if hits.len() % 2 == 1 {
                self.odd_scanlines += 1;
            }

            for span in hits.chunks_exact(2) {
                let (enter, exit) = (span[0], span[1]);
                for ix in 0..r {
                    let cx = min.x + (ix as f32 + 0.5) * cell.x;
                    if cx >= enter && cx <= exit {
                        self.cells[ix + r * (iy + r * iz)] = true;
                    }
                }
            }
        }
    }

    fn finish(self) -> Voxelized {
        if self.odd_scanlines > 0 {
            warn!(
                odd_scanlines = self.odd_scanlines,
                "mesh is not watertight; unmatched crossings were discarded"
            );
        }

        let grid = VoxelGrid::new(self.config.resolution, self.bounds, self.cells);
        let cache = InsideCache::build(&grid, self.config.shuffle_seed);
        info!(
            resolution = grid.resolution(),
            inside = cache.len(),
            fill = grid.fill_ratio(),
            "voxelization complete"
        );
        Voxelized { grid, cache }
    }
}

/// Voxelize synchronously over the mesh's own bounds
pub fn voxelize(mesh: Arc<Mesh>, config: VoxelConfig) -> LayoutResult<Voxelized> {
    let bounds = mesh.bounds();
    Ok(VoxelJob::new(mesh, bounds, config)?.run_to_completion())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{cuboid, icosphere};
    use crate::mesh::Triangle;

    fn config(resolution: usize) -> VoxelConfig {
        VoxelConfig {
            resolution,
            ..VoxelConfig::default()
        }
    }

    fn normalized(mesh: Mesh) -> Arc<Mesh> {
        Arc::new(mesh.normalized(10.0).0)
    }

    #[test]
    fn cube_filling_its_bounds_is_fully_interior() {
        let mesh = normalized(cuboid(Vec3::ZERO, Vec3::splat(2.0)));
        let out = voxelize(mesh, config(32)).unwrap();

        assert_eq!(out.grid.inside_count(), 32 * 32 * 32);
        assert_eq!(out.cache.len(), 32 * 32 * 32);
    }

    #[test]
    fn cube_inside_larger_bounds_matches_within_one_cell() {
        let half = 2.0;
        let mesh = Arc::new(cuboid(Vec3::splat(-half), Vec3::splat(half)));
        let bounds = Bounds::new(Vec3::splat(-5.0), Vec3::splat(5.0));
        let out = VoxelJob::new(mesh, bounds, config(32))
            .unwrap()
            .run_to_completion();
        let grid = &out.grid;
        let cell = grid.cell_size().max_element();

        for iz in 0..32 {
            for iy in 0..32 {
                for ix in 0..32 {
                    let c = grid.cell_center([ix, iy, iz]);
                    let extent = c.abs().max_element();
                    let inside = grid.is_inside(ix as usize, iy as usize, iz as usize);
                    if extent < half - cell {
                        assert!(inside, "cell {:?} at {:?} should be interior", [ix, iy, iz], c);
                    } else if extent > half + cell {
                        assert!(!inside, "cell {:?} at {:?} should be exterior", [ix, iy, iz], c);
                    }
                }
            }
        }
    }

    #[test]
    fn watertight_cube_scanlines_have_even_hits() {
        let mesh = cuboid(Vec3::splat(-3.0), Vec3::splat(3.0));
        let bounds = Bounds::new(Vec3::splat(-5.0), Vec3::splat(5.0));
        let r = 32;
        let cell = bounds.size / r as f32;

        for iz in 0..r {
            for iy in 0..r {
                let origin = Vec3::new(
                    bounds.min.x - 1.0,
                    bounds.min.y + (iy as f32 + 0.5) * cell.y,
                    bounds.min.z + (iz as f32 + 0.5) * cell.z,
                );
                let hits = scanline_hits(&mesh, origin, 1e-5);
                assert_eq!(hits.len() % 2, 0, "odd hits on scanline ({iy}, {iz})");
            }
        }
    }

    #[test]
    fn sphere_classification_follows_radius() {
        let mesh = normalized(icosphere(2, 1.0));
        let radius = mesh
            .triangles()
            .iter()
            .flat_map(|t| t.vertices)
            .map(|v| v.length())
            .fold(0.0_f32, f32::max);
        let out = voxelize(mesh, config(24)).unwrap();
        let grid = &out.grid;
        let diag = grid.cell_size().length();

        for [ix, iy, iz] in (0..24usize).flat_map(|z| {
            (0..24usize).flat_map(move |y| (0..24usize).map(move |x| [x, y, z]))
        }) {
            let d = grid.cell_center([ix as i64, iy as i64, iz as i64]).length();
            let inside = grid.is_inside(ix, iy, iz);
            if d < 0.9 * radius - diag {
                assert!(inside, "cell at distance {d} should be interior");
            } else if d > radius + diag {
                assert!(!inside, "cell at distance {d} should be exterior");
            }
        }
    }

    #[test]
    fn job_yields_every_four_rows_with_progress() {
        let mesh = normalized(cuboid(Vec3::ZERO, Vec3::ONE));
        let bounds = mesh.bounds();
        let mut job = VoxelJob::new(mesh, bounds, config(16)).unwrap();
        let mut fractions = Vec::new();

        let out = loop {
            match job.advance() {
                VoxelStep::Yield(next, progress) => {
                    assert!(progress.label.contains("/16"));
                    fractions.push(progress.fraction);
                    job = next;
                }
                VoxelStep::Done(out) => break out,
            }
        };

        assert_eq!(fractions, vec![0.25, 0.5, 0.75]);
        assert_eq!(out.grid.resolution(), 16);
    }

    #[test]
    fn open_mesh_degrades_to_partial_fill() {
        // Cube with the +x face removed: every crossing scanline has one hit
        let cube = cuboid(Vec3::splat(-1.0), Vec3::splat(1.0));
        let open: Vec<Triangle> = cube
            .triangles()
            .iter()
            .filter(|t| !t.vertices.iter().all(|v| v.x == 1.0))
            .copied()
            .collect();
        assert_eq!(open.len(), 10);

        let out = voxelize(normalized(Mesh::new(open)), config(8)).unwrap();
        assert!(out.grid.inside_count() < 8 * 8 * 8);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let mesh = Arc::new(cuboid(Vec3::ZERO, Vec3::ONE));
        assert!(matches!(
            voxelize(mesh, config(0)),
            Err(LayoutError::InvalidResolution(0))
        ));
    }

    #[test]
    fn cache_is_shuffled_deterministically() {
        let mesh = normalized(icosphere(1, 1.0));
        let a = voxelize(mesh.clone(), config(12)).unwrap();
        let b = voxelize(mesh, config(12)).unwrap();

        assert_eq!(a.cache, b.cache);

        let mut shuffled = a.cache.cells().to_vec();
        let ordered: Vec<[usize; 3]> = a.grid.inside_cells().collect();
        assert_ne!(shuffled, ordered);
        shuffled.sort_by_key(|c| (c[2], c[1], c[0]));
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn point_queries_map_to_cells() {
        let mesh = normalized(cuboid(Vec3::ZERO, Vec3::ONE));
        let out = voxelize(mesh, config(10)).unwrap();
        let grid = &out.grid;

        assert_eq!(grid.cell_of(Vec3::new(-4.95, -4.95, -4.95)), Some([0, 0, 0]));
        assert_eq!(grid.cell_of(Vec3::new(4.95, 0.05, -0.05)), Some([9, 5, 4]));
        assert_eq!(grid.cell_of(Vec3::new(5.5, 0.0, 0.0)), None);
        assert!(grid.contains_point(Vec3::ZERO));
        assert!(!grid.contains_point(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(!grid.contains_point(Vec3::splat(f32::INFINITY)));
        assert!(!grid.is_inside_cell([-1, 0, 0]));
        assert!(!grid.is_inside_cell([0, 10, 0]));

        let center = grid.cell_center([-1, 0, 0]);
        assert!((center.x + 5.5).abs() < 1e-5);
    }
}
