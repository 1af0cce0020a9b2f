//! Interior seed-point sampling
//!
//! Nodes are seeded by probing random points around a target and keeping the
//! first one the voxel grid classifies as interior. When every probe misses,
//! a bounded random subset of the interior cache is scanned for the cell
//! closest to the target instead.

use glam::Vec3;
use rand::Rng;
use tracing::debug;

use crate::config::SamplerConfig;
use crate::voxel::{InsideCache, VoxelGrid};

/// Finds interior points near arbitrary targets
pub struct InsideSampler<'a> {
    grid: &'a VoxelGrid,
    cache: &'a InsideCache,
    config: &'a SamplerConfig,
}

impl<'a> InsideSampler<'a> {
    pub fn new(grid: &'a VoxelGrid, cache: &'a InsideCache, config: &'a SamplerConfig) -> Self {
        Self {
            grid,
            cache,
            config,
        }
    }

    /// Half-width of the random probe box around a target
    pub fn spread(&self) -> f32 {
        self.config.spread_factor * self.grid.bounds().diagonal()
    }

    /// An interior point near `target`, or `None` when the volume is empty
    pub fn sample_near(&self, target: Vec3, rng: &mut impl Rng) -> Option<Vec3> {
        let spread = self.spread();

        for _ in 0..self.config.max_tries {
            let offset = if spread > 0.0 {
                Vec3::new(
                    rng.random_range(-spread..=spread),
                    rng.random_range(-spread..=spread),
                    rng.random_range(-spread..=spread),
                )
            } else {
                Vec3::ZERO
            };
            let candidate = target + offset;
            if self.grid.contains_point(candidate) {
                return Some(candidate);
            }
        }

        debug!(?target, "probes exhausted, falling back to interior cache");
        self.nearest_cached(target, rng)
    }

    /// Closest cell center among a random subset of the cache
    fn nearest_cached(&self, target: Vec3, rng: &mut impl Rng) -> Option<Vec3> {
        if self.cache.is_empty() {
            return None;
        }

        let cells = self.cache.cells();
        (0..self.config.fallback_samples.max(1))
            .map(|_| {
                let [x, y, z] = cells[rng.random_range(0..cells.len())];
                self.grid.cell_center([x as i64, y as i64, z as i64])
            })
            .min_by(|a, b| {
                a.distance_squared(target)
                    .total_cmp(&b.distance_squared(target))
            })
    }
}
