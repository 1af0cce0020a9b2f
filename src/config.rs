//! Layout configuration and default constants
//!
//! Every tunable used by the voxelizer, the sampler and the force simulation
//! lives here. All structs deserialize with `#[serde(default)]`, so a config
//! file only needs to name the values it overrides.

use serde::{Deserialize, Serialize};

// =============================================================================
// Default Constants
// =============================================================================

/// Largest bounding-box dimension of a normalized mesh
pub const DEFAULT_TARGET_SIZE: f32 = 10.0;

/// Cells per axis of the voxel grid
pub const DEFAULT_RESOLUTION: usize = 32;

/// Grid rows (Z slices of scanlines) processed before the voxelizer yields
pub const DEFAULT_ROWS_PER_SLICE: usize = 4;

/// Ray hits closer than this along X are treated as one crossing
pub const DEFAULT_DEDUP_EPSILON: f32 = 1e-5;

/// Seed for the interior-cache shuffle
pub const DEFAULT_SHUFFLE_SEED: u64 = 0x5eed_cafe;

/// Pairwise repulsion coefficient
pub const DEFAULT_REPULSION: f32 = 2.0;

/// Pull toward the layer target (kept low relative to repulsion)
pub const DEFAULT_LAYER_GUIDANCE: f32 = 0.05;

/// Push away from exterior cells near a node
pub const DEFAULT_BOUNDARY: f32 = 0.02;

/// Velocity multiplier applied every substep
pub const DEFAULT_DAMPING: f32 = 0.9;

/// Squared-distance floor for every inverse-square force (avoids singularity)
pub const DEFAULT_MIN_DISTANCE_SQ: f32 = 0.3;

/// Half extent of the boundary neighborhood; 2 gives a 5x5x5 block
pub const DEFAULT_BOUNDARY_RADIUS: i64 = 2;

/// Velocity factor applied when a step is reverted at the boundary
pub const DEFAULT_BOUNCE: f32 = -0.3;

/// Substeps per external tick
pub const DEFAULT_SUBSTEPS: usize = 3;

/// Fixed integration delta of one substep
pub const DEFAULT_SUBSTEP_DT: f32 = 0.05;

/// Random probes around a target before falling back to the cache
pub const DEFAULT_MAX_TRIES: usize = 40;

/// Probe spread as a fraction of the bounds diagonal
pub const DEFAULT_SPREAD_FACTOR: f32 = 0.25;

/// Cache entries scanned by the nearest-cell fallback
pub const DEFAULT_FALLBACK_SAMPLES: usize = 60;

/// Seed for node placement
pub const DEFAULT_SAMPLER_SEED: u64 = 42;

/// Fraction of the principal axis left free at each end when placing layers
pub const DEFAULT_LAYER_INSET: f32 = 0.13;

/// X distance between adjacent layers in the layout used without a mesh
pub const DEFAULT_LAYER_SPACING: f32 = 4.0;

/// Grid pitch of nodes within a layer in the layout used without a mesh
pub const DEFAULT_NODE_SPACING: f32 = 1.0;

/// Voxelizer settings. Changing any of these requires re-voxelization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelConfig {
    /// Cells per axis (grid is resolution^3)
    pub resolution: usize,
    /// Rows processed per cooperative slice
    pub rows_per_slice: usize,
    /// Minimum X separation between distinct ray hits
    pub dedup_epsilon: f32,
    /// Seed for the interior-cache shuffle
    pub shuffle_seed: u64,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            rows_per_slice: DEFAULT_ROWS_PER_SLICE,
            dedup_epsilon: DEFAULT_DEDUP_EPSILON,
            shuffle_seed: DEFAULT_SHUFFLE_SEED,
        }
    }
}

/// Force simulation settings. Read at the start of every substep, so edits
/// take effect immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub repulsion: f32,
    pub layer_guidance: f32,
    pub boundary: f32,
    pub damping: f32,
    pub min_distance_sq: f32,
    /// Neighborhood half extent in cells for the boundary force
    pub boundary_radius: i64,
    pub bounce: f32,
    pub substeps: usize,
    pub substep_dt: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            repulsion: DEFAULT_REPULSION,
            layer_guidance: DEFAULT_LAYER_GUIDANCE,
            boundary: DEFAULT_BOUNDARY,
            damping: DEFAULT_DAMPING,
            min_distance_sq: DEFAULT_MIN_DISTANCE_SQ,
            boundary_radius: DEFAULT_BOUNDARY_RADIUS,
            bounce: DEFAULT_BOUNCE,
            substeps: DEFAULT_SUBSTEPS,
            substep_dt: DEFAULT_SUBSTEP_DT,
        }
    }
}

/// Inside-point sampler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub max_tries: usize,
    pub spread_factor: f32,
    pub fallback_samples: usize,
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            spread_factor: DEFAULT_SPREAD_FACTOR,
            fallback_samples: DEFAULT_FALLBACK_SAMPLES,
            seed: DEFAULT_SAMPLER_SEED,
        }
    }
}

/// Top-level configuration for a [`crate::engine::LayoutEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Largest dimension of the normalized mesh
    pub target_size: f32,
    /// Fraction of the principal axis kept free at each end for layer targets
    pub layer_inset: f32,
    pub voxel: VoxelConfig,
    pub simulation: SimulationConfig,
    pub sampler: SamplerConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            layer_inset: DEFAULT_LAYER_INSET,
            voxel: VoxelConfig::default(),
            simulation: SimulationConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}
