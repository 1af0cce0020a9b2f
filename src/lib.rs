//! voxlayout - volumetric layout of layered nodes inside a closed triangle mesh.
//!
//! A mesh is normalized and voxelized into an inside/outside grid, nodes are
//! seeded at interior points near per-layer targets, and a force simulation
//! relaxes them while keeping every committed position inside the volume.
//! [`engine::LayoutEngine`] ties these stages together.

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod raycast;
pub mod sampler;
pub mod simulation;
pub mod types;
pub mod voxel;
