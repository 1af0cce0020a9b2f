//! Layout engine: mesh loading, voxelization, seeding and ticking
//!
//! The engine owns every piece of mutable state. Voxelization is driven
//! cooperatively through [`LayoutEngine::poll`], and the finished grid is
//! swapped in with a single assignment, so a newer load simply replaces the
//! pending job and the old grid stays in place until the new one is ready.

use std::sync::Arc;

use glam::Vec3;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_LAYER_SPACING, DEFAULT_NODE_SPACING, LayoutConfig};
use crate::error::{LayoutError, LayoutResult};
use crate::mesh::Mesh;
use crate::sampler::InsideSampler;
use crate::simulation::{ForceSimulation, LayerTargets, Node};
use crate::types::{NodeInstance, instances_from_layers};
use crate::voxel::{VoxelGrid, VoxelJob, VoxelStep, Voxelized};

/// Lifecycle of a [`LayoutEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No mesh; nodes sit in the default layout
    Unloaded,
    /// A voxelization job is pending
    Voxelizing,
    /// Grid available, nodes not yet seeded inside it
    Ready,
    /// Nodes placed inside the volume
    Seeded,
    Running,
    Stopped,
}

pub type ProgressCallback = Box<dyn FnMut(f32, &str)>;
pub type ReadyCallback = Box<dyn FnMut(&Mesh)>;
pub type TickCallback = Box<dyn FnMut(&[Vec<Vec3>])>;

/// Nodes for the layout shown when no mesh is loaded.
///
/// Layers line up along X, centered on the origin. Within a layer nodes fill
/// a square YZ grid, y varying fastest.
pub fn default_layout(layer_sizes: &[usize]) -> Vec<Node> {
    let layer_count = layer_sizes.len() as f32;

    layer_sizes
        .iter()
        .enumerate()
        .flat_map(|(layer, &size)| {
            let x = (layer as f32 - (layer_count - 1.0) / 2.0) * DEFAULT_LAYER_SPACING;
            let side = (size as f32).sqrt().ceil().max(1.0) as usize;
            let half = (side as f32 - 1.0) / 2.0;

            (0..size).map(move |index| {
                let y = ((index % side) as f32 - half) * DEFAULT_NODE_SPACING;
                let z = ((index / side) as f32 - half) * DEFAULT_NODE_SPACING;
                Node::new(Vec3::new(x, y, z), layer, index)
            })
        })
        .collect()
}

/// Drives layered nodes from a mesh to a settled volumetric layout
pub struct LayoutEngine {
    config: LayoutConfig,
    state: EngineState,
    /// Normalized mesh of the most recent load
    mesh: Option<Arc<Mesh>>,
    job: Option<VoxelJob>,
    volume: Option<Voxelized>,
    layer_sizes: Vec<usize>,
    targets: LayerTargets,
    simulation: ForceSimulation,
    rng: StdRng,
    on_progress: Option<ProgressCallback>,
    on_ready: Option<ReadyCallback>,
    on_tick: Option<TickCallback>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.sampler.seed);
        Self {
            config,
            state: EngineState::Unloaded,
            mesh: None,
            job: None,
            volume: None,
            layer_sizes: Vec::new(),
            targets: LayerTargets::default(),
            simulation: ForceSimulation::default(),
            rng,
            on_progress: None,
            on_ready: None,
            on_tick: None,
        }
    }

    /// Called with `(fraction, label)` while voxelizing
    pub fn on_progress(&mut self, callback: impl FnMut(f32, &str) + 'static) {
        self.on_progress = Some(Box::new(callback));
    }

    /// Called with the normalized mesh once its grid is available
    pub fn on_ready(&mut self, callback: impl FnMut(&Mesh) + 'static) {
        self.on_ready = Some(Box::new(callback));
    }

    /// Called after every tick with positions grouped by layer
    pub fn on_tick(&mut self, callback: impl FnMut(&[Vec<Vec3>]) + 'static) {
        self.on_tick = Some(Box::new(callback));
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Simulation coefficients are read at every substep, so edits here take
    /// effect on the next tick. Voxel settings only apply to the next load.
    pub fn config_mut(&mut self) -> &mut LayoutConfig {
        &mut self.config
    }

    /// Normalized mesh of the latest load
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_deref()
    }

    pub fn grid(&self) -> Option<&VoxelGrid> {
        self.volume.as_ref().map(|v| &v.grid)
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn targets(&self) -> &LayerTargets {
        &self.targets
    }

    pub fn nodes(&self) -> &[Node] {
        &self.simulation.nodes
    }

    /// Mean squared node speed after the last tick
    pub fn kinetic_energy(&self) -> f32 {
        self.simulation.kinetic_energy()
    }

    /// Current positions grouped by layer
    pub fn positions(&self) -> Vec<Vec<Vec3>> {
        self.simulation.positions_by_layer(self.layer_sizes.len())
    }

    /// Current positions packed for rendering
    pub fn instances(&self) -> Vec<NodeInstance> {
        instances_from_layers(&self.positions())
    }

    /// Normalize `mesh` and start voxelizing it.
    ///
    /// Ticking halts immediately. Any job still pending is discarded; the
    /// previous grid remains until the new one completes.
    pub fn load_mesh(&mut self, mesh: Mesh) -> LayoutResult<()> {
        self.halt();

        info!(triangles = mesh.len(), "normalizing mesh");
        let (normalized, _) = mesh.normalized(self.config.target_size);
        self.mesh = Some(Arc::new(normalized));
        self.start_job()
    }

    /// Re-voxelize the loaded mesh at a new grid resolution
    pub fn set_resolution(&mut self, resolution: usize) -> LayoutResult<()> {
        if resolution == 0 {
            return Err(LayoutError::InvalidResolution(resolution));
        }
        if self.mesh.is_none() {
            return Err(LayoutError::NoMesh);
        }

        self.halt();
        self.config.voxel.resolution = resolution;
        self.start_job()
    }

    fn start_job(&mut self) -> LayoutResult<()> {
        let mesh = self.mesh.clone().ok_or(LayoutError::NoMesh)?;
        let bounds = mesh.bounds();
        let job = VoxelJob::new(mesh, bounds, self.config.voxel.clone())?;

        if self.job.replace(job).is_some() {
            debug!("pending voxelization replaced");
        }
        self.state = EngineState::Voxelizing;
        info!(
            resolution = self.config.voxel.resolution,
            "voxelization started"
        );
        self.emit_progress(0.0, "Normalizing mesh");
        Ok(())
    }

    fn halt(&mut self) {
        if self.state == EngineState::Running {
            self.state = EngineState::Stopped;
            info!("simulation halted");
        }
    }

    fn emit_progress(&mut self, fraction: f32, label: &str) {
        if let Some(callback) = self.on_progress.as_mut() {
            callback(fraction, label);
        }
    }

    /// Advance pending voxelization by one slice.
    ///
    /// Returns `true` while more work remains.
    pub fn poll(&mut self) -> bool {
        let Some(job) = self.job.take() else {
            return false;
        };

        match job.advance() {
            VoxelStep::Yield(job, progress) => {
                self.job = Some(job);
                self.emit_progress(progress.fraction, &progress.label);
                true
            }
            VoxelStep::Done(volume) => {
                self.volume = Some(volume);
                self.state = EngineState::Ready;
                self.emit_progress(1.0, "Voxelization complete");

                if let (Some(callback), Some(mesh)) =
                    (self.on_ready.as_mut(), self.mesh.as_deref())
                {
                    callback(mesh);
                }
                if !self.layer_sizes.is_empty() {
                    self.seed_volume();
                }
                false
            }
        }
    }

    /// Poll until the pending job, if any, completes
    pub fn run_voxelization(&mut self) {
        while self.poll() {}
    }

    /// Replace the layer-size sequence.
    ///
    /// With a grid available the nodes are reseeded inside it without
    /// re-voxelizing; otherwise they move to the default layout.
    pub fn set_layer_sizes(&mut self, sizes: &[usize]) -> LayoutResult<()> {
        if let Some(layer) = sizes.iter().position(|&n| n == 0) {
            return Err(LayoutError::InvalidLayerSize { layer });
        }
        self.layer_sizes = sizes.to_vec();

        if self.job.is_some() {
            debug!("layer sizes stored; seeding after voxelization");
        } else if self.volume.is_some() {
            let resume = self.state == EngineState::Running;
            self.seed_volume();
            if resume {
                self.state = EngineState::Running;
            }
        } else {
            self.simulation = ForceSimulation::new(default_layout(&self.layer_sizes));
        }
        Ok(())
    }

    /// Place one node per layer slot inside the voxelized volume
    pub fn seed(&mut self) -> LayoutResult<()> {
        if self.volume.is_none() {
            return Err(LayoutError::NoMesh);
        }
        if self.job.is_some() {
            debug!("seed deferred until voxelization completes");
            return Ok(());
        }
        self.seed_volume();
        Ok(())
    }

    fn seed_volume(&mut self) {
        let Some(volume) = self.volume.as_ref() else {
            return;
        };

        let targets = LayerTargets::along_principal_axis(
            volume.grid.bounds(),
            self.layer_sizes.len(),
            self.config.layer_inset,
        );
        let sampler = InsideSampler::new(&volume.grid, &volume.cache, &self.config.sampler);

        let mut nodes = Vec::with_capacity(self.layer_sizes.iter().sum());
        let mut dropped = 0;
        for (layer, (&size, &target)) in self.layer_sizes.iter().zip(targets.points()).enumerate() {
            let mut index = 0;
            for _ in 0..size {
                match sampler.sample_near(target, &mut self.rng) {
                    Some(position) => {
                        nodes.push(Node::new(position, layer, index));
                        index += 1;
                    }
                    None => dropped += 1,
                }
            }
        }

        if dropped > 0 {
            warn!(dropped, "no interior point found for some nodes");
        }
        info!(
            layers = self.layer_sizes.len(),
            nodes = nodes.len(),
            "nodes seeded"
        );

        self.targets = targets;
        self.simulation = ForceSimulation::new(nodes);
        self.state = EngineState::Seeded;
    }

    /// Begin ticking from `Seeded` or resume from `Stopped`
    pub fn start(&mut self) {
        match self.state {
            EngineState::Seeded | EngineState::Stopped => {
                self.state = EngineState::Running;
                info!("simulation started");
            }
            state => debug!(?state, "start ignored"),
        }
    }

    pub fn stop(&mut self) {
        if self.state == EngineState::Running {
            self.state = EngineState::Stopped;
            info!("simulation stopped");
        }
    }

    /// Run one tick of substeps when running; returns the kinetic energy
    pub fn step(&mut self) -> Option<f32> {
        if self.state != EngineState::Running {
            return None;
        }
        let volume = self.volume.as_ref()?;

        let energy = self
            .simulation
            .tick(&volume.grid, &self.targets, &self.config.simulation);

        let layers = self.simulation.positions_by_layer(self.layer_sizes.len());
        if let Some(callback) = self.on_tick.as_mut() {
            callback(&layers);
        }
        Some(energy)
    }

    /// Drop the mesh and every derived structure and return to the default
    /// layout for the current layer sizes
    pub fn reset(&mut self) {
        self.mesh = None;
        self.job = None;
        self.volume = None;
        self.targets = LayerTargets::default();
        self.simulation = ForceSimulation::new(default_layout(&self.layer_sizes));
        self.rng = StdRng::seed_from_u64(self.config.sampler.seed);
        self.state = EngineState::Unloaded;
        info!("engine reset");
    }
}
