//! Force simulation for layered nodes inside a voxelized volume
//!
//! Each substep accumulates three forces from a frozen snapshot of node
//! positions, integrates with semi-implicit Euler, and then reverts any node
//! whose new position is no longer interior. Committed positions therefore
//! always classify as inside the grid.

use glam::Vec3;

use crate::config::SimulationConfig;
use crate::mesh::Bounds;
use crate::voxel::VoxelGrid;

/// A simulated point owned by one layer
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Vec3,
    /// Position at the start of the current substep
    pub previous: Vec3,
    pub velocity: Vec3,
    /// Force accumulated during the current substep
    pub force: Vec3,
    /// Index into the layer targets
    pub layer: usize,
    /// Position of this node within its layer
    pub index: usize,
}

impl Node {
    /// Create a node at rest
    pub fn new(position: Vec3, layer: usize, index: usize) -> Self {
        Self {
            position,
            previous: position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            layer,
            index,
        }
    }
}

/// One attraction point per layer along the principal axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerTargets {
    points: Vec<Vec3>,
}

impl LayerTargets {
    /// Spread `layer_count` targets evenly between `inset` and `1 - inset` of
    /// the longest axis; the other coordinates sit at the bounds center.
    ///
    /// A single layer is placed at the middle of the axis.
    pub fn along_principal_axis(bounds: &Bounds, layer_count: usize, inset: f32) -> Self {
        let axis = bounds.principal_axis().index();
        let center = bounds.center();

        let points = (0..layer_count)
            .map(|layer| {
                let t = if layer_count > 1 {
                    inset + (1.0 - 2.0 * inset) * layer as f32 / (layer_count - 1) as f32
                } else {
                    0.5
                };
                let mut p = center;
                p[axis] = bounds.min[axis] + t * bounds.size[axis];
                p
            })
            .collect();

        Self { points }
    }

    pub fn get(&self, layer: usize) -> Option<Vec3> {
        self.points.get(layer).copied()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Separation direction for two coincident nodes, spread over a Fibonacci
/// sphere so different pairs split along different axes.
fn coincident_direction(i: usize, j: usize) -> Vec3 {
    const SAMPLES: usize = 64;
    let golden_ratio = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let k = (i.wrapping_mul(31).wrapping_add(j) % SAMPLES) as f32;

    let theta = 2.0 * std::f32::consts::PI * k / golden_ratio;
    let phi = (1.0 - 2.0 * (k + 0.5) / SAMPLES as f32).acos();

    Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
}

/// CPU force simulation over a set of nodes
#[derive(Debug, Clone, Default)]
pub struct ForceSimulation {
    pub nodes: Vec<Node>,
    kinetic_energy: f32,
}

impl ForceSimulation {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            kinetic_energy: 0.0,
        }
    }

    /// Mean squared speed after the last substep
    pub fn kinetic_energy(&self) -> f32 {
        self.kinetic_energy
    }

    /// Run `config.substeps` substeps of `config.substep_dt` each and return
    /// the resulting kinetic energy
    pub fn tick(
        &mut self,
        grid: &VoxelGrid,
        targets: &LayerTargets,
        config: &SimulationConfig,
    ) -> f32 {
        for _ in 0..config.substeps {
            self.step(config.substep_dt, grid, targets, config);
        }
        self.kinetic_energy
    }

    /// Advance by one substep
    pub fn step(
        &mut self,
        dt: f32,
        grid: &VoxelGrid,
        targets: &LayerTargets,
        config: &SimulationConfig,
    ) {
        if self.nodes.is_empty() {
            self.kinetic_energy = 0.0;
            return;
        }

        for node in &mut self.nodes {
            node.previous = node.position;
            node.force = Vec3::ZERO;
        }

        self.apply_repulsion(config);
        self.apply_layer_guidance(targets, config);
        self.apply_boundary_force(grid, config);
        self.integrate(dt, config.damping);
        self.enforce_containment(grid, config.bounce);

        let total: f32 = self.nodes.iter().map(|n| n.velocity.length_squared()).sum();
        self.kinetic_energy = total / self.nodes.len() as f32;
    }

    /// Inverse-square repulsion between every node pair
    fn apply_repulsion(&mut self, config: &SimulationConfig) {
        let n = self.nodes.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = self.nodes[i].position - self.nodes[j].position;
                let dist_sq = delta.length_squared();

                let dir = if dist_sq > 0.0 {
                    delta / dist_sq.sqrt()
                } else {
                    coincident_direction(i, j)
                };
                let force = dir * (config.repulsion / dist_sq.max(config.min_distance_sq));

                self.nodes[i].force += force;
                self.nodes[j].force -= force;
            }
        }
    }

    /// Linear pull toward each node's layer target
    fn apply_layer_guidance(&mut self, targets: &LayerTargets, config: &SimulationConfig) {
        for node in &mut self.nodes {
            if let Some(target) = targets.get(node.layer) {
                node.force += (target - node.position) * config.layer_guidance;
            }
        }
    }

    /// Push away from every exterior cell in the neighborhood around each node
    fn apply_boundary_force(&mut self, grid: &VoxelGrid, config: &SimulationConfig) {
        let r = config.boundary_radius.max(0);

        for node in &mut self.nodes {
            let [cx, cy, cz] = grid.cell_index_of(node.position);
            let mut push = Vec3::ZERO;

            for dz in -r..=r {
                for dy in -r..=r {
                    for dx in -r..=r {
                        let cell = [cx + dx, cy + dy, cz + dz];
                        if grid.is_inside_cell(cell) {
                            continue;
                        }
                        let away = node.position - grid.cell_center(cell);
                        let dist_sq = away.length_squared().max(config.min_distance_sq);
                        push += away.normalize_or_zero() * (config.boundary / dist_sq);
                    }
                }
            }

            node.force += push;
        }
    }

    /// Semi-implicit Euler with velocity damping
    fn integrate(&mut self, dt: f32, damping: f32) {
        for node in &mut self.nodes {
            node.velocity += node.force * dt;
            node.velocity *= damping;
            node.position += node.velocity * dt;
        }
    }

    /// Undo any move that left the interior and bounce the velocity back
    fn enforce_containment(&mut self, grid: &VoxelGrid, bounce: f32) {
        for node in &mut self.nodes {
            if !grid.contains_point(node.position) {
                node.position = node.previous;
                node.velocity *= bounce;
            }
            if !node.velocity.is_finite() {
                node.velocity = Vec3::ZERO;
            }
        }
    }

    /// Current positions grouped by layer, in node order within each layer
    pub fn positions_by_layer(&self, layer_count: usize) -> Vec<Vec<Vec3>> {
        let mut layers = vec![Vec::new(); layer_count];
        for node in &self.nodes {
            if let Some(layer) = layers.get_mut(node.layer) {
                layer.push(node.position);
            }
        }
        layers
    }
}
