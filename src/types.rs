//! Packed node records for the rendering collaborator
//!
//! These types are designed to be uploaded directly to GPU buffers.
//! All use f32/u32 for GPU compatibility and are repr(C) for predictable layout.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One node's position tagged with its layer and index.
///
/// Layout is 16-byte aligned for instanced rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NodeInstance {
    /// World position
    pub position: [f32; 3],
    /// Owning layer
    pub layer: u32,
    /// Index within the layer
    pub index: u32,
    /// Padding for 16-byte alignment
    pub _padding: [u32; 3],
}

impl NodeInstance {
    pub fn new(position: Vec3, layer: usize, index: usize) -> Self {
        Self {
            position: position.to_array(),
            layer: layer as u32,
            index: index as u32,
            _padding: [0; 3],
        }
    }
}

/// Flatten per-layer positions into packed instances
pub fn instances_from_layers(layers: &[Vec<Vec3>]) -> Vec<NodeInstance> {
    layers
        .iter()
        .enumerate()
        .flat_map(|(layer, positions)| {
            positions
                .iter()
                .enumerate()
                .map(move |(index, &p)| NodeInstance::new(p, layer, index))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_instance_size() {
        // 3 floats (position) + 2 u32 (layer, index) + 3 u32 (padding) = 32 bytes
        assert_eq!(std::mem::size_of::<NodeInstance>(), 32);
        assert_eq!(std::mem::size_of::<NodeInstance>() % 16, 0);
    }

    #[test]
    fn test_instances_keep_layer_and_index() {
        let layers = vec![vec![Vec3::X, Vec3::Y], vec![], vec![Vec3::Z]];
        let instances = instances_from_layers(&layers);

        assert_eq!(instances.len(), 3);
        assert_eq!(instances[1].position, [0.0, 1.0, 0.0]);
        assert_eq!((instances[1].layer, instances[1].index), (0, 1));
        assert_eq!((instances[2].layer, instances[2].index), (2, 0));
    }

    #[test]
    fn test_instances_cast_to_bytes() {
        let instances = instances_from_layers(&[vec![Vec3::new(1.0, 2.0, 3.0)]]);
        let bytes: &[u8] = bytemuck::cast_slice(&instances);

        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &1.0_f32.to_le_bytes());
    }
}
