//! Reading meshes and configuration, writing node frames
//!
//! Formats are chosen by file extension: meshes are JSON, configuration is
//! YAML or JSON, frames are JSON or packed binary [`NodeInstance`] records.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LayoutConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::mesh::{Mesh, Triangle};
use crate::types::{NodeInstance, instances_from_layers};

/// On-disk mesh: either a triangle soup or an indexed vertex list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeshFile {
    Soup {
        triangles: Vec<[[f32; 3]; 3]>,
    },
    Indexed {
        vertices: Vec<[f32; 3]>,
        indices: Vec<u32>,
    },
}

impl MeshFile {
    fn into_mesh(self) -> LayoutResult<Mesh> {
        match self {
            MeshFile::Soup { triangles } => Ok(Mesh::new(
                triangles
                    .into_iter()
                    .map(|t| {
                        let [a, b, c] = t.map(Vec3::from_array);
                        Triangle::new(a, b, c)
                    })
                    .collect(),
            )),
            MeshFile::Indexed { vertices, indices } => {
                let vertices: Vec<Vec3> = vertices.into_iter().map(Vec3::from_array).collect();
                Mesh::from_indexed(&vertices, &indices)
            }
        }
    }
}

/// Final node positions as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Ticks run before the frame was captured
    pub ticks: usize,
    pub kinetic_energy: f32,
    /// Positions grouped by layer
    pub layers: Vec<Vec<[f32; 3]>>,
}

impl Frame {
    pub fn new(ticks: usize, kinetic_energy: f32, layers: &[Vec<Vec3>]) -> Self {
        Self {
            ticks,
            kinetic_energy,
            layers: layers
                .iter()
                .map(|layer| layer.iter().map(|p| p.to_array()).collect())
                .collect(),
        }
    }

    /// Positions converted back to vectors
    pub fn positions(&self) -> Vec<Vec<Vec3>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().copied().map(Vec3::from_array).collect())
            .collect()
    }
}

/// Get file extension from a path
pub fn extension_from_path(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

fn require_extension(path: &Path) -> LayoutResult<String> {
    extension_from_path(path)
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| LayoutError::UnsupportedFormat(path.display().to_string()))
}

/// Read a JSON mesh
pub fn read_mesh(path: &Path) -> LayoutResult<Mesh> {
    let ext = require_extension(path)?;
    if ext != "json" {
        return Err(LayoutError::UnsupportedFormat(ext));
    }

    let content = fs::read_to_string(path)?;
    let file: MeshFile =
        serde_json::from_str(&content).map_err(|e| LayoutError::Parse(e.to_string()))?;
    let mesh = file.into_mesh()?;

    info!(path = %path.display(), triangles = mesh.len(), "mesh loaded");
    Ok(mesh)
}

/// Read a [`LayoutConfig`] from YAML or JSON; missing fields take defaults
pub fn read_config(path: &Path) -> LayoutResult<LayoutConfig> {
    let ext = require_extension(path)?;
    let content = fs::read_to_string(path)?;

    match ext.as_str() {
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| LayoutError::Parse(e.to_string()))
        }
        "json" => serde_json::from_str(&content).map_err(|e| LayoutError::Parse(e.to_string())),
        _ => Err(LayoutError::UnsupportedFormat(ext)),
    }
}

/// Write a frame as pretty JSON, or as packed instances for `.bin`
pub fn write_frame(path: &Path, frame: &Frame) -> LayoutResult<()> {
    let ext = require_extension(path)?;

    match ext.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(frame)
                .map_err(|e| LayoutError::Parse(e.to_string()))?;
            fs::write(path, json)?;
        }
        "bin" => {
            let instances: Vec<NodeInstance> = instances_from_layers(&frame.positions());
            fs::write(path, bytemuck::cast_slice::<NodeInstance, u8>(&instances))?;
        }
        _ => return Err(LayoutError::UnsupportedFormat(ext)),
    }

    info!(path = %path.display(), "frame written");
    Ok(())
}
