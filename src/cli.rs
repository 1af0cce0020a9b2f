use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::Vec3;

use voxlayout::geometry::{cuboid, icosphere};
use voxlayout::mesh::Mesh;

/// Lay out layered nodes inside a closed triangle mesh.
#[derive(Parser, Debug)]
#[command(name = "voxlayout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Voxelize a mesh and report how much of the grid is interior
    Voxelize(InputArgs),
    /// Seed nodes inside a mesh and run the force simulation
    Run(RunArgs),
}

/// Built-in closed meshes
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Sphere,
    #[value(name = "box")]
    Cube,
}

impl Shape {
    pub fn mesh(self) -> Mesh {
        match self {
            Shape::Sphere => icosphere(3, 1.0),
            Shape::Cube => cuboid(Vec3::splat(-1.0), Vec3::ONE),
        }
    }
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Mesh file (.json triangle list)
    #[arg(short, long, conflicts_with = "shape")]
    pub mesh: Option<PathBuf>,

    /// Built-in shape used when no mesh file is given
    #[arg(short, long, value_enum)]
    pub shape: Option<Shape>,

    /// Layout configuration (.yaml, .yml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Grid cells per axis, overriding the configuration
    #[arg(short, long)]
    pub resolution: Option<usize>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Nodes per layer, comma separated
    #[arg(short, long, value_delimiter = ',', default_value = "8,16,16,4")]
    pub layers: Vec<usize>,

    /// Simulation ticks to run
    #[arg(short, long, default_value_t = 200)]
    pub ticks: usize,

    /// Write the final frame (.json or .bin)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
