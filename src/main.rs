use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voxlayout::config::LayoutConfig;
use voxlayout::engine::LayoutEngine;
use voxlayout::io::{Frame, read_config, read_mesh, write_frame};
use voxlayout::mesh::Mesh;

mod cli;

use cli::{Cli, Commands, InputArgs, RunArgs, Shape};

fn load_config(input: &InputArgs) -> anyhow::Result<LayoutConfig> {
    let mut config = match &input.config {
        Some(path) => read_config(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => LayoutConfig::default(),
    };
    if let Some(resolution) = input.resolution {
        config.voxel.resolution = resolution;
    }
    Ok(config)
}

fn load_mesh(input: &InputArgs) -> anyhow::Result<Mesh> {
    match &input.mesh {
        Some(path) => {
            read_mesh(path).with_context(|| format!("failed to read mesh {}", path.display()))
        }
        None => Ok(input.shape.unwrap_or(Shape::Sphere).mesh()),
    }
}

/// Load the input and drive voxelization to completion
fn prepare(input: &InputArgs) -> anyhow::Result<LayoutEngine> {
    let mut engine = LayoutEngine::new(load_config(input)?);
    engine.on_progress(|fraction, label| {
        tracing::debug!(fraction, "{label}");
    });
    engine.load_mesh(load_mesh(input)?)?;
    engine.run_voxelization();
    Ok(engine)
}

fn voxelize(input: &InputArgs) -> anyhow::Result<()> {
    let engine = prepare(input)?;
    let grid = engine.grid().context("voxelization produced no grid")?;

    println!(
        "{} of {} cells interior ({:.1}%) at resolution {}",
        grid.inside_count(),
        grid.resolution().pow(3),
        grid.fill_ratio() * 100.0,
        grid.resolution()
    );
    Ok(())
}

fn run(args: &RunArgs) -> anyhow::Result<()> {
    let mut engine = prepare(&args.input)?;
    engine.set_layer_sizes(&args.layers)?;
    engine.start();

    let mut energy = engine.kinetic_energy();
    for _ in 0..args.ticks {
        match engine.step() {
            Some(e) => energy = e,
            None => break,
        }
    }
    info!(ticks = args.ticks, energy, "simulation finished");

    let placed = engine.nodes().len();
    let requested: usize = args.layers.iter().sum();
    println!(
        "Placed {placed} of {requested} nodes in {} layers; kinetic energy {energy:.6} after {} ticks",
        args.layers.len(),
        args.ticks
    );

    if let Some(output) = &args.output {
        let frame = Frame::new(args.ticks, energy, &engine.positions());
        write_frame(output, &frame)
            .with_context(|| format!("failed to write frame {}", output.display()))?;
        println!("Wrote frame to {}", output.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Voxelize(input) => voxelize(input),
        Commands::Run(args) => run(args),
    }
}
