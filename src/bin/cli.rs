// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shapekit CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shapekit::cli::Reporter;
use shapekit::cluster::mesh_affinity;
use shapekit::mesh::{analyze, validate};
use shapekit::raster::{FillRule, Fit};
use shapekit::{Algorithm, ClusterInput, ClusterParams, DescriptorSource, Encoding, Engine, EngineConfig, MeshFormat};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shapekit")]
#[command(about = "Shapekit - mesh voxelization, shape descriptors and clustering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./shapekit.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print analytics and validation findings for a mesh
    Info {
        /// Input PLY or STL file
        input: PathBuf,

        /// Emit JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Convert between PLY and STL
    Convert {
        input: PathBuf,

        output: PathBuf,

        /// Output format (inferred from the output extension when omitted)
        #[arg(short, long)]
        format: Option<FormatArg>,

        /// Write the text encoding instead of binary
        #[arg(long)]
        ascii: bool,
    },

    /// Voxelize a mesh
    Voxelize {
        input: PathBuf,

        /// Cells along the longest axis (or every axis with --fit extent)
        #[arg(short, long)]
        resolution: Option<usize>,

        #[arg(long)]
        fill: Option<FillArg>,

        #[arg(long)]
        fit: Option<FitArg>,

        /// Write occupied cell indices as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute a spherical-harmonic descriptor as JSON
    Describe {
        input: PathBuf,

        /// Highest harmonic degree
        #[arg(short = 'l', long)]
        max_degree: Option<usize>,

        /// Sample the voxelized shape instead of the surface
        #[arg(long)]
        voxels: bool,

        /// Scale energies to unit total
        #[arg(long)]
        normalize: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cluster mesh vertices
    Cluster {
        input: PathBuf,

        /// Number of clusters
        #[arg(short)]
        k: usize,

        #[arg(short, long, default_value = "kmeans")]
        algorithm: AlgorithmArg,

        /// RNG seed
        #[arg(long)]
        seed: Option<u32>,

        /// Write labels as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Ply,
    Stl,
}

#[derive(Clone, Copy, ValueEnum)]
enum FillArg {
    Solid,
    Surface,
}

#[derive(Clone, Copy, ValueEnum)]
enum FitArg {
    Uniform,
    Extent,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Kmeans,
    Spectral,
}

#[derive(Serialize)]
struct VoxelOutput {
    dims: [usize; 3],
    origin: [f64; 3],
    cell_size: [f64; 3],
    occupied: Vec<[usize; 3]>,
}

#[derive(Serialize)]
struct DescriptorOutput {
    max_degree: usize,
    energies: Vec<f64>,
    coefficients: Vec<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::load()?,
    };
    let engine = Engine::new(config);

    let outcome = match cli.command {
        Commands::Info { input, json } => info_command(&engine, &input, json),
        Commands::Convert {
            input,
            output,
            format,
            ascii,
        } => convert_command(&engine, &input, &output, format, ascii),
        Commands::Voxelize {
            input,
            resolution,
            fill,
            fit,
            output,
        } => voxelize_command(engine, &input, resolution, fill, fit, output.as_deref()),
        Commands::Describe {
            input,
            max_degree,
            voxels,
            normalize,
            output,
        } => describe_command(&engine, &input, max_degree, voxels, normalize, output.as_deref()),
        Commands::Cluster {
            input,
            k,
            algorithm,
            seed,
            output,
        } => cluster_command(&engine, &input, k, algorithm, seed, output.as_deref()),
        Commands::Version => {
            println!("Shapekit v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(error) = &outcome {
        Reporter::report_error(&format!("{:#}", error));
        std::process::exit(1);
    }
    Ok(())
}

fn load(engine: &Engine, input: &Path) -> Result<shapekit::Mesh> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    engine
        .load_mesh(input)
        .with_context(|| format!("Failed to load {}", input.display()))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            Reporter::success(&format!("Wrote {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn info_command(engine: &Engine, input: &Path, json: bool) -> Result<()> {
    let mesh = load(engine, input)?;
    let start = Instant::now();
    let stats = analyze(&mesh);
    let report = validate(&mesh);
    let elapsed = start.elapsed();

    if json {
        write_json(&stats, None)
    } else {
        Reporter::report_mesh(&input.display().to_string(), &stats, &report, elapsed);
        Ok(())
    }
}

fn convert_command(engine: &Engine, input: &Path, output: &Path, format: Option<FormatArg>, ascii: bool) -> Result<()> {
    let mesh = load(engine, input)?;
    Reporter::report_info(&format!(
        "Loaded {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.face_count()
    ));
    let format = match format {
        Some(FormatArg::Ply) => MeshFormat::Ply,
        Some(FormatArg::Stl) => MeshFormat::Stl,
        None => MeshFormat::from_extension(output)
            .with_context(|| format!("Cannot infer a format from {}; pass --format", output.display()))?,
    };
    let encoding = if ascii { Encoding::Ascii } else { Encoding::Binary };
    engine
        .save_mesh(&mesh, output, format, encoding)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Reporter::success(&format!("Converted {} -> {}", input.display(), output.display()));
    Ok(())
}

fn voxelize_command(
    mut engine: Engine,
    input: &Path,
    resolution: Option<usize>,
    fill: Option<FillArg>,
    fit: Option<FitArg>,
    output: Option<&Path>,
) -> Result<()> {
    let mesh = load(&engine, input)?;
    let options = &mut engine.config_mut().raster;
    if let Some(resolution) = resolution {
        options.resolution = resolution;
    }
    match fill {
        Some(FillArg::Solid) => options.fill = FillRule::Solid,
        Some(FillArg::Surface) => options.fill = FillRule::Surface,
        None => {}
    }
    match fit {
        Some(FitArg::Uniform) => options.fit = Fit::Uniform,
        Some(FitArg::Extent) => options.fit = Fit::Extent,
        None => {}
    }

    let start = Instant::now();
    let grid = engine.rasterize(&mesh)?;
    if grid.is_empty() {
        Reporter::report_warning("mesh has no faces; the grid is empty");
    }
    Reporter::report_grid(&input.display().to_string(), &grid, start.elapsed());

    if output.is_some() {
        let mapping = grid.mapping();
        let value = VoxelOutput {
            dims: grid.dims(),
            origin: mapping.origin().coords.into(),
            cell_size: mapping.cell_size().into(),
            occupied: grid.occupied_cells().collect(),
        };
        write_json(&value, output)?;
    }
    Ok(())
}

fn describe_command(
    engine: &Engine,
    input: &Path,
    max_degree: Option<usize>,
    voxels: bool,
    normalize: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mesh = load(engine, input)?;
    let descriptor = if voxels {
        let grid = engine.rasterize(&mesh)?;
        engine.compute_descriptor(DescriptorSource::Grid(&grid), max_degree)?
    } else {
        engine.compute_descriptor(DescriptorSource::Mesh(&mesh), max_degree)?
    };

    let mut energies = descriptor.energies();
    if normalize || engine.config().descriptor.normalize {
        energies = energies.normalized();
    }
    write_json(
        &DescriptorOutput {
            max_degree: descriptor.max_degree(),
            energies: energies.energies().to_vec(),
            coefficients: descriptor.coefficients().to_vec(),
        },
        output,
    )
}

fn cluster_command(
    engine: &Engine,
    input: &Path,
    k: usize,
    algorithm: AlgorithmArg,
    seed: Option<u32>,
    output: Option<&Path>,
) -> Result<()> {
    let mesh = load(engine, input)?;
    let params = ClusterParams {
        seed,
        ..ClusterParams::default()
    };

    let start = Instant::now();
    let outcome = match algorithm {
        AlgorithmArg::Kmeans => {
            let points: Vec<Vec<f64>> = mesh.vertices().iter().map(|p| vec![p.x, p.y, p.z]).collect();
            engine.cluster(ClusterInput::Points(&points), k, Algorithm::KMeans, &params)?
        }
        AlgorithmArg::Spectral => {
            let affinity = mesh_affinity(&mesh, engine.config().spectral.sigma)?;
            engine.cluster(ClusterInput::Affinity(&affinity), k, Algorithm::Spectral, &params)?
        }
    };
    let elapsed = start.elapsed();

    if output.is_some() {
        Reporter::report_clusters(&outcome, elapsed);
    } else if !outcome.converged {
        Reporter::report_warning(&format!("stopped after {} iterations without converging", outcome.iterations));
    }
    write_json(&outcome, output)
}
