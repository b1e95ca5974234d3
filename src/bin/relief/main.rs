//! Relief CLI - shape-grid inspection and curve-driven relief extrusion.
//!
//! Usage: relief <COMMAND> [OPTIONS] <INPUT>
//!
//! Run `relief --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relief::algo::apply::apply_displacement;
use relief::algo::blend::compute_displacement_with_progress;
use relief::algo::border::inspect_loop;
use relief::algo::curve::Curve;
use relief::algo::grid::{build_grid, Axis, GridCell};
use relief::algo::smooth::{smooth_region_with_progress, SmoothOptions};
use relief::algo::Progress;
use relief::config::ReliefOptions;
use relief::io;
use relief::mesh::{SurfaceMesh, VertexId};
use relief::patch::Patch;

#[derive(Parser)]
#[command(name = "relief")]
#[command(author, version, about = "Shape-grid relief extrusion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Where the patch comes from.
#[derive(clap::Args)]
struct PatchArgs {
    /// Input mesh file
    input: PathBuf,

    /// JSON file with the vertex indices of the patch region
    /// (default: the whole mesh, bounded by its open border)
    #[arg(long)]
    region: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display patch, loop, and grid information
    Info {
        #[command(flatten)]
        patch: PatchArgs,
    },

    /// Dump the grid cells of a patch as JSON
    Grid {
        #[command(flatten)]
        patch: PatchArgs,

        /// Write cells to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute a relief and apply it to the mesh
    Apply {
        #[command(flatten)]
        patch: PatchArgs,

        /// Output mesh file
        #[arg(short, long)]
        output: PathBuf,

        /// Options JSON file (height, smooth_amount, grid parameters)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Column-axis curve in the curve editor's JSON format
        #[arg(long)]
        curve_x: Option<PathBuf>,

        /// Row-axis curve in the curve editor's JSON format
        #[arg(long)]
        curve_y: Option<PathBuf>,

        /// Target height in millimeters (overrides the config file)
        #[arg(long)]
        height: Option<f64>,

        /// Smoothing iterations after displacement (overrides the config file)
        #[arg(long)]
        smooth: Option<usize>,

        /// Write the displacement map as JSON, keyed by input mesh vertex (meters)
        #[arg(long)]
        map: Option<PathBuf>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("error")
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "relief=info",
            2 => "relief=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Info { patch } => cmd_info(patch, cli.format),
        Commands::Grid { patch, output } => cmd_grid(patch, output.as_deref()),
        Commands::Apply {
            patch,
            output,
            config,
            curve_x,
            curve_y,
            height,
            smooth,
            map,
            sequential,
        } => {
            let mut options = match config {
                Some(path) => ReliefOptions::from_json(&read_text(path)?)
                    .with_context(|| format!("invalid options in {}", path.display()))?,
                None => ReliefOptions::default(),
            };
            if let Some(h) = height {
                options.height = *h;
            }
            if let Some(s) = smooth {
                options.smooth_amount = *s;
            }
            cmd_apply(
                patch,
                output,
                &options,
                curve_x.as_deref(),
                curve_y.as_deref(),
                map.as_deref(),
                *sequential,
                cli.quiet,
            )
        }
    }
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Never move backwards between stages
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        let percent = previous.max(raw_percent);
        if percent == previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {:<24}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_patch(args: &PatchArgs) -> Result<(SurfaceMesh, Patch)> {
    let mesh = io::load(&args.input).with_context(|| format!("failed to load {}", args.input.display()))?;

    let patch = match &args.region {
        Some(path) => {
            let indices: Vec<usize> = serde_json::from_str(&read_text(path)?)
                .with_context(|| format!("{} is not a JSON list of vertex indices", path.display()))?;
            let region: Vec<VertexId> = indices.into_iter().map(VertexId::new).collect();
            Patch::from_region(&mesh, &region)?
        }
        None => Patch::from_mesh(&mesh)?,
    };

    Ok((mesh, patch))
}

fn load_curve(path: Option<&Path>) -> Result<Curve> {
    match path {
        Some(p) => Curve::from_json(&read_text(p)?).with_context(|| format!("invalid curve in {}", p.display())),
        None => Ok(Curve::default()),
    }
}

#[derive(Serialize)]
struct InfoReport {
    file: PathBuf,
    mesh_vertices: usize,
    mesh_faces: usize,
    patch_vertices: usize,
    border_vertices: usize,
    open_ends: Vec<VertexId>,
    shortcut_chords: Vec<[VertexId; 2]>,
    grid: Option<GridSummary>,
    grid_error: Option<String>,
}

#[derive(Serialize)]
struct GridSummary {
    columns: usize,
    rows: usize,
    middle_column: usize,
    middle_row: usize,
    column_anchor: VertexId,
    row_anchor: VertexId,
    quadrants: String,
    gap_degrees: Option<f64>,
}

fn cmd_info(args: &PatchArgs, format: OutputFormat) -> Result<()> {
    let (mesh, patch) = load_patch(args)?;
    let report = inspect_loop(&patch);

    let (grid, grid_error) = match build_grid(&patch, &ReliefOptions::default().grid) {
        Ok(g) => (
            Some(GridSummary {
                columns: g.column_count(),
                rows: g.row_count(),
                middle_column: g.middle_column(),
                middle_row: g.middle_row(),
                column_anchor: g.anchor(Axis::Column),
                row_anchor: g.anchor(Axis::Row),
                quadrants: g.limits().coverage.to_string(),
                gap_degrees: g.sequence().gap.map(|gap| gap.width),
            }),
            None,
        ),
        Err(e) => (None, Some(e.to_string())),
    };

    let info = InfoReport {
        file: args.input.clone(),
        mesh_vertices: mesh.num_vertices(),
        mesh_faces: mesh.num_faces(),
        patch_vertices: patch.num_vertices(),
        border_vertices: report.border_vertices,
        open_ends: report.open_ends,
        shortcut_chords: report.chords,
        grid,
        grid_error,
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", info.file.display());
    println!("Mesh: {} vertices, {} faces", info.mesh_vertices, info.mesh_faces);
    println!("Patch: {} vertices, {} on the border", info.patch_vertices, info.border_vertices);
    if !info.open_ends.is_empty() {
        println!("Open ends: {:?}", info.open_ends);
    }
    if !info.shortcut_chords.is_empty() {
        println!("Shortcut chords: {:?}", info.shortcut_chords);
    }
    match (&info.grid, &info.grid_error) {
        (Some(g), _) => {
            println!("Grid: {} columns x {} rows", g.columns, g.rows);
            println!("Quadrants: {}", g.quadrants);
            if let Some(width) = g.gap_degrees {
                println!("Angular gap: {:.3} deg", width);
            }
            println!("Middle: column {}, row {}", g.middle_column, g.middle_row);
            println!("Anchors: column axis {}, row axis {}", g.column_anchor, g.row_anchor);
        }
        (None, Some(e)) => println!("Grid: unavailable ({})", e),
        (None, None) => {}
    }

    Ok(())
}

fn cmd_grid(args: &PatchArgs, output: Option<&Path>) -> Result<()> {
    let (_, patch) = load_patch(args)?;
    let grid = build_grid(&patch, &ReliefOptions::default().grid)?;
    let cells: &[GridCell] = grid.cells();
    let json = serde_json::to_string_pretty(cells)?;

    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} cells to {}", cells.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_apply(
    args: &PatchArgs,
    output: &Path,
    options: &ReliefOptions,
    curve_x: Option<&Path>,
    curve_y: Option<&Path>,
    map_path: Option<&Path>,
    sequential: bool,
    quiet: bool,
) -> Result<()> {
    let (mut mesh, patch) = load_patch(args)?;
    let curve_x = load_curve(curve_x)?;
    let curve_y = load_curve(curve_y)?;

    let progress = || if quiet { Progress::none() } else { create_progress() };
    if !quiet {
        eprintln!(
            "Computing relief: {} patch vertices, height {} mm, curves {}/{} segments",
            patch.num_vertices(),
            options.height,
            curve_x.len(),
            curve_y.len()
        );
    }

    let start = Instant::now();
    let map = compute_displacement_with_progress(&patch, &curve_x, &curve_y, options, &progress())?;
    let moved = apply_displacement(&mut mesh, &patch, &map)?;

    if options.smooth_amount > 0 {
        let region: Vec<VertexId> = patch.vertex_ids().map(|v| patch.source_vertex(v)).collect();
        let mut smooth = SmoothOptions::default().with_iterations(options.smooth_amount);
        if sequential {
            smooth = smooth.sequential();
        }
        smooth_region_with_progress(&mut mesh, &region, &smooth, &progress());
    }
    let elapsed = start.elapsed();

    if let Some(path) = map_path {
        std::fs::write(path, serde_json::to_string_pretty(&map.to_source(&patch))?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    io::save(&mesh, output).with_context(|| format!("failed to save {}", output.display()))?;

    if !quiet {
        eprintln!(
            "Moved {} vertices (peak {:.6} m) in {:.2?}, saved to {}",
            moved,
            map.max_abs(),
            elapsed,
            output.display()
        );
    }
    Ok(())
}
