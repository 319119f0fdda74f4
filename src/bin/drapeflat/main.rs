//! Drapeflat CLI - garment grading and pattern unfolding.
//!
//! Usage: drapeflat <COMMAND> [OPTIONS] <INPUT>... [OUTPUT]
//!
//! Run `drapeflat --help` for available commands. Set `RUST_LOG=debug` for
//! per-stage diagnostics.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use drapeflat::algo::adjacency::AdjacencyGraph;
use drapeflat::algo::grade::{self, GradeOptions};
use drapeflat::algo::unfold::{self, Traversal, UnfoldOptions};
use drapeflat::algo::Progress;
use drapeflat::io;

#[derive(Parser)]
#[command(name = "drapeflat")]
#[command(author, version, about = "Garment grading and unfolding CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Move a garment from one avatar onto another
    Grade {
        /// Avatar the garment is draped on
        source: PathBuf,

        /// Avatar to move the garment to (same topology as the source)
        target: PathBuf,

        /// Draped garment mesh
        garment: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Move both avatars to the ground plane (lowest point at y = 0) first
        #[arg(long)]
        ground: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Unfold a draped mesh into a flat pattern
    Flatten {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file (z = 0)
        output: PathBuf,

        /// Face to lay flat first
        #[arg(short, long)]
        seed_face: Option<usize>,

        /// Pair visiting order
        #[arg(short, long, value_enum, default_value = "breadth-first")]
        traversal: TraversalArg,

        /// Save the placed part even if some vertices could not be placed
        #[arg(long)]
        partial: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TraversalArg {
    /// Propagate outward from the seed face
    BreadthFirst,
    /// Scan all face pairs until nothing changes
    Rounds,
}

impl From<TraversalArg> for Traversal {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::BreadthFirst => Traversal::BreadthFirst,
            TraversalArg::Rounds => Traversal::Rounds,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Grade {
            source,
            target,
            garment,
            output,
            ground,
            sequential,
        } => {
            cmd_grade(&source, &target, &garment, &output, ground, sequential)?;
        }

        Commands::Flatten {
            input,
            output,
            seed_face,
            traversal,
            partial,
        } => {
            cmd_flatten(&input, &output, seed_face, traversal, partial)?;
        }
    }

    Ok(())
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

        // Only ever move forward.
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (raw_percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, raw_percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Normals: {}", mesh.normals().len());
    println!("Texture coordinates: {}", mesh.texcoords().len());
    println!("Faces: {}", mesh.num_faces());
    println!("Index base: {:?}", mesh.index_base());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    if !mesh.is_triangulated() {
        println!("Mesh type: Mixed polygon mesh (not unfoldable)");
        return Ok(());
    }
    println!("Mesh type: Triangle mesh");

    let graph = AdjacencyGraph::build(&mesh)?;
    println!("Adjacent face pairs: {}", graph.len());
    if graph.is_manifold() {
        println!("Topology: Manifold");
    } else {
        println!("Topology: Non-manifold ({} edges shared by more than two faces)", graph.non_manifold_edges().len());
    }

    Ok(())
}

fn cmd_grade(
    source: &PathBuf,
    target: &PathBuf,
    garment: &PathBuf,
    output: &PathBuf,
    ground: bool,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_mesh = io::load(source)?;
    let target_mesh = io::load(target)?;
    let garment_mesh = io::load(garment)?;

    println!(
        "Loaded: avatars with {} / {} vertices, garment with {} vertices",
        source_mesh.num_vertices(),
        target_mesh.num_vertices(),
        garment_mesh.num_vertices()
    );

    let options = GradeOptions::default()
        .with_parallel(!sequential)
        .with_ground(ground);
    let mode = if sequential { "sequential" } else { "parallel" };
    let progress = create_progress();

    println!("Grading ({})...", mode);
    let start = Instant::now();
    let graded = grade::grade_with_progress(&source_mesh, &target_mesh, &garment_mesh, &options, &progress)?;
    let elapsed = start.elapsed();

    io::save(&graded, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_flatten(
    input: &PathBuf,
    output: &PathBuf,
    seed_face: Option<usize>,
    traversal: TraversalArg,
    partial: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let graph = AdjacencyGraph::build(&mesh)?;
    println!("Adjacent face pairs: {}", graph.len());

    let mut options = UnfoldOptions::default().with_traversal(traversal.into());
    options.seed_face = seed_face;
    let progress = create_progress();

    let start = Instant::now();
    let report = unfold::unfold_with_progress(&mesh, &graph, &options, &progress)?;
    let elapsed = start.elapsed();

    if !report.is_complete() {
        eprintln!();
    }
    println!(
        "Unfolded from face {} in {} rounds: {} of {} vertices placed",
        report.seed_face.index(),
        report.rounds,
        report.points.placed_count(),
        mesh.num_vertices()
    );
    println!("Max edge length error: {:.3e}", report.max_edge_error(&mesh)?);
    if report.skipped_degenerate > 0 {
        println!("Degenerate face pairs skipped: {}", report.skipped_degenerate);
    }
    if report.non_manifold_edges > 0 {
        println!("Non-manifold edges (first two faces used): {}", report.non_manifold_edges);
    }
    if report.truncated {
        println!("Stopped at the round limit with work pending");
    }

    let pattern = if report.is_complete() {
        report.points.to_mesh(&mesh)?
    } else if partial {
        println!("Unplaced vertices: {}", report.unplaced.len());
        report.points.to_placed_mesh(&mesh)?
    } else {
        return Err(format!(
            "{} vertices could not be placed (use --partial to save the rest)",
            report.unplaced.len()
        )
        .into());
    };

    io::save(&pattern, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
