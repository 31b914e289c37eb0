//! pore-cli: Command-line interface for random pore packing.
//!
//! This tool packs, audits and inspects pore layouts from the command line,
//! suitable for scripting parameter sweeps and batch studies.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=pore_pack=info` - Basic operation logging
//! - `RUST_LOG=pore_pack::packing=debug` - Per-run packing details
//! - `RUST_LOG=pore_pack::timing=debug` - Performance timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Pack circles to 30% porosity and keep the layout
//! RUST_LOG=pore_pack=info pore pack --porosity 0.3 --seed 7 -o layout.json
//!
//! # Audit a stored layout
//! pore check layout.json --min-dist 0.25
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{batch, check, info, pack, spheres};

/// pore - Random non-overlapping pore packing.
///
/// Generate porous-material layouts by rejection sampling and audit them.
#[derive(Parser)]
#[command(name = "pore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack one pore layout
    Pack {
        #[command(flatten)]
        packing: PackArgs,

        /// Seed for the random generator
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Save the layout to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Load the layout from --output if it already exists
        #[arg(long, requires = "output")]
        reuse: bool,
    },

    /// Pack several independent layouts in parallel
    Batch {
        #[command(flatten)]
        packing: PackArgs,

        /// Number of layouts to pack
        #[arg(short = 'n', long, default_value = "8")]
        instances: usize,

        /// Master seed the per-instance seeds are derived from
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Directory for layout_000.json, layout_001.json, ...
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Display statistics of a stored layout
    Info {
        /// Layout file
        input: PathBuf,
    },

    /// Check a stored layout for clearance violations
    Check {
        /// Layout file
        input: PathBuf,

        /// Clearance to check against (defaults to the stored value)
        #[arg(long)]
        min_dist: Option<f64>,

        /// Polygon segments used for curved pores
        #[arg(long, default_value = "256")]
        segments: usize,
    },

    /// Pack spheres in a box
    Spheres {
        /// Box dimensions
        #[arg(long, num_args = 3, value_names = ["W", "H", "D"], default_values_t = [1.0, 1.0, 1.0])]
        size: Vec<f64>,

        /// Minimum sphere radius
        #[arg(long, default_value = "0.05")]
        min_radius: f64,

        /// Maximum sphere radius
        #[arg(long, default_value = "0.1")]
        max_radius: f64,

        /// Minimum clearance between spheres and walls
        #[arg(long, default_value = "0.01")]
        min_dist: f64,

        /// Target sphere count
        #[arg(long)]
        count: Option<usize>,

        /// Target volume fraction
        #[arg(long)]
        fraction: Option<f64>,

        /// Attempt budget
        #[arg(long, default_value = "5000")]
        max_attempts: usize,

        /// Seed for the random generator
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Save the spheres to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Packing parameters shared by `pack` and `batch`.
///
/// Every flag is optional; unset flags keep the value from `--config` or the
/// built-in default.
#[derive(Args)]
pub struct PackArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pore shape
    #[arg(long)]
    shape: Option<ShapeArg>,

    /// Domain width
    #[arg(long)]
    width: Option<f64>,

    /// Domain height
    #[arg(long)]
    height: Option<f64>,

    /// Minimum radius, width, semi-major axis or side
    #[arg(long)]
    min_size: Option<f64>,

    /// Maximum radius, width, semi-major axis or side
    #[arg(long)]
    max_size: Option<f64>,

    /// Minimum height or semi-minor axis
    #[arg(long)]
    min_secondary: Option<f64>,

    /// Maximum height or semi-minor axis
    #[arg(long)]
    max_secondary: Option<f64>,

    /// Minimum clearance between pores and walls
    #[arg(long)]
    min_dist: Option<f64>,

    /// Target pore count
    #[arg(long)]
    count: Option<usize>,

    /// Target porosity (pore area over domain area)
    #[arg(long)]
    porosity: Option<f64>,

    /// Attempt budget
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Count every attempt against the budget instead of resetting on success
    #[arg(long)]
    global_budget: bool,

    /// Draw centres over the whole domain instead of the inset region
    #[arg(long)]
    uniform_placement: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    /// Circular pores
    Circle,
    /// Rotated rectangles
    Rectangle,
    /// Rotated ellipses
    Ellipse,
    /// Rotated squares
    Square,
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "pore_pack=info",
            2 => "pore_pack=debug",
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
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Pack {
            packing,
            seed,
            output,
            reuse,
        } => pack::run(packing, *seed, output.as_deref(), *reuse, &cli),
        Commands::Batch {
            packing,
            instances,
            seed,
            output,
        } => batch::run(packing, *instances, *seed, output, &cli),
        Commands::Info { input } => info::run(input, &cli),
        Commands::Check {
            input,
            min_dist,
            segments,
        } => check::run(input, *min_dist, *segments, &cli),
        Commands::Spheres {
            size,
            min_radius,
            max_radius,
            min_dist,
            count,
            fraction,
            max_attempts,
            seed,
            output,
        } => spheres::run(
            &spheres::SphereArgs {
                size: [size[0], size[1], size[2]],
                radius: (*min_radius, *max_radius),
                min_dist: *min_dist,
                count: *count,
                fraction: *fraction,
                max_attempts: *max_attempts,
                seed: *seed,
            },
            output.as_deref(),
            &cli,
        ),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(pack_err) = e.downcast_ref::<pore_pack::PackError>() {
                eprintln!("{}: {}", "Error".red().bold(), pack_err);
                eprintln!("  {}: {}", "Code".cyan(), pack_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    pack_err.recovery_suggestion()
                );
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
