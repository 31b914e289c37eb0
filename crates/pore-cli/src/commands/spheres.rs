//! pore spheres command - pack spheres in a box.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pore_pack::{PackingTarget, PorePacker, SizeRange, SphereConfig};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

/// Sphere packing parameters collected from the command line.
pub struct SphereArgs {
    pub size: [f64; 3],
    pub radius: (f64, f64),
    pub min_dist: f64,
    pub count: Option<usize>,
    pub fraction: Option<f64>,
    pub max_attempts: usize,
    pub seed: u64,
}

#[derive(Serialize)]
struct SphereSummary {
    size: [f64; 3],
    seed: u64,
    count: usize,
    pore_volume: f64,
    volume_fraction: f64,
    attempts: usize,
    total_attempts: usize,
    termination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shortfall: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

pub fn run(args: &SphereArgs, output_path: Option<&Path>, cli: &Cli) -> Result<()> {
    let target = match (args.count, args.fraction) {
        (Some(n), Some(f)) => PackingTarget::both(n, f),
        (None, Some(f)) => PackingTarget::porosity(f),
        (Some(n), None) => PackingTarget::count(n),
        (None, None) => SphereConfig::default().target,
    };
    let [width, height, depth] = args.size;
    let config = SphereConfig::new(SizeRange::new(args.radius.0, args.radius.1))
        .with_box(width, height, depth)
        .with_min_dist(args.min_dist)
        .with_target(target)
        .with_max_attempts(args.max_attempts);

    output::info(
        &format!("Packing spheres in {} x {} x {} box...", width, height, depth),
        cli.format,
        cli.quiet,
    );

    let result = PorePacker::seeded(args.seed).pack_spheres(&config)?;

    if let Some(path) = output_path {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize spheres")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write spheres to {:?}", path))?;
    }

    let summary = SphereSummary {
        size: args.size,
        seed: args.seed,
        count: result.count(),
        pore_volume: result.pore_volume,
        volume_fraction: result.volume_fraction,
        attempts: result.attempts,
        total_attempts: result.total_attempts,
        termination: result.termination.to_string(),
        shortfall: result.shortfall().map(|s| s.to_string()),
        output: output_path.map(|p| p.display().to_string()),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&summary, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                output::success(
                    &format!("Packed {} spheres", summary.count),
                    cli.format,
                    cli.quiet,
                );
                println!("  {}: {:.4}", "Pore volume".cyan(), summary.pore_volume);
                println!(
                    "  {}: {:.2}%",
                    "Volume fraction".cyan(),
                    summary.volume_fraction * 100.0
                );
                println!(
                    "  {}: {} (total draws {})",
                    "Attempts".cyan(),
                    summary.attempts,
                    summary.total_attempts
                );
                println!("  {}: {}", "Stopped on".cyan(), summary.termination);
                if let Some(ref path) = summary.output {
                    println!("  {}: {}", "Saved".cyan(), path);
                }
            }
        }
    }

    if let Some(ref shortfall) = summary.shortfall {
        output::warn(&format!("Target not reached: {}", shortfall), cli.quiet);
    }

    Ok(())
}
