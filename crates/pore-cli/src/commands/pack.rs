//! pore pack command - pack one layout.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pore_pack::{PoreLayout, PorePacker, load_or_pack};
use serde::Serialize;
use tracing::debug;

use crate::commands::build_config;
use crate::{Cli, OutputFormat, PackArgs, output};

#[derive(Serialize)]
struct PackSummary {
    shape: String,
    seed: u64,
    reused: bool,
    count: usize,
    pore_area: f64,
    porosity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_attempts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    termination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shortfall: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

pub fn run(
    args: &PackArgs,
    seed: u64,
    output_path: Option<&Path>,
    reuse: bool,
    cli: &Cli,
) -> Result<()> {
    let config = build_config(args)?;
    debug!(?config, seed, reuse, "Resolved packing configuration");

    output::info(
        &format!(
            "Packing {} pores in {} x {} domain...",
            config.shape.kind(),
            config.domain.width,
            config.domain.height
        ),
        cli.format,
        cli.quiet,
    );

    let (layout, result) = match output_path {
        Some(path) if reuse => load_or_pack(path, &config, seed)
            .with_context(|| format!("Failed to load or pack layout at {:?}", path))?,
        _ => {
            let result = PorePacker::seeded(seed).pack(&config)?;
            let layout = PoreLayout::from_result(&result, Some(seed));
            if let Some(path) = output_path {
                layout
                    .save(path)
                    .with_context(|| format!("Failed to save layout to {:?}", path))?;
            }
            (layout, Some(result))
        }
    };

    let summary = PackSummary {
        shape: config.shape.kind().to_string(),
        seed: layout.seed.unwrap_or(seed),
        reused: result.is_none(),
        count: layout.count(),
        pore_area: layout.pore_area(),
        porosity: layout.porosity(),
        attempts: result.as_ref().map(|r| r.attempts),
        total_attempts: result.as_ref().map(|r| r.total_attempts),
        termination: result.as_ref().map(|r| r.termination.to_string()),
        shortfall: result
            .as_ref()
            .and_then(|r| r.shortfall())
            .map(|s| s.to_string()),
        output: output_path.map(|p| p.display().to_string()),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&summary, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                if summary.reused {
                    output::success(
                        &format!("Reused stored layout ({} pores)", summary.count),
                        cli.format,
                        cli.quiet,
                    );
                } else {
                    output::success(
                        &format!("Packed {} pores", summary.count),
                        cli.format,
                        cli.quiet,
                    );
                }
                println!("  {}: {}", "Shape".cyan(), summary.shape);
                println!("  {}: {}", "Seed".cyan(), summary.seed);
                println!("  {}: {:.4}", "Pore area".cyan(), summary.pore_area);
                println!("  {}: {:.2}%", "Porosity".cyan(), summary.porosity * 100.0);
                if let (Some(attempts), Some(total)) = (summary.attempts, summary.total_attempts) {
                    println!(
                        "  {}: {} (total draws {})",
                        "Attempts".cyan(),
                        attempts,
                        total
                    );
                }
                if let Some(ref termination) = summary.termination {
                    println!("  {}: {}", "Stopped on".cyan(), termination);
                }
                if let Some(ref path) = summary.output {
                    println!("  {}: {}", "Layout".cyan(), path);
                }
            }
        }
    }

    if let Some(ref shortfall) = summary.shortfall {
        output::warn(&format!("Target not reached: {}", shortfall), cli.quiet);
    }

    Ok(())
}
