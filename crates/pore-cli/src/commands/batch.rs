//! pore batch command - pack independent layouts in parallel.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pore_pack::{PoreLayout, derive_seeds, pack_batch};
use serde::Serialize;
use tracing::debug;

use crate::commands::build_config;
use crate::{Cli, OutputFormat, PackArgs, output};

#[derive(Serialize)]
struct InstanceSummary {
    index: usize,
    seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    porosity: Option<f64>,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct BatchSummary {
    directory: String,
    master_seed: u64,
    succeeded: usize,
    failed: usize,
    instances: Vec<InstanceSummary>,
}

pub fn run(args: &PackArgs, instances: usize, seed: u64, dir: &Path, cli: &Cli) -> Result<()> {
    let config = build_config(args)?;
    config.validate()?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;

    output::info(
        &format!("Packing {} layouts into {}...", instances, dir.display()),
        cli.format,
        cli.quiet,
    );

    let seeds = derive_seeds(seed, instances);
    debug!(?config, ?seeds, "Resolved batch configuration");
    let items = pack_batch(&config, &seeds);

    let mut summaries = Vec::with_capacity(items.len());
    for item in items {
        let summary = match item.outcome {
            Ok(result) => {
                let path = dir.join(format!("layout_{:03}.json", item.index));
                let saved = PoreLayout::from_result(&result, Some(item.seed)).save(&path);
                InstanceSummary {
                    index: item.index,
                    seed: item.seed,
                    path: saved.is_ok().then(|| path.display().to_string()),
                    count: Some(result.count()),
                    porosity: Some(result.porosity),
                    complete: result.is_complete(),
                    error: saved.err().map(|e| e.to_string()),
                }
            }
            Err(e) => InstanceSummary {
                index: item.index,
                seed: item.seed,
                path: None,
                count: None,
                porosity: None,
                complete: false,
                error: Some(e.to_string()),
            },
        };
        summaries.push(summary);
    }

    let failed = summaries.iter().filter(|s| s.error.is_some()).count();
    let summary = BatchSummary {
        directory: dir.display().to_string(),
        master_seed: seed,
        succeeded: summaries.len() - failed,
        failed,
        instances: summaries,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&summary, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Batch Report".bold().underline());
                for s in &summary.instances {
                    match (&s.error, s.count, s.porosity) {
                        (Some(err), _, _) => {
                            println!("  {} #{:03} seed {}: {}", "✗".red(), s.index, s.seed, err)
                        }
                        (None, Some(count), Some(porosity)) => {
                            let icon = if s.complete {
                                "✓".green()
                            } else {
                                "⚠".yellow()
                            };
                            println!(
                                "  {} #{:03} seed {}: {} pores, {:.2}% porosity",
                                icon,
                                s.index,
                                s.seed,
                                count,
                                porosity * 100.0
                            );
                        }
                        _ => {}
                    }
                }
                println!(
                    "  {}: {} succeeded, {} failed",
                    "Total".cyan(),
                    summary.succeeded,
                    summary.failed
                );
            }
        }
    }

    if summary.failed > 0 {
        output::warn(
            &format!("{} of {} instances failed", summary.failed, instances),
            cli.quiet,
        );
    }

    Ok(())
}
