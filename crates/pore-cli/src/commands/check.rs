//! pore check command - audit a stored layout.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pore_pack::{PoreLayout, verify_layout};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct CheckResult {
    path: String,
    valid: bool,
    #[serde(flatten)]
    report: pore_pack::LayoutReport,
}

pub fn run(input: &Path, min_dist: Option<f64>, segments: usize, cli: &Cli) -> Result<()> {
    let layout =
        PoreLayout::load(input).with_context(|| format!("Failed to load layout from {:?}", input))?;

    let min_dist = min_dist.unwrap_or(layout.min_dist);
    let report = verify_layout(&layout.domain, &layout.pores, min_dist, segments);

    let result = CheckResult {
        path: input.display().to_string(),
        valid: report.is_valid(),
        report,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Layout Check".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                println!("  {}: {}", "Min clearance".cyan(), min_dist);

                if result.valid {
                    println!("  {}: {}", "Status".cyan(), "Valid".green().bold());
                } else {
                    println!("  {}: {}", "Status".cyan(), "Violations found".red().bold());
                }

                println!("\n{}", result.report);

                if !result.report.violations.is_empty() {
                    println!("\n{}", "Violations:".bold());
                    for violation in &result.report.violations {
                        println!("  {} {}", "✗".red(), violation);
                    }
                }
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}
