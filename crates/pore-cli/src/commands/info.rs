//! pore info command - display layout statistics.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pore_pack::PoreLayout;
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct LayoutInfo {
    path: String,
    version: u32,
    width: f64,
    height: f64,
    min_dist: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    pores: usize,
    shapes: BTreeMap<String, usize>,
    pore_area: f64,
    porosity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_range: Option<[f64; 2]>,
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let layout =
        PoreLayout::load(input).with_context(|| format!("Failed to load layout from {:?}", input))?;

    let mut shapes = BTreeMap::new();
    for pore in &layout.pores {
        *shapes.entry(pore.kind().to_string()).or_insert(0) += 1;
    }

    let size_range = layout
        .pores
        .iter()
        .map(|p| p.circumradius())
        .fold(None, |acc: Option<[f64; 2]>, r| match acc {
            Some([lo, hi]) => Some([lo.min(r), hi.max(r)]),
            None => Some([r, r]),
        });

    let info = LayoutInfo {
        path: input.display().to_string(),
        version: layout.version,
        width: layout.domain.width,
        height: layout.domain.height,
        min_dist: layout.min_dist,
        seed: layout.seed,
        pores: layout.count(),
        shapes,
        pore_area: layout.pore_area(),
        porosity: layout.porosity(),
        size_range,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Layout Information".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                println!("  {}: {}", "Version".cyan(), info.version);
                println!(
                    "  {}: {} x {}",
                    "Domain".cyan(),
                    info.width,
                    info.height
                );
                println!("  {}: {}", "Min clearance".cyan(), info.min_dist);
                if let Some(seed) = info.seed {
                    println!("  {}: {}", "Seed".cyan(), seed);
                }
                println!("  {}: {}", "Pores".cyan(), info.pores);
                for (kind, n) in &info.shapes {
                    println!("    {}: {}", kind, n);
                }
                println!("  {}: {:.4}", "Pore area".cyan(), info.pore_area);
                println!("  {}: {:.2}%", "Porosity".cyan(), info.porosity * 100.0);
                if let Some([lo, hi]) = info.size_range {
                    println!(
                        "  {}: {:.4} .. {:.4}",
                        "Circumradius".cyan(),
                        lo,
                        hi
                    );
                }
            }
        }
    }

    Ok(())
}
