//! Subcommand implementations.

pub mod batch;
pub mod check;
pub mod info;
pub mod pack;
pub mod spheres;

use anyhow::{Context, Result};
use pore_pack::{
    AttemptPolicy, PackingConfig, PackingTarget, PlacementPolicy, ShapeFamily, SizeRange,
};

use crate::{PackArgs, ShapeArg};

/// Build a packing configuration from `--config` and the flag overrides.
pub fn build_config(args: &PackArgs) -> Result<PackingConfig> {
    let mut config = match &args.config {
        Some(path) => PackingConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => PackingConfig::default(),
    };

    if let Some(shape) = args.shape.or(sizes_overridden(args).then(|| kind_of(&config.shape))) {
        config.shape = shape_family(shape, &config.shape, args);
    }

    if args.width.is_some() || args.height.is_some() {
        let width = args.width.unwrap_or(config.domain.width);
        let height = args.height.unwrap_or(config.domain.height);
        config = config.with_domain(width, height);
    }
    if let Some(min_dist) = args.min_dist {
        config = config.with_min_dist(min_dist);
    }
    match (args.count, args.porosity) {
        (Some(n), Some(p)) => config = config.with_target(PackingTarget::both(n, p)),
        (Some(n), None) => config = config.with_target_count(n),
        (None, Some(p)) => config = config.with_target_porosity(p),
        (None, None) => {}
    }
    if let Some(max_attempts) = args.max_attempts {
        config = config.with_max_attempts(max_attempts);
    }
    if args.global_budget {
        config = config.with_attempt_policy(AttemptPolicy::Global);
    }
    if args.uniform_placement {
        config = config.with_placement(PlacementPolicy::Uniform);
    }

    Ok(config)
}

fn sizes_overridden(args: &PackArgs) -> bool {
    args.min_size.is_some()
        || args.max_size.is_some()
        || args.min_secondary.is_some()
        || args.max_secondary.is_some()
}

fn kind_of(family: &ShapeFamily) -> ShapeArg {
    match family {
        ShapeFamily::Circle { .. } => ShapeArg::Circle,
        ShapeFamily::Rectangle { .. } => ShapeArg::Rectangle,
        ShapeFamily::Ellipse { .. } => ShapeArg::Ellipse,
        ShapeFamily::Square { .. } => ShapeArg::Square,
    }
}

/// Size bounds of `current` when it has the requested kind, otherwise the
/// built-in defaults for that kind.
fn base_ranges(shape: ShapeArg, current: &ShapeFamily) -> (SizeRange, SizeRange) {
    match (shape, *current) {
        (ShapeArg::Circle, ShapeFamily::Circle { radius }) => (radius, radius),
        (ShapeArg::Rectangle, ShapeFamily::Rectangle { width, height }) => (width, height),
        (
            ShapeArg::Ellipse,
            ShapeFamily::Ellipse {
                semi_major,
                semi_minor,
            },
        ) => (semi_major, semi_minor),
        (ShapeArg::Square, ShapeFamily::Square { side }) => (side, side),
        (ShapeArg::Circle, _) => (SizeRange::new(0.2, 0.5), SizeRange::new(0.2, 0.5)),
        (ShapeArg::Rectangle, _) => (SizeRange::new(0.5, 1.5), SizeRange::new(0.2, 0.6)),
        (ShapeArg::Ellipse, _) => (SizeRange::new(0.3, 0.8), SizeRange::new(0.1, 0.3)),
        (ShapeArg::Square, _) => (SizeRange::new(0.3, 0.7), SizeRange::new(0.3, 0.7)),
    }
}

fn shape_family(shape: ShapeArg, current: &ShapeFamily, args: &PackArgs) -> ShapeFamily {
    let (primary, secondary) = base_ranges(shape, current);
    let primary = SizeRange::new(
        args.min_size.unwrap_or(primary.min),
        args.max_size.unwrap_or(primary.max),
    );
    let secondary = SizeRange::new(
        args.min_secondary.unwrap_or(secondary.min),
        args.max_secondary.unwrap_or(secondary.max),
    );

    match shape {
        ShapeArg::Circle => ShapeFamily::Circle { radius: primary },
        ShapeArg::Rectangle => ShapeFamily::Rectangle {
            width: primary,
            height: secondary,
        },
        ShapeArg::Ellipse => ShapeFamily::Ellipse {
            semi_major: primary,
            semi_minor: secondary,
        },
        ShapeArg::Square => ShapeFamily::Square { side: primary },
    }
}
