//! Independent audit of a pore layout.
//!
//! [`verify_layout`] re-checks every invariant a packing guarantees, using
//! on-boundary polygons rather than the conservative polygons the packer
//! uses. It works on any layout, freshly packed or loaded from disk.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geometry::{Domain, PolygonView, PreparedPore};
use crate::shape::Pore;
use crate::tracing_ext::log_layout_report;

/// Absolute slack allowed on every clearance comparison.
pub const CLEARANCE_TOLERANCE: f64 = 1e-9;

/// One broken invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutViolation {
    /// A pore has a non-positive or non-finite parameter.
    MalformedPore { index: usize },
    /// A pore is closer to the domain wall than the clearance.
    WallClearance { index: usize, clearance: f64 },
    /// Two pores are closer than the clearance (or overlap).
    PairClearance {
        first: usize,
        second: usize,
        clearance: f64,
    },
}

impl std::fmt::Display for LayoutViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutViolation::MalformedPore { index } => write!(f, "pore {index} is malformed"),
            LayoutViolation::WallClearance { index, clearance } => {
                write!(f, "pore {index} is {clearance:.6} from the domain wall")
            }
            LayoutViolation::PairClearance {
                first,
                second,
                clearance,
            } => write!(f, "pores {first} and {second} are {clearance:.6} apart"),
        }
    }
}

/// Result of auditing a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    /// Number of pores.
    pub pore_count: usize,

    /// Total pore area.
    pub pore_area: f64,

    /// Pore area over domain area.
    pub porosity: f64,

    /// Clearance the layout was checked against.
    pub min_dist: f64,

    /// Smallest pore-to-wall distance, if any pore exists.
    pub min_wall_clearance: Option<f64>,

    /// Smallest pore-to-pore distance, if at least two pores exist.
    pub min_pair_clearance: Option<f64>,

    /// Every broken invariant.
    pub violations: Vec<LayoutViolation>,
}

impl LayoutReport {
    /// True when no invariant is broken.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

impl std::fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Layout Report:")?;
        writeln!(f, "  Pores: {}", self.pore_count)?;
        writeln!(f, "  Pore area: {:.4}", self.pore_area)?;
        writeln!(f, "  Porosity: {:.4}", self.porosity)?;
        writeln!(f, "  Required clearance: {}", self.min_dist)?;
        if let Some(d) = self.min_wall_clearance {
            writeln!(f, "  Closest wall: {d:.6}")?;
        }
        if let Some(d) = self.min_pair_clearance {
            writeln!(f, "  Closest pair: {d:.6}")?;
        }
        writeln!(
            f,
            "  Valid: {} ({} violations)",
            if self.is_valid() { "yes" } else { "NO" },
            self.violations.len()
        )?;
        Ok(())
    }
}

/// Audit `pores` against `domain` and `min_dist`.
///
/// Curved boundaries are approximated with `segments` vertices on the true
/// boundary. Pairs are scanned in parallel; pairs whose clearance-grown
/// bounding boxes are disjoint are skipped.
pub fn verify_layout(domain: &Domain, pores: &[Pore], min_dist: f64, segments: usize) -> LayoutReport {
    let mut violations = Vec::new();

    let mut min_wall_clearance: Option<f64> = None;
    for (index, pore) in pores.iter().enumerate() {
        if !pore.is_well_formed() {
            violations.push(LayoutViolation::MalformedPore { index });
            continue;
        }
        let clearance = domain.wall_clearance(pore);
        min_wall_clearance = Some(min_wall_clearance.map_or(clearance, |m| m.min(clearance)));
        if clearance < min_dist - CLEARANCE_TOLERANCE {
            violations.push(LayoutViolation::WallClearance { index, clearance });
        }
    }

    let prepared: Vec<Option<PreparedPore>> = pores
        .iter()
        .map(|p| {
            p.is_well_formed()
                .then(|| PreparedPore::new(*p, segments, PolygonView::Boundary))
        })
        .collect();

    // Each pair: (first, second, clearance, clear)
    let pairs: Vec<(usize, usize, f64, bool)> = (0..prepared.len())
        .into_par_iter()
        .flat_map(|i| {
            let mut local = Vec::new();
            let Some(a) = &prepared[i] else {
                return local;
            };
            let ra = a.bounding_rect();
            for (j, b) in prepared.iter().enumerate().skip(i + 1) {
                let Some(b) = b else {
                    continue;
                };
                let rb = b.bounding_rect();
                let gap_x = (rb.min().x - ra.max().x).max(ra.min().x - rb.max().x);
                let gap_y = (rb.min().y - ra.max().y).max(ra.min().y - rb.max().y);
                if gap_x > min_dist || gap_y > min_dist {
                    continue;
                }
                let clearance = a.clearance(b);
                let clear = a.is_clear_of(b, min_dist - CLEARANCE_TOLERANCE);
                local.push((i, j, clearance, clear));
            }
            local
        })
        .collect();

    let mut min_pair_clearance: Option<f64> = None;
    for (first, second, clearance, clear) in pairs {
        min_pair_clearance = Some(min_pair_clearance.map_or(clearance, |m| m.min(clearance)));
        if !clear {
            violations.push(LayoutViolation::PairClearance {
                first,
                second,
                clearance,
            });
        }
    }

    let pore_area: f64 = pores.iter().map(Pore::area).sum();
    let report = LayoutReport {
        pore_count: pores.len(),
        pore_area,
        porosity: pore_area / domain.area(),
        min_dist,
        min_wall_clearance,
        min_pair_clearance,
        violations,
    };
    log_layout_report(&report);
    report
}
