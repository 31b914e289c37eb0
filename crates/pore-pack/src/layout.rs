//! Persisted pore layouts.
//!
//! A layout is the record a downstream sweep needs to reuse one packing
//! across many experiments (for example the same pores meshed at several
//! resolutions): the domain, the clearance it was packed with, the seed, and
//! the per-pore records in acceptance order.
//!
//! Layouts are stored as JSON. Floats are written in shortest round-trip form
//! and parsed back exactly, so a reloaded layout is bit-for-bit identical.

use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PackingConfig;
use crate::error::{PackError, PackResult};
use crate::geometry::Domain;
use crate::packer::pack;
use crate::result::{MeshLoops, MeshSizes, PackingResult, curve_loops, porous_region};
use crate::shape::Pore;
use crate::tracing_ext::log_io_operation;

/// Current layout format version.
pub const LAYOUT_VERSION: u32 = 1;

/// A stored packing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoreLayout {
    /// Format version.
    pub version: u32,
    /// Domain the pores were packed into.
    pub domain: Domain,
    /// Clearance the pores satisfy.
    pub min_dist: f64,
    /// Seed of the run that produced the layout, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Pores in acceptance order.
    pub pores: Vec<Pore>,
}

impl PoreLayout {
    /// Layout from explicit parts.
    pub fn new(domain: Domain, min_dist: f64, pores: Vec<Pore>) -> Self {
        Self {
            version: LAYOUT_VERSION,
            domain,
            min_dist,
            seed: None,
            pores,
        }
    }

    /// Layout of a packing result.
    pub fn from_result(result: &PackingResult, seed: Option<u64>) -> Self {
        Self {
            version: LAYOUT_VERSION,
            domain: result.domain,
            min_dist: result.min_dist,
            seed,
            pores: result.pores.clone(),
        }
    }

    /// Number of pores.
    pub fn count(&self) -> usize {
        self.pores.len()
    }

    /// Total pore area.
    pub fn pore_area(&self) -> f64 {
        self.pores.iter().map(Pore::area).sum()
    }

    /// Pore area over domain area.
    pub fn porosity(&self) -> f64 {
        self.pore_area() / self.domain.area()
    }

    /// Domain polygon with one hole per pore.
    pub fn porous_region(&self, segments: usize) -> geo::Polygon<f64> {
        porous_region(&self.domain, &self.pores, segments)
    }

    /// Domain and pore loops tagged with element sizes.
    pub fn curve_loops(&self, segments: usize, sizes: MeshSizes) -> MeshLoops {
        curve_loops(&self.domain, &self.pores, segments, sizes)
    }

    /// Check that this layout was packed for the domain and clearance of
    /// `config`.
    pub fn check_matches(&self, config: &PackingConfig) -> Result<(), String> {
        if self.domain != config.domain {
            return Err(format!(
                "domain {} x {} differs from configured {} x {}",
                self.domain.width, self.domain.height, config.domain.width, config.domain.height
            ));
        }
        if self.min_dist != config.min_dist {
            return Err(format!(
                "min_dist {} differs from configured {}",
                self.min_dist, config.min_dist
            ));
        }
        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON without a version check.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Write the layout to `path` as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> PackResult<()> {
        let path = path.as_ref();
        let json = self
            .to_json()
            .map_err(|e| PackError::io_write(path, std::io::Error::other(e)))?;
        let written = std::fs::write(path, json).map_err(|e| PackError::io_write(path, e));
        log_io_operation("save_layout", path, written.is_ok());
        written
    }

    /// Read a layout from `path`.
    ///
    /// # Errors
    ///
    /// `IoRead` when the file can't be read, `ParseError` when it is not a
    /// layout or was written by a newer format version.
    pub fn load(path: impl AsRef<Path>) -> PackResult<Self> {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| PackError::io_read(path, e))
            .and_then(|contents| {
                Self::from_json(&contents).map_err(|e| PackError::parse_error(path, e.to_string()))
            })
            .and_then(|layout| {
                if layout.version > LAYOUT_VERSION {
                    Err(PackError::parse_error(
                        path,
                        format!(
                            "layout version {} is newer than supported version {}",
                            layout.version, LAYOUT_VERSION
                        ),
                    ))
                } else {
                    Ok(layout)
                }
            });
        log_io_operation("load_layout", path, loaded.is_ok());
        loaded
    }
}

/// Load the layout at `path` if it exists; otherwise pack one with `seed`
/// and save it there.
///
/// Returns the layout and, when it was freshly packed, the packing result.
///
/// # Errors
///
/// Configuration errors from `config`, persistence errors, or
/// `LayoutMismatch` when an existing layout was packed for a different domain
/// or clearance.
pub fn load_or_pack(
    path: impl AsRef<Path>,
    config: &PackingConfig,
    seed: u64,
) -> PackResult<(PoreLayout, Option<PackingResult>)> {
    let path = path.as_ref();
    config.validate()?;

    if path.exists() {
        let layout = PoreLayout::load(path)?;
        layout
            .check_matches(config)
            .map_err(|details| PackError::layout_mismatch(path, details))?;
        info!(
            target: "pore_pack::layout",
            path = path.display().to_string(),
            pores = layout.count(),
            "Reusing stored layout"
        );
        return Ok((layout, None));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let result = pack(config, &mut rng)?;
    let layout = PoreLayout::from_result(&result, Some(seed));
    layout.save(path)?;
    Ok((layout, Some(result)))
}
