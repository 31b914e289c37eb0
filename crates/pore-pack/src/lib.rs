//! Random non-overlapping pore packing for porous-material geometry.
//!
//! This crate places circular, rectangular, elliptical or square pores in a
//! rectangular domain by randomized rejection sampling, so that every pore
//! keeps a minimum clearance from the domain walls and from every other pore.
//! The resulting layouts feed a meshing engine (one curve loop per pore) for
//! finite-element homogenization studies.
//!
//! # Features
//!
//! - **Packing**: count or porosity targets, attempt budgets, seeded RNG
//! - **Shapes**: circles, rotated rectangles, rotated ellipses, rotated squares
//! - **Geometry**: boundary polygons, Minkowski buffering, clearance predicates
//! - **Persistence**: bit-exact JSON layouts, load-or-pack for parameter sweeps
//! - **Verification**: independent audit of any stored layout
//! - **Batches**: parallel instances with per-instance generators
//! - **3D**: sphere packing in a box with the same sampling loop
//!
//! # Units
//!
//! Lengths are unitless; domain size, pore sizes and `min_dist` just need to
//! share a unit. Angles are radians, counter-clockwise.
//!
//! # Quick Start
//!
//! ```
//! use pore_pack::{PackingConfig, PorePacker, SizeRange};
//!
//! // 10 x 10 domain, circles with r in [0.2, 0.5], 0.25 clearance, 30% porosity
//! let config = PackingConfig::circles(SizeRange::new(0.2, 0.5))
//!     .with_min_dist(0.25)
//!     .with_target_porosity(0.3);
//!
//! let result = PorePacker::seeded(42).pack(&config).unwrap();
//! assert!(result.porosity <= 0.3);
//!
//! if let Some(shortfall) = result.shortfall() {
//!     println!("degraded: {shortfall}");
//! }
//! ```
//!
//! # Reusing one layout across a sweep
//!
//! ```no_run
//! use pore_pack::{MeshSizes, PackingConfig, load_or_pack};
//!
//! let config = PackingConfig::default();
//! for mesh_size in [0.1, 0.05, 0.025] {
//!     // Packed on the first iteration, loaded afterwards.
//!     let (layout, _) = load_or_pack("layout.json", &config, 7).unwrap();
//!     let loops = layout.curve_loops(128, MeshSizes::new(mesh_size / 5.0, mesh_size));
//!     println!("h = {mesh_size}: {} loops", loops.len());
//! }
//! ```
//!
//! # Error Handling
//!
//! Invalid configurations fail with a [`PackError`] before any random number
//! is drawn. Exhausting the attempt budget is not an error; check
//! [`PackingResult::shortfall`].

mod error;
pub mod tracing_ext;

pub mod batch;
pub mod config;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod packer;
pub mod result;
pub mod shape;
pub mod sphere;
pub mod verify;

// Core exports
pub use error::{ErrorCode, PackError, PackResult, RecoverySuggestion};
pub use shape::{Circle, Ellipse, MIN_SEGMENTS, Pore, Rectangle, ShapeKind, Square};

// Configuration and packing
pub use config::{
    AttemptPolicy, PackingConfig, PackingTarget, PlacementPolicy, RotationRange, ShapeFamily,
    SizeRange,
};
pub use packer::{PorePacker, pack};
pub use result::{
    CurveLoop, MeshLoops, MeshSizes, PackingResult, PackingShortfall, TerminationReason,
    curve_loops,
};

// Geometry
pub use geometry::{
    Domain, PolygonView, PreparedPore, boundary_polygon, clearance, contains_with_margin, inflate,
    intersects, pores_clear,
};
pub use grid::SpatialGrid;

// Persistence, verification, batches
pub use batch::{BatchItem, derive_seeds, pack_batch, pack_sweep};
pub use layout::{LAYOUT_VERSION, PoreLayout, load_or_pack};
pub use verify::{LayoutReport, LayoutViolation, verify_layout};

// 3D
pub use sphere::{Sphere, SphereConfig, SpherePackingResult, pack_spheres};
