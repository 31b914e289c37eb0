//! Tracing extensions for packing operations.
//!
//! The library never installs a subscriber. Applications enable output by
//! initializing one:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=pore_pack=debug for per-run detail
//! ```
//!
//! # Targets
//!
//! - `pore_pack::timing`: operation timers
//! - `pore_pack::packing`: run summaries; shortfalls are logged at WARN
//! - `pore_pack::layout`: layout persistence and verification

use std::time::Instant;
use tracing::{Span, debug, info, warn};

use crate::result::PackingResult;
use crate::sphere::SpherePackingResult;
use crate::verify::LayoutReport;

/// A performance timer that logs duration on drop.
///
/// ```rust,ignore
/// use pore_pack::tracing_ext::OperationTimer;
///
/// fn expensive_operation() {
///     let _timer = OperationTimer::new("expensive_operation");
///     // ... do work ...
/// } // logs elapsed_ms here
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("pack_operation", operation = name);
        debug!(target: "pore_pack::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer tagged with the shape kind and attempt budget.
    pub fn with_context(name: &'static str, shape: &str, max_attempts: usize) -> Self {
        let span = tracing::info_span!(
            "pack_operation",
            operation = name,
            shape = shape,
            max_attempts = max_attempts
        );
        debug!(
            target: "pore_pack::timing",
            operation = name,
            shape = shape,
            max_attempts = max_attempts,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Get the span for this timer.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "pore_pack::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log a packing result. Shortfalls are logged at WARN.
pub fn log_packing_result(result: &PackingResult) {
    match result.shortfall() {
        None => info!(
            target: "pore_pack::packing",
            pores = result.count(),
            porosity = format!("{:.4}", result.porosity),
            attempts = result.attempts,
            total_attempts = result.total_attempts,
            termination = result.termination.as_str(),
            "Packing reached target"
        ),
        Some(shortfall) => warn!(
            target: "pore_pack::packing",
            pores = result.count(),
            target_count = shortfall.target_count,
            porosity = format!("{:.4}", result.porosity),
            target_porosity = shortfall.target_porosity,
            attempts = result.attempts,
            total_attempts = result.total_attempts,
            "Attempt budget exhausted before target"
        ),
    }
}

/// Log a sphere packing result. Shortfalls are logged at WARN.
pub fn log_sphere_result(result: &SpherePackingResult) {
    match result.shortfall() {
        None => info!(
            target: "pore_pack::packing",
            spheres = result.count(),
            volume_fraction = format!("{:.4}", result.volume_fraction),
            attempts = result.attempts,
            total_attempts = result.total_attempts,
            termination = result.termination.as_str(),
            "Sphere packing reached target"
        ),
        Some(shortfall) => warn!(
            target: "pore_pack::packing",
            spheres = result.count(),
            target_count = shortfall.target_count,
            volume_fraction = format!("{:.4}", result.volume_fraction),
            target_fraction = shortfall.target_porosity,
            attempts = result.attempts,
            total_attempts = result.total_attempts,
            "Attempt budget exhausted before target"
        ),
    }
}

/// Log a layout verification report.
pub fn log_layout_report(report: &LayoutReport) {
    if report.is_valid() {
        info!(
            target: "pore_pack::layout",
            pores = report.pore_count,
            porosity = format!("{:.4}", report.porosity),
            "Layout verification passed"
        );
    } else {
        warn!(
            target: "pore_pack::layout",
            pores = report.pore_count,
            violations = report.violations.len(),
            "Layout verification found violations"
        );
    }
}

/// Log a layout file operation.
pub fn log_io_operation(operation: &str, path: &std::path::Path, success: bool) {
    if success {
        info!(
            target: "pore_pack::layout",
            operation = operation,
            path = path.display().to_string(),
            "I/O operation completed"
        );
    } else {
        warn!(
            target: "pore_pack::layout",
            operation = operation,
            path = path.display().to_string(),
            "I/O operation failed"
        );
    }
}
