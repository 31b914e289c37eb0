//! Spherical pores in a box.
//!
//! The 3D counterpart of the 2D packer: spheres with radii drawn from a range
//! are placed in `[0, width] x [0, height] x [0, depth]` by the same
//! rejection loop. Every accepted sphere keeps `min_dist` from the box walls
//! and from every other sphere. The porosity target is a volume fraction.

use nalgebra::{Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{
    AttemptPolicy, PackingTarget, PlacementPolicy, SizeRange, check_fits, check_side,
};
use crate::error::{PackError, PackResult};
use crate::grid::SpatialGrid;
use crate::packer::{Arrangement, PorePacker, SamplingPlan, draw_interval, run_rejection};
use crate::result::{PackingShortfall, TerminationReason};
use crate::tracing_ext::{OperationTimer, log_sphere_result};

/// A spherical pore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Center.
    pub center: Point3<f64>,
    /// Radius.
    pub r: f64,
}

impl Sphere {
    /// Create a sphere.
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self {
            center: Point3::new(x, y, z),
            r,
        }
    }

    /// Volume.
    pub fn volume(&self) -> f64 {
        4.0 / 3.0 * std::f64::consts::PI * self.r.powi(3)
    }

    /// Surface-to-surface distance; negative when the spheres overlap.
    pub fn clearance(&self, other: &Sphere) -> f64 {
        (self.center - other.center).norm() - self.r - other.r
    }

    /// Smallest distance to any wall of the box `[0, size]`.
    pub fn wall_clearance(&self, size: &Vector3<f64>) -> f64 {
        let c = self.center.coords;
        let low = c.min() - self.r;
        let high = (size - c).min() - self.r;
        low.min(high)
    }

    fn bounds(&self) -> ([f64; 3], [f64; 3]) {
        let c = self.center;
        (
            [c.x - self.r, c.y - self.r, c.z - self.r],
            [c.x + self.r, c.y + self.r, c.z + self.r],
        )
    }
}

/// Configuration of a sphere packing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    /// Box extent along x.
    pub width: f64,
    /// Box extent along y.
    pub height: f64,
    /// Box extent along z.
    pub depth: f64,
    /// Radius bounds.
    pub radius: SizeRange,
    /// Clearance between spheres and to the walls.
    pub min_dist: f64,
    /// Termination target; `porosity` is a volume fraction.
    pub target: PackingTarget,
    /// Attempt budget.
    pub max_attempts: usize,
    /// How the attempt budget is charged.
    pub attempt_policy: AttemptPolicy,
    /// How centers are drawn.
    pub placement: PlacementPolicy,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            radius: SizeRange::new(0.05, 0.1),
            min_dist: 0.01,
            target: PackingTarget::count(100),
            max_attempts: 5000,
            attempt_policy: AttemptPolicy::Consecutive,
            placement: PlacementPolicy::Inset,
        }
    }
}

impl SphereConfig {
    /// Unit-cube configuration with the given radius bounds.
    pub fn new(radius: SizeRange) -> Self {
        Self {
            radius,
            ..Default::default()
        }
    }

    /// Set the box size.
    pub fn with_box(mut self, width: f64, height: f64, depth: f64) -> Self {
        self.width = width;
        self.height = height;
        self.depth = depth;
        self
    }

    /// Set the clearance distance.
    pub fn with_min_dist(mut self, min_dist: f64) -> Self {
        self.min_dist = min_dist;
        self
    }

    /// Replace the target.
    pub fn with_target(mut self, target: PackingTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set how the attempt budget is charged.
    pub fn with_attempt_policy(mut self, policy: AttemptPolicy) -> Self {
        self.attempt_policy = policy;
        self
    }

    /// Set how centers are drawn.
    pub fn with_placement(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    /// Box extents as a vector.
    pub fn size(&self) -> Vector3<f64> {
        Vector3::new(self.width, self.height, self.depth)
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        self.width * self.height * self.depth
    }

    /// Check every parameter.
    pub fn validate(&self) -> PackResult<()> {
        check_side("width", self.width)?;
        check_side("height", self.height)?;
        check_side("depth", self.depth)?;
        self.radius.check("radius")?;
        if !(self.min_dist >= 0.0 && self.min_dist.is_finite()) {
            return Err(PackError::invalid_clearance(self.min_dist));
        }
        self.target.validate()?;
        if self.max_attempts == 0 {
            return Err(PackError::InvalidBudget);
        }
        let min_side = self.width.min(self.height).min(self.depth);
        check_fits(2.0 * self.radius.min, self.min_dist, min_side)
    }
}

/// Accepted spheres plus run statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpherePackingResult {
    /// Accepted spheres in acceptance order.
    pub spheres: Vec<Sphere>,
    /// Box extents.
    pub size: Vector3<f64>,
    /// Clearance enforced during packing.
    pub min_dist: f64,
    /// Requested target.
    pub target: PackingTarget,
    /// Total sphere volume.
    pub pore_volume: f64,
    /// `pore_volume` over box volume.
    pub volume_fraction: f64,
    /// Attempt counter at termination.
    pub attempts: usize,
    /// Every candidate drawn.
    pub total_attempts: usize,
    /// Why the run stopped.
    pub termination: TerminationReason,
}

impl SpherePackingResult {
    /// Number of accepted spheres.
    pub fn count(&self) -> usize {
        self.spheres.len()
    }

    /// True when the run stopped because a target was reached.
    pub fn is_complete(&self) -> bool {
        self.termination != TerminationReason::BudgetExhausted
    }

    /// Achieved versus requested when the budget ran out first.
    pub fn shortfall(&self) -> Option<PackingShortfall> {
        if self.is_complete() {
            return None;
        }
        Some(PackingShortfall {
            target_count: self.target.count,
            achieved_count: self.count(),
            target_porosity: self.target.porosity,
            achieved_porosity: self.volume_fraction,
            attempts: self.attempts,
        })
    }
}

struct SphereArrangement<'a> {
    config: &'a SphereConfig,
    size: Vector3<f64>,
    accepted: Vec<Sphere>,
    grid: SpatialGrid<3>,
}

impl Arrangement for SphereArrangement<'_> {
    type Candidate = Sphere;

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Sphere> {
        let r = self.config.radius.sample(rng);
        let margin = match self.config.placement {
            PlacementPolicy::Inset => r + self.config.min_dist,
            PlacementPolicy::Uniform => 0.0,
        };
        let x = draw_interval(rng, margin, self.size.x - margin)?;
        let y = draw_interval(rng, margin, self.size.y - margin)?;
        let z = draw_interval(rng, margin, self.size.z - margin)?;
        Some(Sphere::new(x, y, z, r))
    }

    fn measure(&self, sphere: &Sphere) -> f64 {
        sphere.volume()
    }

    fn admits(&self, sphere: &Sphere) -> bool {
        let min_dist = self.config.min_dist;
        if !sphere.r.is_finite() || sphere.r <= 0.0 || sphere.wall_clearance(&self.size) < min_dist {
            return false;
        }
        let (lo, hi) = sphere.bounds();
        self.grid
            .query(lo, hi)
            .into_iter()
            .all(|i| sphere.clearance(&self.accepted[i]) >= min_dist)
    }

    fn commit(&mut self, sphere: Sphere) {
        let (lo, hi) = sphere.bounds();
        self.grid
            .insert(self.accepted.len(), lo, hi, self.config.min_dist);
        self.accepted.push(sphere);
    }

    fn len(&self) -> usize {
        self.accepted.len()
    }
}

/// Pack spheres according to `config`, drawing from `rng`.
///
/// # Errors
///
/// Returns a configuration error if `config` is invalid; nothing is drawn in
/// that case.
pub fn pack_spheres<R: Rng + ?Sized>(
    config: &SphereConfig,
    rng: &mut R,
) -> PackResult<SpherePackingResult> {
    config.validate()?;
    let _timer = OperationTimer::with_context("pack_spheres", "sphere", config.max_attempts);

    let r = config.radius.min;
    let plan = SamplingPlan {
        count: config.target.count,
        measure_budget: config.target.porosity.map(|p| p * config.volume()),
        min_measure: 4.0 / 3.0 * std::f64::consts::PI * r * r * r,
        max_attempts: config.max_attempts,
        policy: config.attempt_policy,
    };

    let mut arrangement = SphereArrangement {
        config,
        size: config.size(),
        accepted: Vec::new(),
        grid: SpatialGrid::new(2.0 * (config.radius.max + config.min_dist)),
    };
    let outcome = run_rejection(&mut arrangement, rng, &plan);

    let result = SpherePackingResult {
        spheres: arrangement.accepted,
        size: config.size(),
        min_dist: config.min_dist,
        target: config.target,
        pore_volume: outcome.accepted_measure,
        volume_fraction: outcome.accepted_measure / config.volume(),
        attempts: outcome.attempts,
        total_attempts: outcome.total_attempts,
        termination: outcome.termination,
    };
    log_sphere_result(&result);
    Ok(result)
}

impl<R: Rng> PorePacker<R> {
    /// Pack spheres with this packer's generator. See [`pack_spheres`].
    pub fn pack_spheres(&mut self, config: &SphereConfig) -> PackResult<SpherePackingResult> {
        pack_spheres(config, self.rng_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn assert_valid(result: &SpherePackingResult) {
        let m = result.min_dist;
        for (i, a) in result.spheres.iter().enumerate() {
            assert!(a.wall_clearance(&result.size) >= m - 1e-12);
            for b in &result.spheres[i + 1..] {
                assert!(a.clearance(b) >= m - 1e-12);
            }
        }
    }

    #[test]
    fn test_sphere_geometry() {
        let a = Sphere::new(1.0, 1.0, 1.0, 0.5);
        let b = Sphere::new(3.0, 1.0, 1.0, 0.5);
        assert!((a.clearance(&b) - 1.0).abs() < 1e-12);
        assert!((a.wall_clearance(&Vector3::new(10.0, 10.0, 1.75)) - 0.25).abs() < 1e-12);
        assert!((a.volume() - std::f64::consts::PI / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_config_packs_count() {
        let result = PorePacker::seeded(3)
            .pack_spheres(&SphereConfig::default().with_target(PackingTarget::count(40)))
            .unwrap();
        assert_eq!(result.count(), 40);
        assert_valid(&result);
    }

    #[test]
    fn test_volume_fraction_never_overshoots() {
        let config = SphereConfig::new(SizeRange::new(0.08, 0.12))
            .with_target(PackingTarget::porosity(0.1));
        let result = PorePacker::seeded(17).pack_spheres(&config).unwrap();

        assert!(result.volume_fraction <= 0.1 + 1e-12);
        assert!(result.count() > 0);
        assert_valid(&result);
    }

    #[test]
    fn test_uniform_placement_keeps_invariants() {
        let config = SphereConfig::default()
            .with_placement(PlacementPolicy::Uniform)
            .with_target(PackingTarget::count(20));
        let result = PorePacker::seeded(23).pack_spheres(&config).unwrap();
        assert_valid(&result);
    }

    #[test]
    fn test_infeasible_reports_shortfall() {
        let config = SphereConfig::new(SizeRange::new(0.3, 0.4))
            .with_min_dist(0.05)
            .with_target(PackingTarget::count(10))
            .with_max_attempts(300);
        let result = PorePacker::seeded(1).pack_spheres(&config).unwrap();

        assert!(result.count() < 10);
        assert_eq!(result.attempts, 300);
        assert!(result.shortfall().is_some());
        assert_valid(&result);
    }

    #[test]
    fn test_validation() {
        let err = SphereConfig::default().with_box(1.0, 1.0, 0.0).validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDomain);

        let err = SphereConfig::new(SizeRange::new(0.6, 0.7)).validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::PoreExceedsDomain);
    }

    #[test]
    fn test_same_seed_same_spheres() {
        let config = SphereConfig::default().with_target(PackingTarget::count(25));
        let a = PorePacker::seeded(5).pack_spheres(&config).unwrap();
        let b = PorePacker::seeded(5).pack_spheres(&config).unwrap();
        assert_eq!(a, b);
    }
}
