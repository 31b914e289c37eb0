//! Random non-overlapping pore placement by rejection sampling.
//!
//! # Algorithm
//!
//! 1. Validate the configuration. Invalid configurations fail here, before
//!    the first random draw.
//! 2. Repeat until a target is reached or the attempt counter hits
//!    `max_attempts`:
//!    - draw sizes, rotation and center;
//!    - reject if the pore plus `min_dist` leaves the domain;
//!    - reject if the pore would push the pore area past the porosity target;
//!    - reject if any accepted pore sharing a grid cell is closer than
//!      `min_dist`;
//!    - otherwise accept it.
//! 3. Return the accepted pores in acceptance order.
//!
//! Running out of attempts is a degraded success: the result is complete and
//! valid, and [`PackingResult::shortfall`] reports what is missing.
//!
//! # Determinism
//!
//! Every draw comes from the generator the caller passes in. The same seed
//! and configuration always yield the same pores in the same order.
//!
//! # Example
//!
//! ```
//! use pore_pack::{PackingConfig, PorePacker, SizeRange};
//!
//! let config = PackingConfig::circles(SizeRange::new(0.2, 0.5))
//!     .with_min_dist(0.25)
//!     .with_target_count(10);
//!
//! let result = PorePacker::seeded(42).pack(&config).unwrap();
//! assert_eq!(result.count(), 10);
//! assert!(result.shortfall().is_none());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::config::{AttemptPolicy, PackingConfig, PlacementPolicy};
use crate::error::PackResult;
use crate::geometry::{PolygonView, PreparedPore};
use crate::grid::SpatialGrid;
use crate::result::{PackingResult, TerminationReason};
use crate::shape::Pore;
use crate::tracing_ext::{OperationTimer, log_packing_result};

/// A growing set of accepted items that candidates are tested against.
///
/// The 2D pore packer and the sphere packer both implement this and share
/// [`run_rejection`].
pub(crate) trait Arrangement {
    type Candidate;

    /// Draw one candidate. `None` marks a degenerate draw (for example an
    /// empty placement interval), which counts as a rejected attempt.
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Self::Candidate>;

    /// Area or volume the candidate would add.
    fn measure(&self, candidate: &Self::Candidate) -> f64;

    /// Containment and clearance checks.
    fn admits(&self, candidate: &Self::Candidate) -> bool;

    /// Accept a candidate that passed [`Arrangement::admits`].
    fn commit(&mut self, candidate: Self::Candidate);

    /// Number of accepted items.
    fn len(&self) -> usize;
}

/// Termination rules of one run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SamplingPlan {
    pub count: Option<usize>,
    /// Area or volume at which the porosity target is met.
    pub measure_budget: Option<f64>,
    /// Smallest area or volume one item can have.
    pub min_measure: f64,
    pub max_attempts: usize,
    pub policy: AttemptPolicy,
}

impl SamplingPlan {
    fn reached(&self, accepted: usize, measure: f64) -> Option<TerminationReason> {
        if self.count.is_some_and(|n| accepted >= n) {
            return Some(TerminationReason::TargetCount);
        }
        if self
            .measure_budget
            .is_some_and(|budget| budget - measure < self.min_measure)
        {
            return Some(TerminationReason::TargetPorosity);
        }
        None
    }

    fn fits_budget(&self, measure: f64, extra: f64) -> bool {
        self.measure_budget
            .is_none_or(|budget| measure + extra <= budget)
    }
}

/// Counters of a finished run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SamplingOutcome {
    pub attempts: usize,
    pub total_attempts: usize,
    pub accepted_measure: f64,
    pub termination: TerminationReason,
}

/// Shared rejection-sampling loop.
pub(crate) fn run_rejection<A, R>(
    arrangement: &mut A,
    rng: &mut R,
    plan: &SamplingPlan,
) -> SamplingOutcome
where
    A: Arrangement,
    R: Rng + ?Sized,
{
    let mut attempts = 0usize;
    let mut total_attempts = 0usize;
    let mut measure = 0.0f64;

    let termination = loop {
        if let Some(reason) = plan.reached(arrangement.len(), measure) {
            break reason;
        }
        if attempts >= plan.max_attempts {
            break TerminationReason::BudgetExhausted;
        }

        total_attempts += 1;
        let accepted = match arrangement.draw(rng) {
            Some(candidate) => {
                let extra = arrangement.measure(&candidate);
                if plan.fits_budget(measure, extra) && arrangement.admits(&candidate) {
                    arrangement.commit(candidate);
                    measure += extra;
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        match (accepted, plan.policy) {
            (true, AttemptPolicy::Consecutive) => {
                trace!(
                    target: "pore_pack::packing",
                    accepted = arrangement.len(),
                    after_attempts = attempts + 1,
                    "Candidate accepted"
                );
                attempts = 0;
            }
            (true, AttemptPolicy::Global) | (false, _) => attempts += 1,
        }
    };

    SamplingOutcome {
        attempts,
        total_attempts,
        accepted_measure: measure,
        termination,
    }
}

/// Draw uniformly from `[lo, hi]`, or `None` when the interval is empty.
pub(crate) fn draw_interval<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> Option<f64> {
    if lo.is_finite() && hi.is_finite() && lo <= hi {
        Some(rng.gen_range(lo..=hi))
    } else {
        None
    }
}

/// Accepted pores of one run, indexed by a spatial grid.
struct PoreArrangement<'a> {
    config: &'a PackingConfig,
    accepted: Vec<PreparedPore>,
    grid: SpatialGrid<2>,
}

impl<'a> PoreArrangement<'a> {
    fn new(config: &'a PackingConfig) -> Self {
        let cell_size = 2.0 * (config.shape.max_circumradius() + config.min_dist);
        Self {
            config,
            accepted: Vec::new(),
            grid: SpatialGrid::new(cell_size),
        }
    }

    fn prepare(&self, pore: Pore) -> PreparedPore {
        PreparedPore::new(pore, self.config.segments, PolygonView::Enclosing)
    }

    fn into_pores(self) -> Vec<Pore> {
        self.accepted.into_iter().map(|p| *p.pore()).collect()
    }
}

impl Arrangement for PoreArrangement<'_> {
    type Candidate = Pore;

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Pore> {
        let config = self.config;
        let pore = config.shape.sample(rng, &config.rotation);
        let domain = &config.domain;

        let (x, y) = match config.placement {
            PlacementPolicy::Inset => {
                let (hx, hy) = pore.half_extents();
                let m = config.min_dist;
                let x = draw_interval(rng, hx + m, domain.width - hx - m)?;
                let y = draw_interval(rng, hy + m, domain.height - hy - m)?;
                (x, y)
            }
            PlacementPolicy::Uniform => (
                rng.gen_range(0.0..=domain.width),
                rng.gen_range(0.0..=domain.height),
            ),
        };
        Some(pore.translate(x, y))
    }

    fn measure(&self, pore: &Pore) -> f64 {
        pore.area()
    }

    fn admits(&self, pore: &Pore) -> bool {
        let min_dist = self.config.min_dist;
        if !self.config.domain.admits(pore, min_dist) {
            return false;
        }

        let rect = pore.bounding_rect();
        let (lo, hi) = (rect.min(), rect.max());
        let neighbours = self.grid.query([lo.x, lo.y], [hi.x, hi.y]);
        if neighbours.is_empty() {
            return true;
        }

        let candidate = self.prepare(*pore);
        neighbours
            .into_iter()
            .all(|i| candidate.is_clear_of(&self.accepted[i], min_dist))
    }

    fn commit(&mut self, pore: Pore) {
        let prepared = self.prepare(pore);
        let rect = prepared.bounding_rect();
        let (lo, hi) = (rect.min(), rect.max());
        self.grid.insert(
            self.accepted.len(),
            [lo.x, lo.y],
            [hi.x, hi.y],
            self.config.min_dist,
        );
        self.accepted.push(prepared);
    }

    fn len(&self) -> usize {
        self.accepted.len()
    }
}

/// Pack pores according to `config`, drawing from `rng`.
///
/// # Errors
///
/// Returns a configuration error if `config` is invalid. No random number is
/// drawn in that case. A run that exhausts its attempt budget is *not* an
/// error.
pub fn pack<R: Rng + ?Sized>(config: &PackingConfig, rng: &mut R) -> PackResult<PackingResult> {
    config.validate()?;

    let _timer = OperationTimer::with_context(
        "pack",
        config.shape.kind().as_str(),
        config.max_attempts,
    );

    let plan = SamplingPlan {
        count: config.target.count,
        measure_budget: config.target_area(),
        min_measure: config.shape.min_area(),
        max_attempts: config.max_attempts,
        policy: config.attempt_policy,
    };
    debug!(
        target: "pore_pack::packing",
        shape = config.shape.kind().as_str(),
        width = config.domain.width,
        height = config.domain.height,
        min_dist = config.min_dist,
        target_count = config.target.count,
        target_porosity = config.target.porosity,
        "Starting pore packing"
    );

    let mut arrangement = PoreArrangement::new(config);
    let outcome = run_rejection(&mut arrangement, rng, &plan);
    let pores = arrangement.into_pores();

    let result = PackingResult {
        pores,
        domain: config.domain,
        min_dist: config.min_dist,
        target: config.target,
        pore_area: outcome.accepted_measure,
        porosity: outcome.accepted_measure / config.domain.area(),
        attempts: outcome.attempts,
        total_attempts: outcome.total_attempts,
        max_attempts: config.max_attempts,
        termination: outcome.termination,
    };
    log_packing_result(&result);
    Ok(result)
}

/// Owns a random generator and packs configurations with it.
///
/// Successive calls continue the generator's stream, so each call yields an
/// independent layout. Use one packer per worker thread.
#[derive(Debug, Clone)]
pub struct PorePacker<R = ChaCha8Rng> {
    rng: R,
}

impl PorePacker<ChaCha8Rng> {
    /// Packer over a `ChaCha8Rng` seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> PorePacker<R> {
    /// Packer over a caller-supplied generator.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Pack one layout. See [`pack`].
    pub fn pack(&mut self, config: &PackingConfig) -> PackResult<PackingResult> {
        pack(config, &mut self.rng)
    }

    /// Mutable access to the generator.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Consume the packer, returning the generator.
    pub fn into_rng(self) -> R {
        self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PackingTarget, SizeRange};
    use crate::error::ErrorCode;
    use crate::geometry::Domain;
    use rand::RngCore;

    fn assert_valid(result: &PackingResult, segments: usize) {
        let m = result.min_dist;
        for (i, a) in result.pores.iter().enumerate() {
            assert!(result.domain.wall_clearance(a) >= m - 1e-9, "pore {i} too close to wall");
            for (j, b) in result.pores.iter().enumerate().skip(i + 1) {
                let d = crate::geometry::clearance(a, b, segments);
                assert!(d >= m - 1e-9, "pores {i} and {j} are {d} apart");
            }
        }
    }

    #[test]
    fn test_count_target_reached_exactly() {
        let config = PackingConfig::circles(SizeRange::new(0.2, 0.4)).with_target_count(5);
        let result = PorePacker::seeded(1).pack(&config).unwrap();

        assert_eq!(result.count(), 5);
        assert_eq!(result.termination, TerminationReason::TargetCount);
        assert!(result.total_attempts < 10_000);
        assert_valid(&result, 256);
    }

    #[test]
    fn test_zero_count_returns_empty_result() {
        let config = PackingConfig::default().with_target_count(0);
        let result = PorePacker::seeded(1).pack(&config).unwrap();

        assert!(result.pores.is_empty());
        assert_eq!(result.total_attempts, 0);
        assert!(result.is_complete());
    }

    #[test]
    fn test_porosity_never_overshoots() {
        let config = PackingConfig::squares(SizeRange::new(0.3, 0.9)).with_target_porosity(0.2);
        let result = PorePacker::seeded(9).pack(&config).unwrap();

        assert!(!result.pores.is_empty());
        assert!(result.pore_area <= 0.2 * 100.0);
        let sum: f64 = result.pores.iter().map(Pore::area).sum();
        assert!((sum - result.pore_area).abs() < 1e-9);
        assert_valid(&result, 256);
    }

    #[test]
    fn test_infeasible_target_exhausts_budget() {
        let config = PackingConfig::circles(SizeRange::new(3.0, 4.0))
            .with_target_count(5)
            .with_max_attempts(1000);
        let result = PorePacker::seeded(3).pack(&config).unwrap();

        assert_eq!(result.count(), 1);
        assert_eq!(result.attempts, 1000);
        assert_eq!(result.total_attempts, 1001);
        assert_eq!(result.termination, TerminationReason::BudgetExhausted);
        let shortfall = result.shortfall().unwrap();
        assert_eq!(shortfall.target_count, Some(5));
        assert_eq!(shortfall.achieved_count, 1);
    }

    #[test]
    fn test_global_policy_counts_every_draw() {
        let config = PackingConfig::circles(SizeRange::new(3.0, 4.0))
            .with_target_count(5)
            .with_max_attempts(200)
            .with_attempt_policy(AttemptPolicy::Global);
        let result = PorePacker::seeded(3).pack(&config).unwrap();

        assert_eq!(result.attempts, 200);
        assert_eq!(result.total_attempts, 200);
        assert_eq!(result.count(), 1);
    }

    #[test]
    fn test_uniform_placement_keeps_invariants() {
        let config = PackingConfig::rectangles(SizeRange::new(0.4, 1.2), SizeRange::new(0.2, 0.5))
            .with_placement(PlacementPolicy::Uniform)
            .with_target_count(25);
        let result = PorePacker::seeded(5).pack(&config).unwrap();

        assert!(!result.pores.is_empty());
        assert_valid(&result, 64);
    }

    #[test]
    fn test_mixed_target_stops_at_first() {
        let config = PackingConfig::circles(SizeRange::new(0.2, 0.3))
            .with_target(PackingTarget::both(3, 0.3));
        let result = PorePacker::seeded(2).pack(&config).unwrap();
        assert_eq!(result.count(), 3);
        assert_eq!(result.termination, TerminationReason::TargetCount);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let config = PackingConfig::ellipses(SizeRange::new(0.3, 0.7), SizeRange::new(0.1, 0.3))
            .with_target_porosity(0.15);
        let a = PorePacker::seeded(11).pack(&config).unwrap();
        let b = PorePacker::seeded(11).pack(&config).unwrap();
        let c = PorePacker::seeded(12).pack(&config).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.pores, c.pores);
    }

    #[test]
    fn test_invalid_config_draws_nothing() {
        let config = PackingConfig::circles(SizeRange::new(6.0, 7.0));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let err = pack(&config, &mut rng).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PoreExceedsDomain);

        let mut fresh = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(rng.next_u64(), fresh.next_u64());
    }

    #[test]
    fn test_overflowing_rotation_span_is_rejected() {
        let config = PackingConfig::squares(SizeRange::new(0.3, 0.7))
            .with_rotation(-f64::MAX, f64::MAX)
            .with_target_count(3);
        let err = PorePacker::seeded(1).pack(&config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRotation);
    }

    #[test]
    fn test_packer_stream_continues() {
        let config = PackingConfig::default().with_target_count(4);
        let mut packer = PorePacker::seeded(8);
        let first = packer.pack(&config).unwrap();
        let second = packer.pack(&config).unwrap();
        assert_ne!(first.pores, second.pores);
    }

    #[test]
    fn test_empty_inset_interval_counts_as_attempt() {
        // Narrow strip: tall rectangles rotated by 90 degrees never fit.
        let config = PackingConfig::rectangles(SizeRange::fixed(3.0), SizeRange::fixed(0.5))
            .with_domain(10.0, 1.0)
            .with_min_dist(0.1)
            .with_rotation(std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2)
            .with_target_count(1)
            .with_max_attempts(50);
        let result = PorePacker::seeded(6).pack(&config).unwrap();

        assert_eq!(result.count(), 0);
        assert_eq!(result.attempts, 50);
        assert_eq!(result.domain, Domain::new(10.0, 1.0));
    }

    #[test]
    fn test_run_rejection_with_fixed_draws() {
        struct Slots {
            free: Vec<bool>,
            taken: usize,
        }
        impl Arrangement for Slots {
            type Candidate = usize;
            fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
                Some(rng.gen_range(0..self.free.len()))
            }
            fn measure(&self, _: &usize) -> f64 {
                1.0
            }
            fn admits(&self, slot: &usize) -> bool {
                self.free[*slot]
            }
            fn commit(&mut self, slot: usize) {
                self.free[slot] = false;
                self.taken += 1;
            }
            fn len(&self) -> usize {
                self.taken
            }
        }

        let mut slots = Slots {
            free: vec![true; 4],
            taken: 0,
        };
        let plan = SamplingPlan {
            count: None,
            measure_budget: Some(2.5),
            min_measure: 1.0,
            max_attempts: 100,
            policy: AttemptPolicy::Consecutive,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let outcome = run_rejection(&mut slots, &mut rng, &plan);

        // Two units fit in a budget of 2.5; the remaining 0.5 is below one unit.
        assert_eq!(slots.taken, 2);
        assert_eq!(outcome.termination, TerminationReason::TargetPorosity);
        assert_eq!(outcome.accepted_measure, 2.0);
    }
}
