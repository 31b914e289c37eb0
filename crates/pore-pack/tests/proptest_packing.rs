//! Property-based tests for pore packing.
//!
//! These tests use proptest to generate random configurations and seeds and
//! verify the packing invariants.
//!
//! Run with: cargo test -p pore-pack -- proptest

use pore_pack::{
    AttemptPolicy, PackingConfig, PackingTarget, PlacementPolicy, Pore, PorePacker, Rectangle,
    SizeRange, clearance, verify_layout,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// A size range with `0.1 <= min <= max <= 1.0`.
fn arb_size_range() -> impl Strategy<Value = SizeRange> {
    (0.1..0.6f64, 0.0..0.4f64).prop_map(|(min, extra)| SizeRange::new(min, min + extra))
}

fn arb_config() -> impl Strategy<Value = PackingConfig> {
    let family = prop_oneof![
        arb_size_range().prop_map(PackingConfig::circles),
        (arb_size_range(), arb_size_range()).prop_map(|(w, h)| PackingConfig::rectangles(w, h)),
        (arb_size_range(), arb_size_range()).prop_map(|(a, b)| PackingConfig::ellipses(a, b)),
        arb_size_range().prop_map(PackingConfig::squares),
    ];
    let target = prop_oneof![
        (1usize..40).prop_map(PackingTarget::count),
        (0.05..0.35f64).prop_map(PackingTarget::porosity),
        ((1usize..40), (0.05..0.35f64)).prop_map(|(n, p)| PackingTarget::both(n, p)),
    ];
    let placement = prop_oneof![Just(PlacementPolicy::Inset), Just(PlacementPolicy::Uniform)];
    let policy = prop_oneof![Just(AttemptPolicy::Consecutive), Just(AttemptPolicy::Global)];

    (
        family,
        target,
        placement,
        policy,
        0.0..0.4f64,
        5.0..12.0f64,
        5.0..12.0f64,
    )
        .prop_map(|(config, target, placement, policy, min_dist, w, h)| {
            config
                .with_domain(w, h)
                .with_min_dist(min_dist)
                .with_target(target)
                .with_placement(placement)
                .with_attempt_policy(policy)
                .with_max_attempts(800)
                .with_segments(32)
        })
}

// =============================================================================
// Property Tests: Packing Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Accepted pores keep the clearance from the walls and from each other.
    #[test]
    fn proptest_clearance_invariants(config in arb_config(), seed in any::<u64>()) {
        let result = PorePacker::seeded(seed).pack(&config).unwrap();
        let report = verify_layout(&result.domain, &result.pores, result.min_dist, 256);
        prop_assert!(report.is_valid(), "{}", report);
    }

    /// Neither the count nor the porosity target is ever overshot.
    #[test]
    fn proptest_never_overshoots(config in arb_config(), seed in any::<u64>()) {
        let result = PorePacker::seeded(seed).pack(&config).unwrap();
        if let Some(n) = config.target.count {
            prop_assert!(result.count() <= n);
        }
        if let Some(p) = config.target.porosity {
            prop_assert!(result.porosity <= p + 1e-12);
        }
    }

    /// The attempt counter never exceeds the budget, and a shortfall is
    /// reported exactly when the budget was hit.
    #[test]
    fn proptest_budget_accounting(config in arb_config(), seed in any::<u64>()) {
        let result = PorePacker::seeded(seed).pack(&config).unwrap();
        prop_assert!(result.attempts <= config.max_attempts);
        prop_assert!(result.total_attempts >= result.count());
        prop_assert_eq!(
            result.shortfall().is_some(),
            result.attempts == config.max_attempts && !result.is_complete()
        );
    }

    /// Same seed and configuration, same layout.
    #[test]
    fn proptest_deterministic(config in arb_config(), seed in any::<u64>()) {
        let a = PorePacker::seeded(seed).pack(&config).unwrap();
        let b = PorePacker::seeded(seed).pack(&config).unwrap();
        prop_assert_eq!(a, b);
    }
}

// =============================================================================
// Property Tests: Geometry
// =============================================================================

proptest! {
    /// Clearance is symmetric.
    #[test]
    fn proptest_clearance_symmetric(
        ax in 0.0..10.0f64, ay in 0.0..10.0f64,
        bx in 0.0..10.0f64, by in 0.0..10.0f64,
        angle in 0.0..3.2f64,
    ) {
        let a = Pore::Rectangle(Rectangle::new(ax, ay, 1.0, 0.5, angle));
        let b = Pore::Rectangle(Rectangle::new(bx, by, 0.7, 0.3, -angle));
        let ab = clearance(&a, &b, 64);
        let ba = clearance(&b, &a, 64);
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    /// Translation preserves area and shifts the bounding box.
    #[test]
    fn proptest_translate_preserves_shape(dx in -5.0..5.0f64, dy in -5.0..5.0f64) {
        let pore = Pore::Rectangle(Rectangle::new(1.0, 2.0, 1.5, 0.5, 0.3));
        let moved = pore.translate(dx, dy);
        prop_assert!((moved.area() - pore.area()).abs() < 1e-12);

        let (a, b) = (pore.bounding_rect(), moved.bounding_rect());
        prop_assert!((b.min().x - a.min().x - dx).abs() < 1e-9);
        prop_assert!((b.max().y - a.max().y - dy).abs() < 1e-9);
    }
}
