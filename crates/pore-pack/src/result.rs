//! Packing results.

use geo::{LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::config::PackingTarget;
use crate::geometry::Domain;
use crate::shape::Pore;

/// Why a packing run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The target pore count was reached.
    TargetCount,
    /// The target porosity was reached.
    TargetPorosity,
    /// The attempt budget ran out first.
    BudgetExhausted,
}

impl TerminationReason {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::TargetCount => "target_count",
            TerminationReason::TargetPorosity => "target_porosity",
            TerminationReason::BudgetExhausted => "budget_exhausted",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Achieved versus requested, for a run that ran out of attempts.
///
/// This is a degraded success, not an error: every accepted pore still
/// satisfies the clearance invariants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackingShortfall {
    /// Requested count, if any.
    pub target_count: Option<usize>,
    /// Accepted count.
    pub achieved_count: usize,
    /// Requested porosity, if any.
    pub target_porosity: Option<f64>,
    /// Achieved porosity.
    pub achieved_porosity: f64,
    /// Attempt counter at termination.
    pub attempts: usize,
}

impl std::fmt::Display for PackingShortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "placed {} pores", self.achieved_count)?;
        if let Some(count) = self.target_count {
            write!(f, " of {count}")?;
        }
        write!(f, ", porosity {:.4}", self.achieved_porosity)?;
        if let Some(p) = self.target_porosity {
            write!(f, " of {p:.4}")?;
        }
        write!(f, " after {} attempts", self.attempts)
    }
}

/// Accepted pores plus run statistics. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingResult {
    /// Accepted pores in acceptance order.
    pub pores: Vec<Pore>,

    /// Domain the pores were packed into.
    pub domain: Domain,

    /// Clearance enforced during packing.
    pub min_dist: f64,

    /// Requested target.
    pub target: PackingTarget,

    /// Total area of accepted pores.
    pub pore_area: f64,

    /// `pore_area / domain.area()`.
    pub porosity: f64,

    /// Attempt counter at termination. Under the consecutive policy this is
    /// the number of rejections since the last acceptance.
    pub attempts: usize,

    /// Every candidate drawn, accepted or not.
    pub total_attempts: usize,

    /// Attempt budget of the run.
    pub max_attempts: usize,

    /// Why the run stopped.
    pub termination: TerminationReason,
}

impl PackingResult {
    /// Number of accepted pores.
    pub fn count(&self) -> usize {
        self.pores.len()
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
            achieved_porosity: self.porosity,
            attempts: self.attempts,
        })
    }

    /// Boundary polygon of every pore, in acceptance order.
    pub fn boundary_polygons(&self, segments: usize) -> Vec<Polygon<f64>> {
        self.pores
            .iter()
            .map(|p| p.boundary_polygon(segments))
            .collect()
    }

    /// The domain with one hole per pore: the outer curve loop plus one loop
    /// per pore, as a meshing engine consumes them.
    pub fn porous_region(&self, segments: usize) -> Polygon<f64> {
        porous_region(&self.domain, &self.pores, segments)
    }

    /// Domain and pore loops tagged with element sizes. See [`curve_loops`].
    pub fn curve_loops(&self, segments: usize, sizes: MeshSizes) -> MeshLoops {
        curve_loops(&self.domain, &self.pores, segments, sizes)
    }
}

/// Characteristic element sizes handed to a mesher with the curve loops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshSizes {
    /// Element size on pore boundaries.
    pub pore: f64,
    /// Element size on the domain boundary (background).
    pub domain: f64,
}

impl Default for MeshSizes {
    fn default() -> Self {
        Self {
            pore: 1e-2,
            domain: 5e-2,
        }
    }
}

impl MeshSizes {
    /// Create element sizes for pore boundaries and the background.
    pub fn new(pore: f64, domain: f64) -> Self {
        Self { pore, domain }
    }

    /// Both sizes positive and finite.
    pub fn is_valid(&self) -> bool {
        [self.pore, self.domain]
            .iter()
            .all(|h| h.is_finite() && *h > 0.0)
    }
}

/// One closed boundary loop and the element size at its vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveLoop {
    /// Closed ring.
    pub ring: LineString<f64>,
    pub mesh_size: f64,
}

/// Outer domain loop plus one loop per pore, in acceptance order.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshLoops {
    pub domain: CurveLoop,
    pub pores: Vec<CurveLoop>,
}

impl MeshLoops {
    /// Number of loops including the domain loop.
    pub fn len(&self) -> usize {
        self.pores.len() + 1
    }

    /// A domain loop is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The loops as a polygon with one hole per pore.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            self.domain.ring.clone(),
            self.pores.iter().map(|l| l.ring.clone()).collect(),
        )
    }
}

/// Curve loops for a mesher: the domain loop at `sizes.domain` and one loop
/// per pore at `sizes.pore`.
pub fn curve_loops(
    domain: &Domain,
    pores: &[Pore],
    segments: usize,
    sizes: MeshSizes,
) -> MeshLoops {
    MeshLoops {
        domain: CurveLoop {
            ring: domain.polygon().exterior().clone(),
            mesh_size: sizes.domain,
        },
        pores: pores
            .iter()
            .map(|p| CurveLoop {
                ring: p.boundary_polygon(segments).exterior().clone(),
                mesh_size: sizes.pore,
            })
            .collect(),
    }
}

/// Domain polygon with one interior ring per pore.
pub fn porous_region(domain: &Domain, pores: &[Pore], segments: usize) -> Polygon<f64> {
    let holes: Vec<LineString<f64>> = pores
        .iter()
        .map(|p| p.boundary_polygon(segments).exterior().clone())
        .collect();
    Polygon::new(domain.polygon().exterior().clone(), holes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Circle, Square};
    use approx::assert_relative_eq;
    use geo::Area;

    fn sample_result(termination: TerminationReason) -> PackingResult {
        let pores = vec![
            Pore::Circle(Circle::new(2.0, 2.0, 1.0)),
            Pore::Square(Square::new(7.0, 7.0, 2.0)),
        ];
        let pore_area: f64 = pores.iter().map(Pore::area).sum();
        PackingResult {
            pores,
            domain: Domain::new(10.0, 10.0),
            min_dist: 0.25,
            target: PackingTarget::count(5),
            pore_area,
            porosity: pore_area / 100.0,
            attempts: 1000,
            total_attempts: 1400,
            max_attempts: 1000,
            termination,
        }
    }

    #[test]
    fn test_shortfall_only_when_budget_exhausted() {
        let done = sample_result(TerminationReason::TargetCount);
        assert!(done.is_complete());
        assert!(done.shortfall().is_none());

        let partial = sample_result(TerminationReason::BudgetExhausted);
        let shortfall = partial.shortfall().expect("shortfall");
        assert_eq!(shortfall.target_count, Some(5));
        assert_eq!(shortfall.achieved_count, 2);
        assert_eq!(shortfall.attempts, 1000);
        assert!(shortfall.to_string().starts_with("placed 2 pores of 5"));
    }

    #[test]
    fn test_porous_region_subtracts_pores() {
        let result = sample_result(TerminationReason::TargetCount);
        let region = result.porous_region(256);

        assert_eq!(region.interiors().len(), 2);
        let expected = 100.0 - result.pore_area;
        assert_relative_eq!(region.unsigned_area(), expected, epsilon = 1e-3);
    }

    #[test]
    fn test_boundary_polygons_in_order() {
        let result = sample_result(TerminationReason::TargetCount);
        let polygons = result.boundary_polygons(32);
        assert_eq!(polygons.len(), 2);
        assert_relative_eq!(polygons[1].unsigned_area(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_loops_carry_mesh_sizes() {
        let result = sample_result(TerminationReason::TargetCount);
        let sizes = MeshSizes::new(0.02, 0.1);
        let loops = result.curve_loops(64, sizes);

        assert_eq!(loops.len(), 3);
        assert_eq!(loops.domain.mesh_size, 0.1);
        assert!(loops.pores.iter().all(|l| l.mesh_size == 0.02));
        assert_eq!(loops.to_polygon(), result.porous_region(64));
    }

    #[test]
    fn test_default_mesh_sizes() {
        let sizes = MeshSizes::default();
        assert!(sizes.is_valid());
        assert!(sizes.pore < sizes.domain);
        assert!(!MeshSizes::new(0.0, 0.1).is_valid());
        assert!(!MeshSizes::new(0.01, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_termination_names() {
        assert_eq!(TerminationReason::BudgetExhausted.to_string(), "budget_exhausted");
        let json = serde_json::to_string(&TerminationReason::TargetPorosity).expect("json");
        assert_eq!(json, "\"target_porosity\"");
    }
}
