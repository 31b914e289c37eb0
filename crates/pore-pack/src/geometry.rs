//! Domain and geometric predicates shared by every shape kind.
//!
//! The predicates here are the whole validity test of the packer:
//!
//! - **Containment**: a pore, inflated by the clearance margin, must lie inside
//!   the domain rectangle. Inflating a shape by a disc grows its axis-aligned
//!   bounding box by exactly the margin, so the test runs on exact bounding
//!   boxes ([`Domain::wall_clearance`], [`contains_with_margin`]).
//! - **Non-overlap**: the distance between two pore boundaries must be at least
//!   the clearance margin ([`PreparedPore::is_clear_of`]). Circle pairs use the
//!   closed form `|c_a - c_b| - r_a - r_b`; a circle against a polygonal shape
//!   uses point-to-polygon distance minus the radius; everything else uses
//!   polygon distance.
//!
//! [`inflate`] exposes Minkowski-sum buffering (via Clipper's offset) for
//! callers that need the keep-out region itself, e.g. to draw it or to emit it
//! to a mesher.

use geo::{
    BoundingRect, Coord, EuclideanDistance, Intersects, LineString, MultiPolygon, Point, Polygon,
    Rect, coord,
};
use geo_clipper::{Clipper, EndType, JoinType};
use serde::{Deserialize, Serialize};

use crate::shape::Pore;

/// Integer scale used by Clipper. Coordinates are multiplied by this factor
/// and rounded, giving sub-micron resolution for domains up to ~1e9 units.
const CLIPPER_SCALE: f64 = 1.0e6;

/// Arc tolerance of rounded offset joins, relative to the offset distance.
const ARC_TOLERANCE_RATIO: f64 = 1.0e-3;

/// Rectangular background domain `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 10.0,
        }
    }
}

impl Domain {
    /// Create a domain of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Area of the domain.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Length of the shorter side.
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    /// Domain as an axis-aligned rectangle.
    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: self.width, y: self.height },
        )
    }

    /// Domain boundary as a counter-clockwise polygon.
    pub fn polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (self.width, 0.0),
                (self.width, self.height),
                (0.0, self.height),
            ]),
            vec![],
        )
    }

    /// Smallest distance from the pore's true boundary to any domain wall.
    ///
    /// Negative when the pore pokes out of the domain.
    pub fn wall_clearance(&self, pore: &Pore) -> f64 {
        rect_wall_clearance(self, &pore.bounding_rect())
    }

    /// True when the pore, inflated by `margin`, lies inside the domain.
    pub fn admits(&self, pore: &Pore, margin: f64) -> bool {
        pore.is_well_formed() && self.wall_clearance(pore) >= margin
    }
}

fn rect_wall_clearance(domain: &Domain, rect: &Rect<f64>) -> f64 {
    let min = rect.min();
    let max = rect.max();
    min.x
        .min(min.y)
        .min(domain.width - max.x)
        .min(domain.height - max.y)
}

/// Which polygon view of a curved pore to compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonView {
    /// Vertices on the true boundary. Distances are within the chord sagitta
    /// of the true distance, never below it.
    Boundary,
    /// Circumscribed polygon. Distances are a lower bound of the true distance.
    Enclosing,
}

/// A pore together with its cached polygon and bounding box.
///
/// The packer prepares each candidate once and each accepted pore once, so
/// pairwise checks never rebuild polygons.
#[derive(Debug, Clone)]
pub struct PreparedPore {
    pore: Pore,
    polygon: Polygon<f64>,
    rect: Rect<f64>,
}

impl PreparedPore {
    /// Prepare a pore with `segments` vertices per curved boundary.
    pub fn new(pore: Pore, segments: usize, view: PolygonView) -> Self {
        let polygon = match view {
            PolygonView::Boundary => pore.boundary_polygon(segments),
            PolygonView::Enclosing => pore.enclosing_polygon(segments),
        };
        Self {
            pore,
            polygon,
            rect: pore.bounding_rect(),
        }
    }

    /// The underlying pore.
    pub fn pore(&self) -> &Pore {
        &self.pore
    }

    /// The cached polygon.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Exact bounding box of the true shape.
    pub fn bounding_rect(&self) -> Rect<f64> {
        self.rect
    }

    /// Distance between the two boundaries.
    ///
    /// Negative or zero when the shapes overlap. For two polygonal shapes an
    /// overlap always reports exactly zero.
    pub fn clearance(&self, other: &PreparedPore) -> f64 {
        match (&self.pore, &other.pore) {
            (Pore::Circle(a), Pore::Circle(b)) => (a.x - b.x).hypot(a.y - b.y) - a.r - b.r,
            (Pore::Circle(a), _) => {
                Point::new(a.x, a.y).euclidean_distance(&other.polygon) - a.r
            }
            (_, Pore::Circle(b)) => {
                Point::new(b.x, b.y).euclidean_distance(&self.polygon) - b.r
            }
            _ => {
                if self.polygon.intersects(&other.polygon) {
                    0.0
                } else {
                    self.polygon.euclidean_distance(&other.polygon)
                }
            }
        }
    }

    /// True when the boundaries are at least `min_dist` apart and do not overlap.
    pub fn is_clear_of(&self, other: &PreparedPore, min_dist: f64) -> bool {
        let d = self.clearance(other);
        if !d.is_finite() {
            return false;
        }
        let involves_circle =
            matches!(self.pore, Pore::Circle(_)) || matches!(other.pore, Pore::Circle(_));
        if involves_circle {
            d >= min_dist
        } else {
            d > 0.0 && d >= min_dist
        }
    }
}

/// Boundary polygon of a pore with every vertex on the true boundary.
pub fn boundary_polygon(pore: &Pore, segments: usize) -> Polygon<f64> {
    pore.boundary_polygon(segments)
}

/// Minkowski-sum buffering of a polygon by `margin`.
///
/// Uses Clipper's polygon offset with round joins. A negative margin erodes
/// the polygon, which may split it or make it vanish (empty result).
pub fn inflate(polygon: &Polygon<f64>, margin: f64) -> MultiPolygon<f64> {
    if margin == 0.0 {
        return MultiPolygon::new(vec![polygon.clone()]);
    }
    polygon.offset(
        margin,
        JoinType::Round(margin.abs() * ARC_TOLERANCE_RATIO),
        EndType::ClosedPolygon,
        CLIPPER_SCALE,
    )
}

/// Standard polygon intersection test. Touching counts as intersecting.
pub fn intersects(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    a.intersects(b)
}

/// True iff `polygon` inflated by `margin` lies entirely inside `domain`.
///
/// Malformed polygons (empty or non-finite) are never contained.
pub fn contains_with_margin(domain: &Domain, polygon: &Polygon<f64>, margin: f64) -> bool {
    let Some(rect) = polygon.bounding_rect() else {
        return false;
    };
    let corners: [Coord<f64>; 2] = [rect.min(), rect.max()];
    if corners.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return false;
    }
    rect_wall_clearance(domain, &rect) >= margin
}

/// Boundary-to-boundary distance of two pores using on-boundary polygons.
pub fn clearance(a: &Pore, b: &Pore, segments: usize) -> f64 {
    PreparedPore::new(*a, segments, PolygonView::Boundary)
        .clearance(&PreparedPore::new(*b, segments, PolygonView::Boundary))
}

/// Conservative pairwise check used during packing.
///
/// Curved shapes are compared through their enclosing polygons, so `true`
/// guarantees a true boundary separation of at least `min_dist`.
pub fn pores_clear(a: &Pore, b: &Pore, min_dist: f64, segments: usize) -> bool {
    PreparedPore::new(*a, segments, PolygonView::Enclosing)
        .is_clear_of(&PreparedPore::new(*b, segments, PolygonView::Enclosing), min_dist)
}
