//! Pore shapes.
//!
//! A [`Pore`] is a flat sum type over the supported shape kinds. Every variant
//! carries its own center `(x, y)` in domain coordinates and the parameters of
//! its geometric formula. Pores are plain `Copy` values: once a pore has been
//! accepted by the packer it is never mutated, and [`Pore::translate`] /
//! [`Pore::rotate`] return new values.
//!
//! # Polygon views
//!
//! Two polygon views exist for every pore:
//!
//! - [`Pore::boundary_polygon`] puts every vertex *on* the true boundary. This
//!   is the view emitted to a meshing engine.
//! - [`Pore::enclosing_polygon`] is circumscribed around curved boundaries, so
//!   the true shape lies inside it. Clearance checks use this view, which makes
//!   a polygon-based distance a lower bound of the true distance.
//!
//! For rectangles and squares both views are the exact rotated corners.
//!
//! # Example
//!
//! ```
//! use pore_pack::{Pore, Rectangle};
//!
//! let pore = Pore::Rectangle(Rectangle::new(5.0, 5.0, 2.0, 1.0, 0.0));
//! assert!((pore.area() - 2.0).abs() < 1e-12);
//!
//! let (hx, hy) = pore.half_extents();
//! assert!((hx - 1.0).abs() < 1e-12 && (hy - 0.5).abs() < 1e-12);
//! ```

use std::f64::consts::PI;

use geo::{Coord, LineString, Polygon, Rect, coord};
use serde::{Deserialize, Serialize};

/// Minimum number of vertices used to approximate a curved boundary.
pub const MIN_SEGMENTS: usize = 8;

/// Discriminant of a [`Pore`], independent of its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Circular pore.
    Circle,
    /// Rotated rectangular pore (fibers, slits).
    Rectangle,
    /// Rotated elliptical pore.
    Ellipse,
    /// Rotated square pore.
    Square,
}

impl ShapeKind {
    /// Lower-case name of the shape kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Square => "square",
        }
    }

    /// True for kinds whose boundary is curved.
    pub fn is_curved(&self) -> bool {
        matches!(self, ShapeKind::Circle | ShapeKind::Ellipse)
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circular pore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Radius.
    pub r: f64,
}

impl Circle {
    /// Create a circle from its center and radius.
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }
}

/// Rectangular pore rotated by `angle` radians about its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Extent along the local x axis.
    pub width: f64,
    /// Extent along the local y axis.
    pub height: f64,
    /// Counter-clockwise rotation in radians.
    pub angle: f64,
}

impl Rectangle {
    /// Create a rectangle from its center, size and rotation.
    pub fn new(x: f64, y: f64, width: f64, height: f64, angle: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle,
        }
    }
}

/// Elliptical pore.
///
/// `semi_major` lies along the local x axis and `semi_minor` along the local
/// y axis. Both are sampled independently, so `semi_minor` may exceed
/// `semi_major`; the formulas below do not depend on the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Semi-axis along the local x axis.
    pub semi_major: f64,
    /// Semi-axis along the local y axis.
    pub semi_minor: f64,
    /// Counter-clockwise rotation in radians.
    #[serde(default)]
    pub angle: f64,
}

impl Ellipse {
    /// Create an axis-aligned ellipse.
    pub fn new(x: f64, y: f64, semi_major: f64, semi_minor: f64) -> Self {
        Self {
            x,
            y,
            semi_major,
            semi_minor,
            angle: 0.0,
        }
    }

    /// Set the rotation angle.
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }
}

/// Square pore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Square {
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Side length.
    pub side: f64,
    /// Counter-clockwise rotation in radians.
    #[serde(default)]
    pub angle: f64,
}

impl Square {
    /// Create an axis-aligned square.
    pub fn new(x: f64, y: f64, side: f64) -> Self {
        Self {
            x,
            y,
            side,
            angle: 0.0,
        }
    }

    /// Set the rotation angle.
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }
}

/// A single inclusion carved out of (or embedded in) the background domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Pore {
    /// Circular pore.
    Circle(Circle),
    /// Rectangular pore.
    Rectangle(Rectangle),
    /// Elliptical pore.
    Ellipse(Ellipse),
    /// Square pore.
    Square(Square),
}

impl From<Circle> for Pore {
    fn from(c: Circle) -> Self {
        Pore::Circle(c)
    }
}

impl From<Rectangle> for Pore {
    fn from(r: Rectangle) -> Self {
        Pore::Rectangle(r)
    }
}

impl From<Ellipse> for Pore {
    fn from(e: Ellipse) -> Self {
        Pore::Ellipse(e)
    }
}

impl From<Square> for Pore {
    fn from(s: Square) -> Self {
        Pore::Square(s)
    }
}

impl Pore {
    /// Shape kind of this pore.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Pore::Circle(_) => ShapeKind::Circle,
            Pore::Rectangle(_) => ShapeKind::Rectangle,
            Pore::Ellipse(_) => ShapeKind::Ellipse,
            Pore::Square(_) => ShapeKind::Square,
        }
    }

    /// Center of the pore.
    pub fn center(&self) -> Coord<f64> {
        match *self {
            Pore::Circle(Circle { x, y, .. })
            | Pore::Rectangle(Rectangle { x, y, .. })
            | Pore::Ellipse(Ellipse { x, y, .. })
            | Pore::Square(Square { x, y, .. }) => coord! { x: x, y: y },
        }
    }

    /// Rotation angle in radians (always 0 for circles).
    pub fn angle(&self) -> f64 {
        match self {
            Pore::Circle(_) => 0.0,
            Pore::Rectangle(r) => r.angle,
            Pore::Ellipse(e) => e.angle,
            Pore::Square(s) => s.angle,
        }
    }

    /// Exact area of the true shape.
    pub fn area(&self) -> f64 {
        match self {
            Pore::Circle(c) => PI * c.r * c.r,
            Pore::Rectangle(r) => r.width * r.height,
            Pore::Ellipse(e) => PI * e.semi_major * e.semi_minor,
            Pore::Square(s) => s.side * s.side,
        }
    }

    /// Half-widths of the exact axis-aligned bounding box of the true shape.
    pub fn half_extents(&self) -> (f64, f64) {
        match self {
            Pore::Circle(c) => (c.r, c.r),
            Pore::Rectangle(r) => rotated_box_half_extents(r.width / 2.0, r.height / 2.0, r.angle),
            Pore::Square(s) => rotated_box_half_extents(s.side / 2.0, s.side / 2.0, s.angle),
            Pore::Ellipse(e) => {
                let (sin, cos) = e.angle.sin_cos();
                let (a2, b2) = (e.semi_major * e.semi_major, e.semi_minor * e.semi_minor);
                (
                    (a2 * cos * cos + b2 * sin * sin).sqrt(),
                    (a2 * sin * sin + b2 * cos * cos).sqrt(),
                )
            }
        }
    }

    /// Exact axis-aligned bounding box of the true shape.
    pub fn bounding_rect(&self) -> Rect<f64> {
        let c = self.center();
        let (hx, hy) = self.half_extents();
        Rect::new(
            coord! { x: c.x - hx, y: c.y - hy },
            coord! { x: c.x + hx, y: c.y + hy },
        )
    }

    /// Radius of the smallest center-anchored circle containing the shape.
    pub fn circumradius(&self) -> f64 {
        match self {
            Pore::Circle(c) => c.r,
            Pore::Rectangle(r) => r.width.hypot(r.height) / 2.0,
            Pore::Ellipse(e) => e.semi_major.max(e.semi_minor),
            Pore::Square(s) => s.side * std::f64::consts::FRAC_1_SQRT_2,
        }
    }

    /// Width of the shape in its narrowest direction.
    pub fn min_width(&self) -> f64 {
        match self {
            Pore::Circle(c) => 2.0 * c.r,
            Pore::Rectangle(r) => r.width.min(r.height),
            Pore::Ellipse(e) => 2.0 * e.semi_major.min(e.semi_minor),
            Pore::Square(s) => s.side,
        }
    }

    /// True when every parameter is finite and every size is positive.
    pub fn is_well_formed(&self) -> bool {
        let c = self.center();
        let sizes_ok = match self {
            Pore::Circle(c) => c.r > 0.0 && c.r.is_finite(),
            Pore::Rectangle(r) => {
                r.width > 0.0 && r.height > 0.0 && r.width.is_finite() && r.height.is_finite()
            }
            Pore::Ellipse(e) => {
                e.semi_major > 0.0
                    && e.semi_minor > 0.0
                    && e.semi_major.is_finite()
                    && e.semi_minor.is_finite()
            }
            Pore::Square(s) => s.side > 0.0 && s.side.is_finite(),
        };
        sizes_ok && c.x.is_finite() && c.y.is_finite() && self.angle().is_finite()
    }

    /// Return a copy moved by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        let mut moved = *self;
        match &mut moved {
            Pore::Circle(Circle { x, y, .. })
            | Pore::Rectangle(Rectangle { x, y, .. })
            | Pore::Ellipse(Ellipse { x, y, .. })
            | Pore::Square(Square { x, y, .. }) => {
                *x += dx;
                *y += dy;
            }
        }
        moved
    }

    /// Return a copy rotated about its own center by `delta` radians.
    pub fn rotate(&self, delta: f64) -> Self {
        let mut turned = *self;
        match &mut turned {
            Pore::Circle(_) => {}
            Pore::Rectangle(Rectangle { angle, .. })
            | Pore::Ellipse(Ellipse { angle, .. })
            | Pore::Square(Square { angle, .. }) => *angle += delta,
        }
        turned
    }

    /// Closed boundary with every vertex on the true boundary.
    ///
    /// Curved shapes use `segments` vertices (at least [`MIN_SEGMENTS`]);
    /// rectangles and squares always have their four corners.
    pub fn boundary_polygon(&self, segments: usize) -> Polygon<f64> {
        self.polygon_with_scale(segments, false)
    }

    /// Closed polygon that contains the true shape.
    ///
    /// Curved boundaries are circumscribed by scaling the on-curve vertices by
    /// `1 / cos(pi / n)`; an affine image of a circumscribed polygon still
    /// circumscribes the image of the circle, so the same factor works for
    /// ellipses.
    pub fn enclosing_polygon(&self, segments: usize) -> Polygon<f64> {
        self.polygon_with_scale(segments, true)
    }

    fn polygon_with_scale(&self, segments: usize, circumscribe: bool) -> Polygon<f64> {
        let n = segments.max(MIN_SEGMENTS);
        let scale = if circumscribe {
            1.0 / (PI / n as f64).cos()
        } else {
            1.0
        };
        let ring: Vec<Coord<f64>> = match *self {
            Pore::Circle(c) => curve_ring(c.x, c.y, c.r * scale, c.r * scale, 0.0, n),
            Pore::Ellipse(e) => curve_ring(
                e.x,
                e.y,
                e.semi_major * scale,
                e.semi_minor * scale,
                e.angle,
                n,
            ),
            Pore::Rectangle(r) => corner_ring(r.x, r.y, r.width / 2.0, r.height / 2.0, r.angle),
            Pore::Square(s) => corner_ring(s.x, s.y, s.side / 2.0, s.side / 2.0, s.angle),
        };
        Polygon::new(LineString::from(ring), vec![])
    }
}

/// Rotate a local offset `(dx, dy)` by `angle` and move it to `(cx, cy)`.
#[inline]
pub(crate) fn rotate_about(cx: f64, cy: f64, dx: f64, dy: f64, angle: f64) -> Coord<f64> {
    let (sin, cos) = angle.sin_cos();
    coord! {
        x: cx + dx * cos - dy * sin,
        y: cy + dx * sin + dy * cos,
    }
}

fn rotated_box_half_extents(w: f64, h: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (
        w * cos.abs() + h * sin.abs(),
        w * sin.abs() + h * cos.abs(),
    )
}

fn corner_ring(cx: f64, cy: f64, w: f64, h: f64, angle: f64) -> Vec<Coord<f64>> {
    [(-w, -h), (w, -h), (w, h), (-w, h)]
        .into_iter()
        .map(|(dx, dy)| rotate_about(cx, cy, dx, dy, angle))
        .collect()
}

fn curve_ring(cx: f64, cy: f64, a: f64, b: f64, angle: f64, n: usize) -> Vec<Coord<f64>> {
    (0..n)
        .map(|i| {
            let t = 2.0 * PI * i as f64 / n as f64;
            rotate_about(cx, cy, a * t.cos(), b * t.sin(), angle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, Contains, Point};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotated_corners() {
        let pore = Pore::Rectangle(Rectangle::new(1.0, 2.0, 2.0, 4.0, FRAC_PI_2));
        let poly = pore.boundary_polygon(64);
        let coords: Vec<_> = poly.exterior().coords().copied().collect();

        // Four corners plus the closing vertex.
        assert_eq!(coords.len(), 5);
        // (-1, -2) rotated by 90 degrees is (2, -1).
        assert_relative_eq!(coords[0].x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(coords[0].y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(poly.unsigned_area(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_half_extents_rotated_rectangle() {
        let pore = Pore::Rectangle(Rectangle::new(0.0, 0.0, 2.0, 4.0, FRAC_PI_2));
        let (hx, hy) = pore.half_extents();
        assert_relative_eq!(hx, 2.0, epsilon = 1e-12);
        assert_relative_eq!(hy, 1.0, epsilon = 1e-12);

        let square = Pore::Square(Square::new(0.0, 0.0, 2.0).with_angle(PI / 4.0));
        let (hx, hy) = square.half_extents();
        assert_relative_eq!(hx, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(hy, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_half_extents_match_polygon_bounds() {
        let pore = Pore::Ellipse(Ellipse::new(0.0, 0.0, 3.0, 1.0).with_angle(0.7));
        let (hx, hy) = pore.half_extents();
        let poly = pore.boundary_polygon(4096);
        let max_x = poly.exterior().coords().map(|c| c.x).fold(f64::MIN, f64::max);
        let max_y = poly.exterior().coords().map(|c| c.y).fold(f64::MIN, f64::max);

        // On-curve vertices never exceed the analytic extent and approach it closely.
        assert!(max_x <= hx + 1e-12 && max_x > hx - 1e-3);
        assert!(max_y <= hy + 1e-12 && max_y > hy - 1e-3);
    }

    #[test]
    fn test_enclosing_polygon_contains_curve() {
        let pore = Pore::Ellipse(Ellipse::new(5.0, 5.0, 2.0, 0.5).with_angle(0.3));
        let enclosing = pore.enclosing_polygon(16);
        for c in pore.boundary_polygon(997).exterior().coords() {
            assert!(enclosing.contains(&Point::from(*c)) || on_ring(&enclosing, *c));
        }
        assert!(enclosing.unsigned_area() > pore.area());
    }

    fn on_ring(poly: &Polygon<f64>, c: Coord<f64>) -> bool {
        use geo::EuclideanDistance;
        Point::from(c).euclidean_distance(poly.exterior()) < 1e-9
    }

    #[test]
    fn test_areas() {
        assert_relative_eq!(Pore::Circle(Circle::new(0.0, 0.0, 1.0)).area(), PI);
        assert_relative_eq!(Pore::Ellipse(Ellipse::new(0.0, 0.0, 2.0, 1.0)).area(), 2.0 * PI);
        assert_relative_eq!(Pore::Square(Square::new(0.0, 0.0, 3.0)).area(), 9.0);

        // Polygon area converges to the analytic area.
        let circle = Pore::Circle(Circle::new(0.0, 0.0, 1.0));
        let approx = circle.boundary_polygon(2048).unsigned_area();
        assert_relative_eq!(approx, PI, epsilon = 1e-4);
    }

    #[test]
    fn test_translate_and_rotate_return_copies() {
        let pore = Pore::Rectangle(Rectangle::new(1.0, 1.0, 2.0, 1.0, 0.0));
        let moved = pore.translate(2.0, -1.0).rotate(0.5);

        assert_eq!(pore.center(), coord! { x: 1.0, y: 1.0 });
        assert_eq!(moved.center(), coord! { x: 3.0, y: 0.0 });
        assert_relative_eq!(moved.angle(), 0.5);
        assert_relative_eq!(moved.area(), pore.area());

        let circle = Pore::Circle(Circle::new(0.0, 0.0, 1.0));
        assert_eq!(circle.rotate(1.0), circle);
    }

    #[test]
    fn test_well_formed() {
        assert!(Pore::Circle(Circle::new(0.0, 0.0, 1.0)).is_well_formed());
        assert!(!Pore::Circle(Circle::new(0.0, 0.0, 0.0)).is_well_formed());
        assert!(!Pore::Circle(Circle::new(f64::NAN, 0.0, 1.0)).is_well_formed());
        assert!(!Pore::Rectangle(Rectangle::new(0.0, 0.0, 1.0, 1.0, f64::INFINITY)).is_well_formed());
    }

    #[test]
    fn test_serde_tagging() {
        let pore = Pore::Square(Square::new(1.0, 2.0, 0.5));
        let json = serde_json::to_string(&pore).unwrap();
        assert!(json.contains("\"shape\":\"square\""));
        let back: Pore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pore);

        // Angle defaults to zero for records written without one.
        let ellipse: Pore =
            serde_json::from_str(r#"{"shape":"ellipse","x":1,"y":1,"semi_major":2,"semi_minor":1}"#)
                .unwrap();
        assert_eq!(ellipse.angle(), 0.0);
    }
}
