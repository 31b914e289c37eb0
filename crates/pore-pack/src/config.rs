//! Packing configuration.
//!
//! [`PackingConfig`] is an immutable value handed to the packer. It carries
//! the domain, the shape family and its size bounds, the clearance, the
//! termination target and the attempt budget. Nothing about a packing run
//! lives in global state.
//!
//! Configurations load from TOML (the format the CLI reads) or JSON:
//!
//! ```toml
//! min_dist = 0.25
//! max_attempts = 5000
//!
//! [domain]
//! width = 10.0
//! height = 10.0
//!
//! [shape]
//! kind = "rectangle"
//! width = { min = 0.5, max = 1.5 }
//! height = { min = 0.2, max = 0.6 }
//!
//! [target]
//! porosity = 0.3
//! ```

use std::f64::consts::FRAC_PI_2;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};
use crate::geometry::Domain;
use crate::shape::{Circle, Ellipse, Pore, Rectangle, ShapeKind, Square};

/// Inclusive bounds `[min, max]` of a uniformly drawn size parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl SizeRange {
    /// Create a range `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range that always yields `value`.
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// True when `0 < min <= max` and both bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.min > 0.0 && self.min <= self.max && self.max.is_finite()
    }

    /// Draw a value uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }

    pub(crate) fn check(&self, parameter: &'static str) -> PackResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(PackError::invalid_size_range(parameter, self.min, self.max))
        }
    }
}

/// Inclusive rotation bounds in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Default for RotationRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: FRAC_PI_2,
        }
    }
}

impl RotationRange {
    /// Create rotation bounds `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// No rotation at all.
    pub fn none() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    /// Draw an angle uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Shape family and the size bounds of each shape parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeFamily {
    /// Circles with radius drawn from `radius`.
    Circle { radius: SizeRange },
    /// Rectangles with independent width and height.
    Rectangle { width: SizeRange, height: SizeRange },
    /// Ellipses with independent semi-axes.
    Ellipse {
        semi_major: SizeRange,
        semi_minor: SizeRange,
    },
    /// Squares with side drawn from `side`.
    Square { side: SizeRange },
}

impl ShapeFamily {
    /// Shape kind produced by this family.
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeFamily::Circle { .. } => ShapeKind::Circle,
            ShapeFamily::Rectangle { .. } => ShapeKind::Rectangle,
            ShapeFamily::Ellipse { .. } => ShapeKind::Ellipse,
            ShapeFamily::Square { .. } => ShapeKind::Square,
        }
    }

    /// Whether pores of this family carry a rotation angle.
    pub fn is_rotatable(&self) -> bool {
        !matches!(self, ShapeFamily::Circle { .. })
    }

    /// Area of the smallest pore the family can produce.
    pub fn min_area(&self) -> f64 {
        match self {
            ShapeFamily::Circle { radius } => std::f64::consts::PI * radius.min * radius.min,
            ShapeFamily::Rectangle { width, height } => width.min * height.min,
            ShapeFamily::Ellipse {
                semi_major,
                semi_minor,
            } => std::f64::consts::PI * semi_major.min * semi_minor.min,
            ShapeFamily::Square { side } => side.min * side.min,
        }
    }

    /// Narrowest dimension of the smallest pore the family can produce.
    pub fn min_width(&self) -> f64 {
        match self {
            ShapeFamily::Circle { radius } => 2.0 * radius.min,
            ShapeFamily::Rectangle { width, height } => width.min.min(height.min),
            ShapeFamily::Ellipse {
                semi_major,
                semi_minor,
            } => 2.0 * semi_major.min.min(semi_minor.min),
            ShapeFamily::Square { side } => side.min,
        }
    }

    /// Largest circumradius any pore of the family can have.
    pub fn max_circumradius(&self) -> f64 {
        match self {
            ShapeFamily::Circle { radius } => radius.max,
            ShapeFamily::Rectangle { width, height } => width.max.hypot(height.max) / 2.0,
            ShapeFamily::Ellipse {
                semi_major,
                semi_minor,
            } => semi_major.max.max(semi_minor.max),
            ShapeFamily::Square { side } => side.max * std::f64::consts::FRAC_1_SQRT_2,
        }
    }

    /// Draw a pore centered at the origin.
    ///
    /// Sizes are drawn first in declaration order, then the rotation for
    /// rotatable shapes. Circles consume no rotation draw.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, rotation: &RotationRange) -> Pore {
        match self {
            ShapeFamily::Circle { radius } => Pore::Circle(Circle::new(0.0, 0.0, radius.sample(rng))),
            ShapeFamily::Rectangle { width, height } => {
                let w = width.sample(rng);
                let h = height.sample(rng);
                Pore::Rectangle(Rectangle::new(0.0, 0.0, w, h, rotation.sample(rng)))
            }
            ShapeFamily::Ellipse {
                semi_major,
                semi_minor,
            } => {
                let a = semi_major.sample(rng);
                let b = semi_minor.sample(rng);
                Pore::Ellipse(Ellipse::new(0.0, 0.0, a, b).with_angle(rotation.sample(rng)))
            }
            ShapeFamily::Square { side } => {
                let s = side.sample(rng);
                Pore::Square(Square::new(0.0, 0.0, s).with_angle(rotation.sample(rng)))
            }
        }
    }

    fn validate(&self) -> PackResult<()> {
        match self {
            ShapeFamily::Circle { radius } => radius.check("radius"),
            ShapeFamily::Rectangle { width, height } => {
                width.check("width")?;
                height.check("height")
            }
            ShapeFamily::Ellipse {
                semi_major,
                semi_minor,
            } => {
                semi_major.check("semi_major")?;
                semi_minor.check("semi_minor")
            }
            ShapeFamily::Square { side } => side.check("side"),
        }
    }
}

/// Termination target. Packing stops as soon as any set target is reached.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PackingTarget {
    /// Exact number of pores to place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Pore area over domain area, in `(0, 1)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub porosity: Option<f64>,
}

impl PackingTarget {
    /// Count-only target.
    pub fn count(count: usize) -> Self {
        Self {
            count: Some(count),
            porosity: None,
        }
    }

    /// Porosity-only target.
    pub fn porosity(porosity: f64) -> Self {
        Self {
            count: None,
            porosity: Some(porosity),
        }
    }

    /// Both targets; whichever is reached first ends the run.
    pub fn both(count: usize, porosity: f64) -> Self {
        Self {
            count: Some(count),
            porosity: Some(porosity),
        }
    }

    pub(crate) fn validate(&self) -> PackResult<()> {
        if self.count.is_none() && self.porosity.is_none() {
            return Err(PackError::invalid_target(
                "neither a pore count nor a porosity was set",
            ));
        }
        match self.porosity {
            Some(p) if !(p > 0.0 && p < 1.0) => Err(PackError::invalid_target(format!(
                "porosity {p} is outside (0, 1)"
            ))),
            _ => Ok(()),
        }
    }
}

/// How the attempt budget is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPolicy {
    /// Count rejected draws since the last acceptance; reset on acceptance.
    #[default]
    Consecutive,
    /// Count every draw over the whole run; never reset.
    Global,
}

/// How candidate centers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Draw the center where the shape's extent plus clearance fits the domain.
    #[default]
    Inset,
    /// Draw the center uniformly over the whole domain.
    Uniform,
}

/// Complete description of one packing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    /// Background domain.
    pub domain: Domain,

    /// Shape family and size bounds.
    pub shape: ShapeFamily,

    /// Minimum distance between two pore boundaries, and between a pore
    /// boundary and the domain wall.
    pub min_dist: f64,

    /// Termination target.
    pub target: PackingTarget,

    /// Attempt budget.
    pub max_attempts: usize,

    /// How the attempt budget is charged.
    pub attempt_policy: AttemptPolicy,

    /// How candidate centers are drawn.
    pub placement: PlacementPolicy,

    /// Rotation bounds for rectangles, ellipses and squares.
    pub rotation: RotationRange,

    /// Vertices per curved boundary in polygon views.
    pub segments: usize,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            domain: Domain::default(),
            shape: ShapeFamily::Circle {
                radius: SizeRange::new(0.2, 0.5),
            },
            min_dist: 0.25,
            target: PackingTarget::porosity(0.3),
            max_attempts: 5000,
            attempt_policy: AttemptPolicy::Consecutive,
            placement: PlacementPolicy::Inset,
            rotation: RotationRange::default(),
            segments: 64,
        }
    }
}

impl PackingConfig {
    /// Configuration for a shape family with default settings otherwise.
    pub fn new(domain: Domain, shape: ShapeFamily) -> Self {
        Self {
            domain,
            shape,
            ..Default::default()
        }
    }

    /// Circles with radius in `radius`.
    pub fn circles(radius: SizeRange) -> Self {
        Self {
            shape: ShapeFamily::Circle { radius },
            ..Default::default()
        }
    }

    /// Rectangles with width and height drawn independently.
    pub fn rectangles(width: SizeRange, height: SizeRange) -> Self {
        Self {
            shape: ShapeFamily::Rectangle { width, height },
            ..Default::default()
        }
    }

    /// Ellipses with semi-axes drawn independently.
    pub fn ellipses(semi_major: SizeRange, semi_minor: SizeRange) -> Self {
        Self {
            shape: ShapeFamily::Ellipse {
                semi_major,
                semi_minor,
            },
            ..Default::default()
        }
    }

    /// Squares with side in `side`.
    pub fn squares(side: SizeRange) -> Self {
        Self {
            shape: ShapeFamily::Square { side },
            ..Default::default()
        }
    }

    /// Set the domain size.
    pub fn with_domain(mut self, width: f64, height: f64) -> Self {
        self.domain = Domain::new(width, height);
        self
    }

    /// Set the clearance distance.
    pub fn with_min_dist(mut self, min_dist: f64) -> Self {
        self.min_dist = min_dist;
        self
    }

    /// Replace the target with a count-only target.
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target = PackingTarget::count(count);
        self
    }

    /// Replace the target with a porosity-only target.
    pub fn with_target_porosity(mut self, porosity: f64) -> Self {
        self.target = PackingTarget::porosity(porosity);
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

    /// Set how candidate centers are drawn.
    pub fn with_placement(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    /// Set rotation bounds in radians.
    pub fn with_rotation(mut self, min: f64, max: f64) -> Self {
        self.rotation = RotationRange::new(min, max);
        self
    }

    /// Set vertices per curved boundary.
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Pore area at which the porosity target is met, if one is set.
    pub fn target_area(&self) -> Option<f64> {
        self.target.porosity.map(|p| p * self.domain.area())
    }

    /// Check every parameter. Called by the packer before the first draw.
    ///
    /// # Errors
    ///
    /// Returns a `PORE-1xxx` configuration error naming the first offending
    /// parameter.
    pub fn validate(&self) -> PackResult<()> {
        check_side("width", self.domain.width)?;
        check_side("height", self.domain.height)?;
        self.shape.validate()?;
        if !(self.min_dist >= 0.0 && self.min_dist.is_finite()) {
            return Err(PackError::invalid_clearance(self.min_dist));
        }
        self.target.validate()?;
        if self.max_attempts == 0 {
            return Err(PackError::InvalidBudget);
        }
        if self.shape.is_rotatable() {
            check_rotation(&self.rotation)?;
        }
        check_fits(self.shape.min_width(), self.min_dist, self.domain.min_side())
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or doesn't match the schema.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or the TOML is invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> PackResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| PackError::io_read(path, e))?;
        toml::from_str(&contents).map_err(|e| PackError::parse_error(path, e.to_string()))
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> PackResult<()> {
        let path = path.as_ref();
        let toml_str = self
            .to_toml()
            .map_err(|e| PackError::io_write(path, std::io::Error::other(e)))?;
        std::fs::write(path, toml_str).map_err(|e| PackError::io_write(path, e))
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn check_side(axis: &'static str, value: f64) -> PackResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PackError::invalid_domain(axis, value))
    }
}

pub(crate) fn check_rotation(rotation: &RotationRange) -> PackResult<()> {
    // Uniform sampling needs a finite span.
    let span = rotation.max - rotation.min;
    if rotation.min.is_finite() && rotation.max.is_finite() && span.is_finite() && span >= 0.0 {
        Ok(())
    } else {
        Err(PackError::InvalidRotation {
            min: rotation.min,
            max: rotation.max,
        })
    }
}

pub(crate) fn check_fits(size: f64, min_dist: f64, domain_side: f64) -> PackResult<()> {
    if size + 2.0 * min_dist > domain_side {
        Err(PackError::PoreExceedsDomain {
            size,
            min_dist,
            domain_side,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_matches_reference_experiment() {
        let config = PackingConfig::default();
        assert_eq!(config.domain, Domain::new(10.0, 10.0));
        assert_relative_eq!(config.min_dist, 0.25);
        assert_eq!(config.max_attempts, 5000);
        assert_eq!(config.target, PackingTarget::porosity(0.3));
        assert_eq!(config.attempt_policy, AttemptPolicy::Consecutive);
        assert_eq!(config.placement, PlacementPolicy::Inset);
        assert_relative_eq!(config.rotation.max, FRAC_PI_2);
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.target_area().unwrap_or_default(), 30.0);
    }

    #[test]
    fn test_builders() {
        let config = PackingConfig::rectangles(SizeRange::new(0.5, 1.5), SizeRange::new(0.2, 0.6))
            .with_domain(20.0, 5.0)
            .with_min_dist(0.1)
            .with_target_count(12)
            .with_max_attempts(100)
            .with_attempt_policy(AttemptPolicy::Global)
            .with_placement(PlacementPolicy::Uniform)
            .with_rotation(0.0, std::f64::consts::PI)
            .with_segments(32);

        assert_eq!(config.shape.kind(), ShapeKind::Rectangle);
        assert_eq!(config.target, PackingTarget::count(12));
        assert_eq!(config.target_area(), None);
        assert_eq!(config.attempt_policy, AttemptPolicy::Global);
        assert_eq!(config.placement, PlacementPolicy::Uniform);
        assert_eq!(config.segments, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let base = PackingConfig::circles(SizeRange::new(0.2, 0.5));

        let cases = [
            (base.clone().with_domain(0.0, 10.0), ErrorCode::InvalidDomain),
            (base.clone().with_domain(10.0, f64::NAN), ErrorCode::InvalidDomain),
            (
                PackingConfig::circles(SizeRange::new(0.5, 0.2)),
                ErrorCode::InvalidSizeRange,
            ),
            (
                PackingConfig::squares(SizeRange::new(0.0, 1.0)),
                ErrorCode::InvalidSizeRange,
            ),
            (base.clone().with_min_dist(-0.1), ErrorCode::InvalidClearance),
            (base.clone().with_target_porosity(1.0), ErrorCode::InvalidTarget),
            (base.clone().with_target_porosity(0.0), ErrorCode::InvalidTarget),
            (
                base.clone().with_target(PackingTarget::default()),
                ErrorCode::InvalidTarget,
            ),
            (base.clone().with_max_attempts(0), ErrorCode::InvalidBudget),
            (
                PackingConfig::squares(SizeRange::new(0.5, 1.0)).with_rotation(1.0, 0.0),
                ErrorCode::InvalidRotation,
            ),
            (
                PackingConfig::rectangles(SizeRange::new(0.5, 1.0), SizeRange::new(0.2, 0.4))
                    .with_rotation(-f64::MAX, f64::MAX),
                ErrorCode::InvalidRotation,
            ),
            (
                PackingConfig::circles(SizeRange::new(6.0, 7.0)),
                ErrorCode::PoreExceedsDomain,
            ),
        ];

        for (config, expected) in cases {
            let err = config.validate().expect_err("config should be rejected");
            assert_eq!(err.code(), expected, "{err}");
            assert!(err.is_configuration_error());
        }
    }

    #[test]
    fn test_circle_rotation_is_not_checked() {
        let config = PackingConfig::circles(SizeRange::new(0.2, 0.5)).with_rotation(1.0, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_count_is_valid() {
        let config = PackingConfig::default().with_target_count(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pore_exceeds_domain_uses_clearance() {
        // 2 * 4.5 + 2 * 0.25 = 9.5 fits in 10, 2 * 4.5 + 2 * 0.6 = 10.2 does not.
        let fits = PackingConfig::circles(SizeRange::new(4.5, 4.8)).with_min_dist(0.25);
        assert!(fits.validate().is_ok());

        let too_big = fits.with_min_dist(0.6);
        assert_eq!(
            too_big.validate().map_err(|e| e.code()),
            Err(ErrorCode::PoreExceedsDomain)
        );
    }

    #[test]
    fn test_family_sampling_respects_bounds() {
        let family = ShapeFamily::Ellipse {
            semi_major: SizeRange::new(1.0, 2.0),
            semi_minor: SizeRange::new(0.2, 0.4),
        };
        let rotation = RotationRange::new(0.0, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            let Pore::Ellipse(e) = family.sample(&mut rng, &rotation) else {
                panic!("wrong shape kind");
            };
            assert!((1.0..=2.0).contains(&e.semi_major));
            assert!((0.2..=0.4).contains(&e.semi_minor));
            assert!((0.0..=1.0).contains(&e.angle));
            assert_eq!((e.x, e.y), (0.0, 0.0));
        }
    }

    #[test]
    fn test_fixed_range_sampling() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let range = SizeRange::fixed(0.75);
        assert_eq!(range.sample(&mut rng), 0.75);
    }

    #[test]
    fn test_family_minimums() {
        let family = ShapeFamily::Rectangle {
            width: SizeRange::new(2.0, 3.0),
            height: SizeRange::new(0.5, 1.0),
        };
        assert_relative_eq!(family.min_area(), 1.0);
        assert_relative_eq!(family.min_width(), 0.5);
        assert_relative_eq!(family.max_circumradius(), 10.0f64.sqrt() / 2.0);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PackingConfig::ellipses(SizeRange::new(0.4, 0.8), SizeRange::new(0.1, 0.3))
            .with_target(PackingTarget::both(40, 0.25))
            .with_placement(PlacementPolicy::Uniform);

        let toml_str = config.to_toml().expect("serialize");
        let parsed = PackingConfig::from_toml(&toml_str).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
min_dist = 0.1

[shape]
kind = "square"
side = { min = 0.3, max = 0.6 }

[target]
count = 25
"#;
        let config = PackingConfig::from_toml(toml_str).expect("parse");
        assert_eq!(config.shape.kind(), ShapeKind::Square);
        assert_eq!(config.target, PackingTarget::count(25));
        assert_eq!(config.domain, Domain::default());
        assert_eq!(config.max_attempts, 5000);
    }

    #[test]
    fn test_json_round_trip() {
        let config = PackingConfig::squares(SizeRange::new(0.3, 0.6)).with_target_count(10);
        let json = config.to_json().expect("serialize");
        assert_eq!(PackingConfig::from_json(&json).expect("parse"), config);
    }

    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pack.toml");

        let config = PackingConfig::default().with_target_count(8);
        config.save_toml(&path).expect("save");
        assert_eq!(PackingConfig::from_toml_file(&path).expect("load"), config);

        let missing = PackingConfig::from_toml_file(dir.path().join("missing.toml"));
        assert_eq!(missing.map_err(|e| e.code()), Err(ErrorCode::IoRead));
    }
}
