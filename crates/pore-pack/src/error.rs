//! Error types for pore packing with rich diagnostics.
//!
//! Two classes of failure exist:
//! - Configuration errors (`PORE-1xxx`): the parameters can never produce a
//!   valid packing. They are raised by [`PackingConfig::validate`] before the
//!   first random draw.
//! - Persistence errors (`PORE-2xxx`): reading or writing a stored layout or
//!   configuration failed.
//!
//! Running out of attempts before the target is reached is *not* an error.
//! It is reported through [`PackingResult::shortfall`].
//!
//! [`PackingConfig::validate`]: crate::PackingConfig::validate
//! [`PackingResult::shortfall`]: crate::PackingResult::shortfall
//!
//! # Example
//!
//! ```
//! use pore_pack::{ErrorCode, PackError};
//!
//! let err = PackError::invalid_clearance(-0.1);
//! assert_eq!(err.code(), ErrorCode::InvalidClearance);
//! assert_eq!(err.code().as_str(), "PORE-1003");
//! assert!(err.is_configuration_error());
//! ```

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packing operations.
pub type PackResult<T> = Result<T, PackError>;

/// Machine-readable error codes for packing operations.
///
/// Codes follow the pattern `PORE-XXXX` where:
/// - 1xxx = Configuration errors
/// - 2xxx = Persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    /// PORE-1001: Domain dimensions are not positive and finite
    InvalidDomain = 1001,
    /// PORE-1002: A size range is empty, non-positive, or non-finite
    InvalidSizeRange = 1002,
    /// PORE-1003: Clearance distance is negative or non-finite
    InvalidClearance = 1003,
    /// PORE-1004: Termination target is missing or out of range
    InvalidTarget = 1004,
    /// PORE-1005: Attempt budget is zero
    InvalidBudget = 1005,
    /// PORE-1006: Rotation bounds are inverted or non-finite
    InvalidRotation = 1006,
    /// PORE-1007: The smallest pore cannot fit in the domain
    PoreExceedsDomain = 1007,

    // Persistence errors (2xxx)
    /// PORE-2001: Failed to read file
    IoRead = 2001,
    /// PORE-2002: Failed to write file
    IoWrite = 2002,
    /// PORE-2003: Failed to parse file contents
    ParseError = 2003,
    /// PORE-2004: Stored layout does not match the requested configuration
    LayoutMismatch = 2004,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `PORE-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidDomain => "PORE-1001",
            ErrorCode::InvalidSizeRange => "PORE-1002",
            ErrorCode::InvalidClearance => "PORE-1003",
            ErrorCode::InvalidTarget => "PORE-1004",
            ErrorCode::InvalidBudget => "PORE-1005",
            ErrorCode::InvalidRotation => "PORE-1006",
            ErrorCode::PoreExceedsDomain => "PORE-1007",
            ErrorCode::IoRead => "PORE-2001",
            ErrorCode::IoWrite => "PORE-2002",
            ErrorCode::ParseError => "PORE-2003",
            ErrorCode::LayoutMismatch => "PORE-2004",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for packing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Adjust parameters for the operation.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// Check the file system location.
    CheckPath { checks: Vec<String> },
    /// Regenerate the stored layout.
    RegenerateLayout,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::CheckPath { checks } => {
                write!(f, "Check the path for: {}", checks.join(", "))
            }
            RecoverySuggestion::RegenerateLayout => {
                write!(f, "Delete the stored layout and pack a new one")
            }
        }
    }
}

/// Errors that can occur while configuring, running, or persisting a packing.
#[derive(Debug, Error, Diagnostic)]
pub enum PackError {
    /// Domain width, height, or depth is not positive and finite.
    #[error("invalid domain: {axis} = {value} must be positive and finite")]
    #[diagnostic(
        code(pore::config::domain),
        help("Domain dimensions are lengths in the same unit as pore sizes and must be > 0.")
    )]
    InvalidDomain { axis: &'static str, value: f64 },

    /// A size range is empty or contains non-positive values.
    #[error("invalid size range for {parameter}: [{min}, {max}]")]
    #[diagnostic(
        code(pore::config::size_range),
        help("Size bounds must satisfy 0 < min <= max.")
    )]
    InvalidSizeRange {
        parameter: &'static str,
        min: f64,
        max: f64,
    },

    /// The clearance distance is negative or non-finite.
    #[error("invalid clearance: min_dist = {value} must be >= 0")]
    #[diagnostic(
        code(pore::config::clearance),
        help("Use min_dist = 0 to allow pores to touch.")
    )]
    InvalidClearance { value: f64 },

    /// The termination target is missing or outside its valid range.
    #[error("invalid target: {details}")]
    #[diagnostic(
        code(pore::config::target),
        help("Set a pore count, a porosity in (0, 1), or both.")
    )]
    InvalidTarget { details: String },

    /// The attempt budget is zero.
    #[error("invalid attempt budget: max_attempts must be at least 1")]
    #[diagnostic(code(pore::config::budget))]
    InvalidBudget,

    /// Rotation bounds are inverted or non-finite.
    #[error("invalid rotation bounds: [{min}, {max}]")]
    #[diagnostic(
        code(pore::config::rotation),
        help("Rotation bounds are radians and must satisfy min <= max.")
    )]
    InvalidRotation { min: f64, max: f64 },

    /// Even the smallest pore cannot be placed inside the domain.
    #[error(
        "smallest pore does not fit: narrowest size {size} plus clearance 2 x {min_dist} exceeds domain side {domain_side}"
    )]
    #[diagnostic(
        code(pore::config::pore_exceeds_domain),
        help("Reduce the minimum pore size or the clearance, or enlarge the domain.")
    )]
    PoreExceedsDomain {
        size: f64,
        min_dist: f64,
        domain_side: f64,
    },

    /// Error reading from a file.
    #[error("failed to read {path}")]
    #[diagnostic(code(pore::io::read), help("Check that the file exists and is readable."))]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write {path}")]
    #[diagnostic(
        code(pore::io::write),
        help("Check that the directory exists and is writable.")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a stored layout or configuration.
    #[error("failed to parse {path}: {details}")]
    #[diagnostic(
        code(pore::parse::error),
        help("The file may be corrupted or written by an incompatible version.")
    )]
    ParseError { path: PathBuf, details: String },

    /// A stored layout was produced for a different domain or clearance.
    #[error("stored layout {path} does not match configuration: {details}")]
    #[diagnostic(
        code(pore::layout::mismatch),
        help("Delete the stored layout or pass the configuration it was packed with.")
    )]
    LayoutMismatch { path: PathBuf, details: String },
}

impl PackError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PackError::InvalidDomain { .. } => ErrorCode::InvalidDomain,
            PackError::InvalidSizeRange { .. } => ErrorCode::InvalidSizeRange,
            PackError::InvalidClearance { .. } => ErrorCode::InvalidClearance,
            PackError::InvalidTarget { .. } => ErrorCode::InvalidTarget,
            PackError::InvalidBudget => ErrorCode::InvalidBudget,
            PackError::InvalidRotation { .. } => ErrorCode::InvalidRotation,
            PackError::PoreExceedsDomain { .. } => ErrorCode::PoreExceedsDomain,
            PackError::IoRead { .. } => ErrorCode::IoRead,
            PackError::IoWrite { .. } => ErrorCode::IoWrite,
            PackError::ParseError { .. } => ErrorCode::ParseError,
            PackError::LayoutMismatch { .. } => ErrorCode::LayoutMismatch,
        }
    }

    /// True for errors raised by configuration validation.
    pub fn is_configuration_error(&self) -> bool {
        (self.code() as u16) < 2000
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            PackError::InvalidDomain { axis, .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![((*axis).into(), "a positive length".into())],
            },
            PackError::InvalidSizeRange { parameter, .. } => {
                RecoverySuggestion::AdjustParameters {
                    parameters: vec![((*parameter).into(), "0 < min <= max".into())],
                }
            }
            PackError::InvalidClearance { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("min_dist".into(), "a value >= 0".into())],
            },
            PackError::InvalidTarget { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("count".into(), "a pore count".into()),
                    ("porosity".into(), "a fraction in (0, 1)".into()),
                ],
            },
            PackError::InvalidBudget => RecoverySuggestion::AdjustParameters {
                parameters: vec![("max_attempts".into(), "at least 1".into())],
            },
            PackError::InvalidRotation { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("rotation".into(), "min <= max".into())],
            },
            PackError::PoreExceedsDomain { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("min pore size".into(), "try a smaller value".into()),
                    ("min_dist".into(), "try a smaller value".into()),
                ],
            },
            PackError::IoRead { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            PackError::IoWrite { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["directory exists".into(), "write permissions".into()],
            },
            PackError::ParseError { .. } | PackError::LayoutMismatch { .. } => {
                RecoverySuggestion::RegenerateLayout
            }
        }
    }

    // Constructor helpers for common error patterns

    /// Create an InvalidDomain error.
    pub fn invalid_domain(axis: &'static str, value: f64) -> Self {
        PackError::InvalidDomain { axis, value }
    }

    /// Create an InvalidSizeRange error.
    pub fn invalid_size_range(parameter: &'static str, min: f64, max: f64) -> Self {
        PackError::InvalidSizeRange { parameter, min, max }
    }

    /// Create an InvalidClearance error.
    pub fn invalid_clearance(value: f64) -> Self {
        PackError::InvalidClearance { value }
    }

    /// Create an InvalidTarget error.
    pub fn invalid_target(details: impl Into<String>) -> Self {
        PackError::InvalidTarget {
            details: details.into(),
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        PackError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create a LayoutMismatch error.
    pub fn layout_mismatch(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        PackError::LayoutMismatch {
            path: path.into(),
            details: details.into(),
        }
    }
}
