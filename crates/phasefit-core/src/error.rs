//! Error types

use thiserror::Error;

use crate::grid::Axis;

/// Result type for misfit operations
pub type MisfitResult<T> = Result<T, MisfitError>;

/// Precondition violations raised before or during an adjoint computation.
///
/// Numerical degeneracy and quality heuristics are not errors; they are
/// reported through the kill flag of the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MisfitError {
    /// A transform or input parameter is nonpositive or not finite
    #[error("Invalid parameter `{name}`: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Coordinate axis is not strictly increasing
    #[error("{axis} axis is not strictly increasing at index {index}")]
    NonMonotonicAxis { axis: Axis, index: usize },

    /// Coordinate axis has too few samples
    #[error("{axis} axis too short: need at least {min} samples, got {len}")]
    AxisTooShort { axis: Axis, len: usize, min: usize },

    /// Coordinate axis is not uniformly spaced
    #[error("{axis} axis is not uniformly spaced at index {index}")]
    NonUniformAxis { axis: Axis, index: usize },

    /// Two buffers that must match in length do not
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Grids that must share coordinates do not
    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    /// Interpolation requested outside the sampled range
    #[error("Evaluation point {x} outside interpolation range [{lo}, {hi}]")]
    OutOfRange { x: f64, lo: f64, hi: f64 },

    /// Spline collocation system could not be solved
    #[error("Singular interpolation system at row {0}")]
    SingularSystem(usize),
}

impl MisfitError {
    /// Check if this error stems from a malformed transform grid
    pub fn is_grid_error(&self) -> bool {
        matches!(
            self,
            MisfitError::NonMonotonicAxis { .. }
                | MisfitError::AxisTooShort { .. }
                | MisfitError::NonUniformAxis { .. }
                | MisfitError::GridMismatch(_)
        )
    }
}

/// Error type for configuration operations.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("config not found: {0}")]
    NotFound(String),
    /// Failed to read or write configuration file
    #[error("failed to read config: {0}")]
    ReadError(String),
    /// Failed to parse configuration
    #[error("failed to parse config: {0}")]
    ParseError(String),
    /// Invalid configuration value
    #[error("invalid config: {0}")]
    ValidationError(String),
}

impl From<MisfitError> for ConfigError {
    fn from(err: MisfitError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
