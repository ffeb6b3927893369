//! Error types for the spectral processing engine
//!
//! Shape and usage errors are always surfaced to the caller; numeric
//! degeneracies (flat spectra, zero-norm queries) are handled with
//! documented fallback values plus a diagnostic and never appear here.

use std::fmt;

/// Result type alias for engine operations
pub type SpectralResult<T> = Result<T, SpectralError>;

/// Error type for spectral engine operations
#[derive(Debug, Clone, PartialEq)]
pub enum SpectralError {
    /// Axis/intensity length mismatch, or batch rows with inconsistent axis
    ShapeMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// `transform`/`inverse_transform` invoked on a model before `fit`
    NotFitted { operation: String },

    /// Invalid parameter value (usage error)
    InvalidParameter {
        parameter: String,
        value: String,
        constraint: String,
    },

    /// Empty input collection where at least one element is required
    EmptyInput { collection: String },

    /// Wavenumber axis is not strictly monotonic
    NonMonotonicAxis { context: String },
}

impl fmt::Display for SpectralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectralError::ShapeMismatch {
                expected,
                got,
                context,
            } => {
                write!(
                    f,
                    "Shape mismatch in {}: expected length {}, got {}",
                    context, expected, got
                )
            }
            SpectralError::NotFitted { operation } => {
                write!(
                    f,
                    "Model not fitted: operation '{}' requires a fitted model. Call fit() first.",
                    operation
                )
            }
            SpectralError::InvalidParameter {
                parameter,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}' = '{}': must satisfy {}",
                    parameter, value, constraint
                )
            }
            SpectralError::EmptyInput { collection } => {
                write!(f, "Empty input: {}", collection)
            }
            SpectralError::NonMonotonicAxis { context } => {
                write!(
                    f,
                    "Wavenumber axis in {} must be strictly increasing or strictly decreasing",
                    context
                )
            }
        }
    }
}

impl std::error::Error for SpectralError {}

// Convenience constructors for common error patterns
impl SpectralError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: usize, got: usize, context: impl Into<String>) -> Self {
        SpectralError::ShapeMismatch {
            expected,
            got,
            context: context.into(),
        }
    }

    /// Create a not-fitted error
    pub fn not_fitted(operation: impl Into<String>) -> Self {
        SpectralError::NotFitted {
            operation: operation.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        SpectralError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an empty input error
    pub fn empty_input(collection: impl Into<String>) -> Self {
        SpectralError::EmptyInput {
            collection: collection.into(),
        }
    }

    /// Create a non-monotonic axis error
    pub fn non_monotonic_axis(context: impl Into<String>) -> Self {
        SpectralError::NonMonotonicAxis {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = SpectralError::shape_mismatch(1024, 512, "query spectrum");
        let msg = err.to_string();
        assert!(msg.contains("1024"));
        assert!(msg.contains("512"));
        assert!(msg.contains("query spectrum"));
    }

    #[test]
    fn test_not_fitted_display() {
        let err = SpectralError::not_fitted("transform");
        let msg = err.to_string();
        assert!(msg.contains("transform"));
        assert!(msg.contains("fit()"));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = SpectralError::invalid_parameter("window_length", "4", "odd and > polyorder");
        let msg = err.to_string();
        assert!(msg.contains("window_length"));
        assert!(msg.contains("4"));
        assert!(msg.contains("odd"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = SpectralError::shape_mismatch(8, 4, "batch row");
        let err2 = SpectralError::shape_mismatch(8, 4, "batch row");
        let err3 = SpectralError::shape_mismatch(8, 2, "batch row");

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpectralError>();
    }
}
