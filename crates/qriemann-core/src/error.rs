//! Error types for manifold operations and optimizer updates.
//!
//! Every failure is detected where it happens and returned to the caller as
//! a typed value. Nothing is retried: all conditions below are deterministic
//! numeric or logical errors.

use thiserror::Error;

/// Coarse classification shared by [`ManifoldError`] and [`OptimizerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad metric name, precision, hyper-parameter or shape.
    InvalidArgument,
    /// A request the update rule does not implement (sparse gradients).
    Unsupported,
    /// A linear-algebra primitive could not produce a trustworthy result.
    NumericalFailure,
}

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, Error)]
pub enum ManifoldError {
    /// An argument is outside the supported set.
    ///
    /// Raised for unknown metric or retraction names, unsupported
    /// precisions and malformed point shapes.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the offending argument
        reason: String,
    },

    /// Dimension mismatch between tensors.
    ///
    /// This error occurs when operations involve tensors with incompatible dimensions.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// A numerical routine failed.
    ///
    /// Raised when a Gram matrix handed to the Lyapunov-type solve is not
    /// positive definite, when an SVD or eigen-decomposition does not
    /// converge, or when non-finite values are detected.
    #[error("Numerical failure: {reason}")]
    NumericalFailure {
        /// Description of the numerical issue
        reason: String,
    },
}

impl ManifoldError {
    /// Create an InvalidArgument error with a custom reason.
    pub fn invalid_argument<S: Into<String>>(reason: S) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NumericalFailure with a custom reason.
    pub fn numerical_failure<S: Into<String>>(reason: S) -> Self {
        Self::NumericalFailure {
            reason: reason.into(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } | Self::DimensionMismatch { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::NumericalFailure { .. } => ErrorKind::NumericalFailure,
        }
    }
}

/// Errors that can occur while configuring or running an optimizer.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Invalid optimizer configuration.
    ///
    /// This error occurs when the optimizer is configured with invalid
    /// parameters (e.g., negative learning rate, momentum outside `[0, 1]`).
    #[error("Invalid optimizer configuration: {reason} ({parameter} = {value})")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// The requested update is not implemented.
    #[error("Unsupported optimizer operation: {feature}")]
    Unsupported {
        /// Name of the unsupported feature
        feature: String,
    },

    /// Propagated manifold error.
    #[error("Manifold operation failed: {0}")]
    Manifold(#[from] ManifoldError),
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create an Unsupported error.
    pub fn unsupported<S: Into<String>>(feature: S) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidArgument,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Manifold(inner) => inner.kind(),
        }
    }
}

/// Result type alias for operations that can produce ManifoldError.
pub type Result<T> = std::result::Result<T, ManifoldError>;

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ManifoldError::invalid_argument("unknown metric 'riemann'");
        assert!(matches!(err, ManifoldError::InvalidArgument { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid argument: unknown metric 'riemann'"
        );

        let err = ManifoldError::dimension_mismatch("[3, 4, 4]", "[3, 4, 5]");
        assert!(matches!(err, ManifoldError::DimensionMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected [3, 4, 4], got [3, 4, 5]"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ManifoldError::invalid_argument("x").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            ManifoldError::dimension_mismatch("a", "b").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            ManifoldError::numerical_failure("gram").kind(),
            ErrorKind::NumericalFailure
        );
        assert_eq!(
            OptimizerError::invalid_configuration("out of range", "momentum", "1.5").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            OptimizerError::unsupported("sparse gradient").kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_manifold_error_propagation() {
        let manifold_err = ManifoldError::numerical_failure("gram matrix is singular");
        let optimizer_err: OptimizerError = manifold_err.into();

        assert!(matches!(optimizer_err, OptimizerError::Manifold(_)));
        assert_eq!(optimizer_err.kind(), ErrorKind::NumericalFailure);
        assert!(optimizer_err
            .to_string()
            .contains("Manifold operation failed"));
        assert!(optimizer_err.to_string().contains("gram matrix is singular"));
    }

    #[test]
    fn test_optimizer_error_display() {
        let err = OptimizerError::invalid_configuration("must lie in [0, 1]", "momentum", "-0.5");
        assert_eq!(
            err.to_string(),
            "Invalid optimizer configuration: must lie in [0, 1] (momentum = -0.5)"
        );
    }
}
