//! Core traits and types for Riemannian optimization over complex matrices.
//!
//! This crate provides the foundations shared by the manifold and optimizer
//! crates: batched complex tensors, the dense linear algebra the manifolds are
//! built from, the `Manifold` trait, and the parameter/gradient types that
//! optimizers consume.
//!
//! # Modules
//!
//! - [`error`]: Error types for manifold and optimizer operations
//! - [`linalg`]: QR, polar (SVD) and Lyapunov-type solves on complex matrices
//! - [`manifold`]: Core manifold trait and metric names
//! - [`parameter`]: Optimizable parameters and gradients
//! - [`tensor`]: Batched complex tensors
//! - [`types`]: Scalar trait and precision tags

pub mod error;
pub mod linalg;
pub mod manifold;
pub mod parameter;
pub mod tensor;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ErrorKind, ManifoldError, OptimizerError, OptimizerResult, Result};

/// Prelude module for convenient imports.
///
/// ```
/// use qriemann_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorKind, ManifoldError, OptimizerError, OptimizerResult, Result};
    pub use crate::manifold::{Manifold, Metric};
    pub use crate::parameter::{Gradient, ParamId, Parameter, SparseGradient};
    pub use crate::tensor::Tensor;
    pub use crate::types::{complex, CMatrix, Precision, Scalar};
}
