//! Optimization algorithms for complex-matrix manifolds.
//!
//! This crate provides the manifold-aware update rules. They consume any
//! [`Manifold`](qriemann_core::manifold::Manifold) and never special-case a
//! particular one.
//!
//! # Available Optimizers
//!
//! - **SGD**: Riemannian stochastic gradient descent with optional classical
//!   or Nesterov momentum

pub mod sgd;

pub use sgd::{MomentumMethod, RiemannianSgd, SgdConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::sgd::{MomentumMethod, RiemannianSgd, SgdConfig};
}
