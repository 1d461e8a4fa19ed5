//! Riemannian optimization over manifolds of complex matrices.
//!
//! Re-exports the workspace crates under one name:
//!
//! - [`qriemann_core`]: tensors, the `Manifold` trait, errors and linear algebra
//! - [`qriemann_manifolds`]: Hermitian, POVM and complex Stiefel manifolds
//! - [`qriemann_optim`]: Riemannian SGD with momentum and Nesterov look-ahead
//!
//! # Example
//!
//! ```rust
//! use qriemann::prelude::*;
//!
//! let povm = Povm::default();
//! let point: Tensor<f64> = povm.random(&[3, 2, 2], Precision::Double).unwrap();
//! assert!(povm.is_in_manifold(&point, 1e-10)[0]);
//!
//! let mut sgd = RiemannianSgd::with_params(povm, 0.05, 0.9, false).unwrap();
//! let mut param = Parameter::new(point);
//! let egrad = Tensor::<f64>::zeros(&[3, 2, 2]).unwrap();
//! sgd.apply_gradient(&mut param, egrad.into()).unwrap();
//! ```

pub use nalgebra;
pub use qriemann_core;
pub use qriemann_manifolds;
pub use qriemann_optim;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use qriemann_core::prelude::*;
    pub use qriemann_manifolds::{HermitianMatrix, Povm, Stiefel, StiefelRetraction};
    pub use qriemann_optim::prelude::*;
}
