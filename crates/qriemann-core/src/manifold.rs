//! Core manifold trait and associated types.
//!
//! This module defines the `Manifold` trait every matrix manifold
//! implements. Points and tangent vectors are batched [`Tensor`]s: a manifold
//! owns the trailing [`Manifold::rank`] dimensions of the shape and applies
//! its operations independently to every leading (batch) entry.
//!
//! # Mathematical Background
//!
//! A Riemannian manifold (M, g) consists of:
//! - A smooth manifold M, here embedded in a space of complex matrices
//! - A Riemannian metric g that assigns an inner product to each tangent space
//!
//! Key concepts:
//! - **Tangent space**: T_u M is the linear approximation of M at point u
//! - **Retraction**: A smooth map R_u: T_u M → M with R_u(0) = u and DR_u(0) = id
//! - **Riemannian gradient**: The unique vector in T_u M representing the derivative
//! - **Vector transport**: Moving tangent vectors along a retraction step

use crate::error::{ManifoldError, Result};
use crate::tensor::Tensor;
use crate::types::{Precision, Scalar};
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

/// Riemannian metric a manifold is equipped with.
///
/// Only the metric induced by the real Euclidean inner product
/// `Re Σ conj(a)·b` of the ambient matrix space is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Metric {
    /// Real part of the Frobenius inner product.
    #[default]
    Euclidean,
}

impl Metric {
    /// Canonical metric name.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ManifoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(ManifoldError::invalid_argument(format!(
                "unsupported metric '{other}' (only 'euclidean' is implemented)"
            ))),
        }
    }
}

/// Trait for Riemannian matrix manifolds.
///
/// Implementations are stateless values that can be shared across threads.
/// Every binary operation requires its operands to have the shape of the
/// point `u` and fails with an invalid-argument error otherwise.
///
/// ## Mathematical Properties
///
/// 1. **Projection idempotency**: `proj(u, proj(u, v)) = proj(u, v)`
/// 2. **Metric compatibility**: `inner(u, v, egrad_to_rgrad(u, g)) = Re Σ conj(v)·g`
///    for every tangent `v`
/// 3. **Retraction constraints**: `R_u(0) = u` and `DR_u(0) = id`
/// 4. **Transport**: `vector_transport(u, v1, v2)` lies in the tangent space at
///    `retraction(u, v2)` and reduces to `v1` when `v2 = 0`
pub trait Manifold<T: Scalar>: Debug + Send + Sync {
    /// Human-readable name of the manifold.
    fn name(&self) -> &str;

    /// The metric this manifold was constructed with.
    fn metric(&self) -> Metric;

    /// Number of trailing shape dimensions describing one point.
    fn rank(&self) -> usize;

    /// Checks that `shape` describes (a batch of) points of this manifold.
    ///
    /// The default only requires `rank()` trailing dimensions; manifolds
    /// with structural constraints (square blocks, tall isometries) override
    /// it.
    fn validate_shape(&self, shape: &[usize]) -> Result<()> {
        if shape.len() < self.rank() {
            return Err(ManifoldError::invalid_argument(format!(
                "{} points need {} trailing dimensions, got shape {shape:?}",
                self.name(),
                self.rank()
            )));
        }
        Ok(())
    }

    /// Real Riemannian inner product of two tangent vectors, per batch entry.
    ///
    /// The default is the Euclidean metric `Re Σ conj(v1)·v2`.
    fn inner(&self, u: &Tensor<T>, v1: &Tensor<T>, v2: &Tensor<T>) -> Result<Vec<T>> {
        self.validate_shape(u.shape())?;
        u.ensure_same_shape(v1)?;
        u.ensure_same_shape(v2)?;
        v1.zip_reduce_entries(v2, self.rank(), |a, b| {
            a.iter()
                .zip(b)
                .fold(T::zero(), |acc, (x, y)| acc + x.dotc(y).re)
        })
    }

    /// Norm of a tangent vector induced by [`Manifold::inner`], per batch entry.
    fn norm(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Vec<T>> {
        Ok(self
            .inner(u, v, v)?
            .into_iter()
            .map(|s| s.sqrt())
            .collect())
    }

    /// Orthogonal projection of an ambient vector onto `T_u M`.
    fn proj(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>>;

    /// Converts a Euclidean gradient at `u` into the Riemannian gradient.
    fn egrad_to_rgrad(&self, u: &Tensor<T>, egrad: &Tensor<T>) -> Result<Tensor<T>>;

    /// Moves from `u` along the tangent vector `v` and lands on the manifold.
    fn retraction(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>>;

    /// Transports `v1` from `T_u M` to the tangent space at `retraction(u, v2)`.
    fn vector_transport(&self, u: &Tensor<T>, v1: &Tensor<T>, v2: &Tensor<T>) -> Result<Tensor<T>>;

    /// Computes `retraction(u, v2)` together with `vector_transport(u, v1, v2)`.
    ///
    /// Manifolds whose transport needs the retracted point override this to
    /// compute the retraction once.
    fn retraction_transport(
        &self,
        u: &Tensor<T>,
        v1: &Tensor<T>,
        v2: &Tensor<T>,
    ) -> Result<(Tensor<T>, Tensor<T>)> {
        let point = self.retraction(u, v2)?;
        let transported = self.vector_transport(u, v1, v2)?;
        Ok((point, transported))
    }

    /// Draws a random point of the given shape using the caller's generator.
    ///
    /// Fails when `precision` is not the precision of `Complex<T>` or the
    /// shape is invalid for this manifold.
    fn random_with(&self, shape: &[usize], precision: Precision, rng: &mut dyn RngCore) -> Result<Tensor<T>>;

    /// Draws a random point using the thread-local generator.
    fn random(&self, shape: &[usize], precision: Precision) -> Result<Tensor<T>> {
        self.random_with(shape, precision, &mut rand::thread_rng())
    }

    /// Gaussian noise projected onto `T_u M`.
    fn random_tangent_with(&self, u: &Tensor<T>, rng: &mut dyn RngCore) -> Result<Tensor<T>> {
        self.validate_shape(u.shape())?;
        let noise = Tensor::random_normal(u.shape(), rng)?;
        self.proj(u, &noise)
    }

    /// [`Manifold::random_tangent_with`] using the thread-local generator.
    fn random_tangent(&self, u: &Tensor<T>) -> Result<Tensor<T>> {
        self.random_tangent_with(u, &mut rand::thread_rng())
    }

    /// Whether each batch entry of `u` satisfies the manifold's defining
    /// equation up to the relative `tolerance`.
    ///
    /// Never fails: malformed input simply reports `false`.
    fn is_in_manifold(&self, u: &Tensor<T>, tolerance: T) -> Vec<bool>;
}

/// Number of batch entries to report for a shape the manifold rejected.
pub fn rejected_batch_len<T: Scalar>(u: &Tensor<T>, rank: usize) -> usize {
    u.batch_len(rank).unwrap_or(1)
}
