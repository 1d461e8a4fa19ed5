//! Quotient manifold of POVMs (positive operator-valued measures).
//!
//! A point is a collection of `m` square blocks `A_1, …, A_m ∈ C^{n×n}`
//! satisfying the completeness relation `Σ_i A_i A_iᴴ = I`. The physical
//! measurement is `E_i = A_i A_iᴴ`, which is unchanged when every block is
//! multiplied on the right by its own unitary. Points related that way are
//! identified, and tangent vectors are restricted to the horizontal space
//! orthogonal to those orbits.
//!
//! Geometrically, a point is an isometry in its stacked form
//! `S = [A_1ᵀ; …; A_mᵀ] ∈ C^{nm×n}`: `Sᴴ S = I` is the conjugate of the
//! completeness relation. The projection therefore runs in two stages:
//!
//! 1. Stiefel tangent projection of the stacked form:
//!    `V' = V − ½ S (Sᴴ V + Vᴴ S)`.
//! 2. Horizontal correction of every block: with `G_i = A_iᴴ A_i` and
//!    `K_i = A_iᴴ V'_i − V'_iᴴ A_i`, solve `G_i Ω_i + Ω_i G_i = K_i` and return
//!    `V'_i − A_i Ω_i`.
//!
//! Retraction takes the polar factor of the stacked `S + V`, so every step
//! lands exactly on the manifold.

use crate::utils::{hstack, stack_transposed, stiefel_tangent_projection, unstack_transposed};
use qriemann_core::{
    error::{ManifoldError, Result},
    linalg::{gaussian_matrix, polar_isometry, qr_isometry, relative_identity_deviation, solve_symmetric_sylvester},
    manifold::{rejected_batch_len, Manifold, Metric},
    tensor::Tensor,
    types::{CMatrix, Precision, Scalar},
};
use rand::RngCore;
use tracing::warn;

/// The POVM quotient manifold of `m` blocks of size `n × n`.
///
/// Points have shape `(…, m, n, n)`; `m` and `n` are read from the tensors,
/// so one value serves every POVM size.
///
/// # Mathematical Properties
///
/// - **Constraint**: Σ_i A_i A_iᴴ = I
/// - **Symmetry**: A_i ↦ A_i Q_i with Q_i unitary
/// - **Horizontal space**: A_iᴴ ξ_i Hermitian for every block
/// - **Retraction**: polar factor of the stacked form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Povm {
    metric: Metric,
}

impl Povm {
    /// Creates the manifold with the named metric.
    ///
    /// # Errors
    /// Returns an error for any metric other than `"euclidean"`.
    pub fn new(metric: &str) -> Result<Self> {
        Ok(Self::with_metric(metric.parse()?))
    }

    pub fn with_metric(metric: Metric) -> Self {
        Self { metric }
    }

    /// Physical POVM elements `E_i = A_i A_iᴴ` of every point.
    pub fn elements<T: Scalar>(&self, u: &Tensor<T>) -> Result<Tensor<T>> {
        <Self as Manifold<T>>::validate_shape(self, u.shape())?;
        u.map_entries(3, |blocks| Ok(blocks.iter().map(|a| a * a.adjoint()).collect()))
    }

    fn check_pair<T: Scalar>(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<()> {
        <Self as Manifold<T>>::validate_shape(self, u.shape())?;
        u.ensure_same_shape(v)
    }
}

/// Stage 1: tangent projection of the stacked forms, returned as blocks.
fn stiefel_stage<T: Scalar>(a: &[CMatrix<T>], v: &[CMatrix<T>]) -> Vec<CMatrix<T>> {
    let s = stack_transposed(a);
    let projected = stiefel_tangent_projection(&s, &stack_transposed(v));
    unstack_transposed(&projected, a.len())
}

/// Stage 2: removes the vertical (orbit) component of each block.
fn horizontal_stage<T: Scalar>(a: &[CMatrix<T>], v: Vec<CMatrix<T>>) -> Result<Vec<CMatrix<T>>> {
    a.iter()
        .zip(v)
        .enumerate()
        .map(|(i, (block, direction))| {
            let gram = block.adjoint() * block;
            let skew = block.adjoint() * &direction - direction.adjoint() * block;
            let omega = solve_symmetric_sylvester(&gram, &skew).map_err(|e| {
                warn!(block = i, error = %e, "horizontal projection rejected a POVM block");
                e
            })?;
            Ok(direction - block * omega)
        })
        .collect()
}

fn retract_entry<T: Scalar>(a: &[CMatrix<T>], v: &[CMatrix<T>]) -> Result<Vec<CMatrix<T>>> {
    let moved = stack_transposed(a) + stack_transposed(v);
    let isometry = polar_isometry(&moved)?;
    Ok(unstack_transposed(&isometry, a.len()))
}

impl<T: Scalar> Manifold<T> for Povm {
    fn name(&self) -> &str {
        "POVM"
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn rank(&self) -> usize {
        3
    }

    fn validate_shape(&self, shape: &[usize]) -> Result<()> {
        match shape {
            [.., _, rows, cols] if rows == cols => Ok(()),
            _ => Err(ManifoldError::invalid_argument(format!(
                "POVM points need shape (..., m, n, n), got {shape:?}"
            ))),
        }
    }

    fn proj(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v)?;
        u.zip_map_entries(v, 3, |a, x| horizontal_stage(a, stiefel_stage(a, x)))
    }

    fn egrad_to_rgrad(&self, u: &Tensor<T>, egrad: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, egrad)?;
        u.zip_map_entries(egrad, 3, |a, g| Ok(stiefel_stage(a, g)))
    }

    fn retraction(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v)?;
        u.zip_map_entries(v, 3, retract_entry)
    }

    fn vector_transport(&self, u: &Tensor<T>, v1: &Tensor<T>, v2: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v1)?;
        let target = self.retraction(u, v2)?;
        self.proj(&target, v1)
    }

    fn retraction_transport(
        &self,
        u: &Tensor<T>,
        v1: &Tensor<T>,
        v2: &Tensor<T>,
    ) -> Result<(Tensor<T>, Tensor<T>)> {
        self.check_pair(u, v1)?;
        let target = self.retraction(u, v2)?;
        let transported = self.proj(&target, v1)?;
        Ok((target, transported))
    }

    fn random_with(&self, shape: &[usize], precision: Precision, rng: &mut dyn RngCore) -> Result<Tensor<T>> {
        precision.ensure_matches::<T>()?;
        <Self as Manifold<T>>::validate_shape(self, shape)?;
        let dims = shape.len();
        let (m, n) = (shape[dims - 3], shape[dims - 1]);
        let entries: usize = shape[..dims - 3].iter().product();

        let mut blocks = Vec::with_capacity(entries * m);
        for _ in 0..entries {
            let isometry = qr_isometry(&gaussian_matrix::<T, _>(n * m, n, rng))?;
            blocks.extend(unstack_transposed(&isometry, m));
        }
        Tensor::from_matrices(shape, blocks)
    }

    fn is_in_manifold(&self, u: &Tensor<T>, tolerance: T) -> Vec<bool> {
        if <Self as Manifold<T>>::validate_shape(self, u.shape()).is_err() {
            return vec![false; rejected_batch_len(u, 3)];
        }
        u.reduce_entries(3, |blocks| relative_identity_deviation(&hstack(blocks)) < tolerance)
            .unwrap_or_else(|_| vec![false; rejected_batch_len(u, 3)])
    }
}
