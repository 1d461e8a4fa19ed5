//! Complex Stiefel manifold St(n,p) = {X in C^{n x p} : X^H X = I_p}
//!
//! The space of n x p matrices with orthonormal columns. It naturally
//! appears in:
//! - Eigenvalue problems (the minimizers of tr(X^H H X) span eigenspaces)
//! - Isometric embeddings of quantum channels
//! - Orthogonal dictionary learning

use crate::utils::stiefel_tangent_projection;
use qriemann_core::{
    error::{ManifoldError, Result},
    linalg::{gaussian_matrix, polar_isometry, qr_isometry, qr_positive, relative_identity_deviation},
    manifold::{rejected_batch_len, Manifold, Metric},
    tensor::Tensor,
    types::{CMatrix, Precision, Scalar},
};
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Retraction used to map tangent steps back onto St(n,p).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StiefelRetraction {
    /// Polar factor of X + V, computed through a thin SVD.
    #[default]
    Svd,
    /// Q factor of X + V with R's diagonal made real positive.
    Qr,
}

impl StiefelRetraction {
    pub fn name(self) -> &'static str {
        match self {
            StiefelRetraction::Svd => "svd",
            StiefelRetraction::Qr => "qr",
        }
    }
}

impl Display for StiefelRetraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StiefelRetraction {
    type Err = ManifoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "svd" => Ok(StiefelRetraction::Svd),
            "qr" => Ok(StiefelRetraction::Qr),
            other => Err(ManifoldError::invalid_argument(format!(
                "unknown Stiefel retraction '{other}' (expected 'svd' or 'qr')"
            ))),
        }
    }
}

/// The complex Stiefel manifold of n x p isometries.
///
/// # Mathematical Properties
///
/// - **Dimension**: 2np - p² (real)
/// - **Tangent space**: T_X St(n,p) = {V : X^H V + V^H X = 0}
/// - **Riemannian metric**: Re tr(U^H V), inherited from C^{n x p}
/// - **Retractions**: polar decomposition (default) or positive QR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stiefel {
    metric: Metric,
    retraction: StiefelRetraction,
}

impl Stiefel {
    /// Creates the manifold from metric and retraction names.
    ///
    /// # Errors
    /// Returns an error if either name is unknown.
    pub fn new(metric: &str, retraction: &str) -> Result<Self> {
        Ok(Self::with_options(metric.parse()?, retraction.parse()?))
    }

    pub fn with_options(metric: Metric, retraction: StiefelRetraction) -> Self {
        Self { metric, retraction }
    }

    pub fn retraction_kind(&self) -> StiefelRetraction {
        self.retraction
    }

    fn check_pair<T: Scalar>(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<()> {
        <Self as Manifold<T>>::validate_shape(self, u.shape())?;
        u.ensure_same_shape(v)
    }

    fn retract_matrix<T: Scalar>(&self, x: &CMatrix<T>, v: &CMatrix<T>) -> Result<CMatrix<T>> {
        let moved = x + v;
        match self.retraction {
            StiefelRetraction::Svd => polar_isometry(&moved),
            StiefelRetraction::Qr => qr_positive(&moved),
        }
    }
}

impl<T: Scalar> Manifold<T> for Stiefel {
    fn name(&self) -> &str {
        "Stiefel"
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn rank(&self) -> usize {
        2
    }

    fn validate_shape(&self, shape: &[usize]) -> Result<()> {
        match shape {
            [.., n, p] if p <= n => Ok(()),
            _ => Err(ManifoldError::invalid_argument(format!(
                "Stiefel points need shape (..., n, p) with p <= n, got {shape:?}"
            ))),
        }
    }

    fn proj(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v)?;
        u.zip_map_entries(v, 2, |x, w| Ok(vec![stiefel_tangent_projection(&x[0], &w[0])]))
    }

    fn egrad_to_rgrad(&self, u: &Tensor<T>, egrad: &Tensor<T>) -> Result<Tensor<T>> {
        self.proj(u, egrad)
    }

    fn retraction(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v)?;
        u.zip_map_entries(v, 2, |x, w| Ok(vec![self.retract_matrix(&x[0], &w[0])?]))
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
        let (n, p) = (shape[dims - 2], shape[dims - 1]);
        let entries: usize = shape[..dims - 2].iter().product();
        let matrices = (0..entries)
            .map(|_| qr_isometry(&gaussian_matrix::<T, _>(n, p, rng)))
            .collect::<Result<Vec<_>>>()?;
        Tensor::from_matrices(shape, matrices)
    }

    fn is_in_manifold(&self, u: &Tensor<T>, tolerance: T) -> Vec<bool> {
        if <Self as Manifold<T>>::validate_shape(self, u.shape()).is_err() {
            return vec![false; rejected_batch_len(u, 2)];
        }
        u.reduce_entries(2, |x| relative_identity_deviation(&x[0].adjoint()) < tolerance)
            .unwrap_or_else(|_| vec![false; rejected_batch_len(u, 2)])
    }
}
