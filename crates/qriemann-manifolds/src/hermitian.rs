//! Manifold of Hermitian matrices H(n) = {X in C^{n x n} : X^H = X}
//!
//! A flat, affine manifold: the tangent space at every point is H(n)
//! itself, the exponential map is plain addition and transport is the
//! identity. It is the reference implementation of the manifold contract.

use qriemann_core::{
    error::{ManifoldError, Result},
    linalg::{hermitian_part, skew_difference},
    manifold::{rejected_batch_len, Manifold, Metric},
    tensor::Tensor,
    types::{Precision, Scalar},
};
use rand::RngCore;

/// The manifold of n x n complex Hermitian matrices.
///
/// # Mathematical Properties
///
/// - **Dimension**: n² (real)
/// - **Tangent space**: T_X H(n) = H(n)
/// - **Projection**: P(V) = (V + V^H) / 2
/// - **Retraction**: R_X(V) = X + V (exact)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HermitianMatrix {
    metric: Metric,
}

impl HermitianMatrix {
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

    fn check_pair<T: Scalar>(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<()> {
        <Self as Manifold<T>>::validate_shape(self, u.shape())?;
        u.ensure_same_shape(v)
    }
}

impl<T: Scalar> Manifold<T> for HermitianMatrix {
    fn name(&self) -> &str {
        "Hermitian"
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn rank(&self) -> usize {
        2
    }

    fn validate_shape(&self, shape: &[usize]) -> Result<()> {
        match shape {
            [.., rows, cols] if rows == cols => Ok(()),
            _ => Err(ManifoldError::invalid_argument(format!(
                "Hermitian points must be square matrices, got shape {shape:?}"
            ))),
        }
    }

    fn proj(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v)?;
        v.map_entries(2, |entry| Ok(entry.iter().map(hermitian_part).collect()))
    }

    fn egrad_to_rgrad(&self, u: &Tensor<T>, egrad: &Tensor<T>) -> Result<Tensor<T>> {
        self.proj(u, egrad)
    }

    fn retraction(&self, u: &Tensor<T>, v: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v)?;
        Ok(u + v)
    }

    fn vector_transport(&self, u: &Tensor<T>, v1: &Tensor<T>, v2: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_pair(u, v1)?;
        u.ensure_same_shape(v2)?;
        Ok(v1.clone())
    }

    fn retraction_transport(
        &self,
        u: &Tensor<T>,
        v1: &Tensor<T>,
        v2: &Tensor<T>,
    ) -> Result<(Tensor<T>, Tensor<T>)> {
        self.check_pair(u, v1)?;
        u.ensure_same_shape(v2)?;
        Ok((u + v2, v1.clone()))
    }

    fn random_with(&self, shape: &[usize], precision: Precision, rng: &mut dyn RngCore) -> Result<Tensor<T>> {
        precision.ensure_matches::<T>()?;
        <Self as Manifold<T>>::validate_shape(self, shape)?;
        let noise = Tensor::random_normal(shape, rng)?;
        noise.map_entries(2, |entry| Ok(entry.iter().map(hermitian_part).collect()))
    }

    fn is_in_manifold(&self, u: &Tensor<T>, tolerance: T) -> Vec<bool> {
        if <Self as Manifold<T>>::validate_shape(self, u.shape()).is_err() {
            return vec![false; rejected_batch_len(u, 2)];
        }
        u.reduce_entries(2, |entry| {
            let x = &entry[0];
            let scale = x.norm();
            if scale == T::zero() {
                return true;
            }
            skew_difference(x).norm() / scale < tolerance
        })
        .unwrap_or_else(|_| vec![false; rejected_batch_len(u, 2)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qriemann_core::test_utils::seeded_rng;
    use qriemann_core::types::{complex, CMatrix};

    #[test]
    fn test_construction() {
        assert!(HermitianMatrix::new("euclidean").is_ok());
        let err = HermitianMatrix::new("bures").unwrap_err();
        assert!(matches!(err, ManifoldError::InvalidArgument { .. }));
        assert_eq!(HermitianMatrix::default().metric, Metric::Euclidean);
    }

    #[test]
    fn test_random_points_are_hermitian() {
        let manifold = HermitianMatrix::default();
        let mut rng = seeded_rng(5);
        let u: Tensor<f64> = manifold.random_with(&[3, 4, 4], Precision::Double, &mut rng).unwrap();
        assert_eq!(manifold.is_in_manifold(&u, 1e-12), vec![true; 3]);
    }

    #[test]
    fn test_zero_matrix_is_hermitian() {
        let manifold = HermitianMatrix::default();
        let zero = Tensor::<f64>::zeros(&[4, 4]).unwrap();
        assert_eq!(manifold.is_in_manifold(&zero, 1e-10), vec![true]);
    }

    #[test]
    fn test_non_hermitian_rejected() {
        let manifold = HermitianMatrix::default();
        let mut m = CMatrix::<f64>::identity(2, 2);
        m[(0, 1)] = complex(0.0, 1.0);
        let u = Tensor::from_matrix(m);
        assert_eq!(manifold.is_in_manifold(&u, 1e-6), vec![false]);

        let rectangular = Tensor::<f64>::zeros(&[2, 3]).unwrap();
        assert_eq!(manifold.is_in_manifold(&rectangular, 1e-6), vec![false]);
    }

    #[test]
    fn test_projection_and_transport() {
        let manifold = HermitianMatrix::default();
        let mut rng = seeded_rng(6);
        let u: Tensor<f64> = manifold.random_with(&[4, 4], Precision::Double, &mut rng).unwrap();
        let v = Tensor::random_normal(&[4, 4], &mut rng).unwrap();

        let p = manifold.proj(&u, &v).unwrap();
        assert!(manifold.is_in_manifold(&p, 1e-12)[0]);

        let (point, transported) = manifold.retraction_transport(&u, &p, &p).unwrap();
        assert_relative_eq!((&point - &(&u + &p)).norm(), 0.0);
        assert_eq!(transported, p);
    }

    #[test]
    fn test_shape_and_precision_errors() {
        let manifold = HermitianMatrix::default();
        let mut rng = seeded_rng(7);
        let u: Tensor<f64> = manifold.random_with(&[4, 4], Precision::Double, &mut rng).unwrap();
        let wrong = Tensor::<f64>::zeros(&[3, 3]).unwrap();
        assert!(manifold.proj(&u, &wrong).is_err());
        assert!(manifold.retraction(&u, &wrong).is_err());

        let err = Manifold::<f64>::random_with(&manifold, &[4, 4], Precision::Single, &mut rng).unwrap_err();
        assert!(matches!(err, ManifoldError::InvalidArgument { .. }));
        assert!(Manifold::<f64>::random_with(&manifold, &[4, 3], Precision::Double, &mut rng).is_err());
    }
}
