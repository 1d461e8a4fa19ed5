//! Dense complex linear algebra shared by the manifolds.
//!
//! Thin wrappers over nalgebra's decompositions that turn non-convergence
//! and non-finite input into [`ManifoldError::NumericalFailure`] instead of
//! panicking.

use crate::error::{ManifoldError, Result};
use crate::tensor::sample_normal;
use crate::types::{complex, CMatrix, Scalar};
use nalgebra::ComplexField;
use rand::Rng;
use tracing::debug;

/// Iteration cap handed to the SVD and symmetric eigen-solvers.
pub const MAX_DECOMPOSITION_ITERATIONS: usize = 10_000;

/// `(m + mᴴ) / 2`.
pub fn hermitian_part<T: Scalar>(m: &CMatrix<T>) -> CMatrix<T> {
    let half = <T as Scalar>::from_f64(0.5);
    (m + m.adjoint()).map(|z| z * half)
}

/// `m − mᴴ`.
pub fn skew_difference<T: Scalar>(m: &CMatrix<T>) -> CMatrix<T> {
    m - m.adjoint()
}

/// Matrix with independent standard normal real and imaginary parts.
pub fn gaussian_matrix<T: Scalar, R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> CMatrix<T> {
    CMatrix::from_fn(rows, cols, |_, _| {
        let re = sample_normal::<T, _>(rng);
        let im = sample_normal::<T, _>(rng);
        complex(re, im)
    })
}

/// Thin `Q` factor of a tall matrix, without sign normalization.
pub fn qr_isometry<T: Scalar>(a: &CMatrix<T>) -> Result<CMatrix<T>> {
    ensure_tall(a)?;
    ensure_finite(a, "QR")?;
    Ok(a.clone().qr().q())
}

/// Thin `Q` factor with the phases fixed so that `diag(R)` is real positive.
///
/// This makes the factorization unique, which is what the `qf` retraction
/// relies on.
pub fn qr_positive<T: Scalar>(a: &CMatrix<T>) -> Result<CMatrix<T>> {
    ensure_tall(a)?;
    ensure_finite(a, "QR")?;
    let qr = a.clone().qr();
    let mut q = qr.q();
    let r = qr.r();
    for j in 0..q.ncols() {
        let d = r[(j, j)];
        let magnitude = d.modulus();
        if magnitude > <T as Scalar>::EPSILON {
            let phase = d / magnitude;
            for i in 0..q.nrows() {
                q[(i, j)] *= phase;
            }
        }
    }
    Ok(q)
}

/// Polar factor `U Vᴴ` of a tall matrix `a = U Σ Vᴴ`.
///
/// The closest matrix with orthonormal columns to `a` in Frobenius norm.
pub fn polar_isometry<T: Scalar>(a: &CMatrix<T>) -> Result<CMatrix<T>> {
    ensure_tall(a)?;
    // nalgebra's SVD panics on NaN input.
    ensure_finite(a, "SVD")?;
    let svd = a
        .clone()
        .try_svd(true, true, <T as Scalar>::EPSILON, MAX_DECOMPOSITION_ITERATIONS)
        .ok_or_else(|| {
            debug!(rows = a.nrows(), cols = a.ncols(), "polar SVD hit the iteration cap");
            ManifoldError::numerical_failure("SVD did not converge")
        })?;
    match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => Ok(u * v_t),
        _ => Err(ManifoldError::numerical_failure(
            "SVD did not return singular vectors",
        )),
    }
}

/// Solves `G Ω + Ω G = K` for a Hermitian positive-definite `G`.
///
/// Uses the eigendecomposition `G = W diag(g) Wᴴ`:
/// `Ω = W ((Wᴴ K W) ⊘ (g_i + g_j)) Wᴴ`. Fails when `G` is not safely
/// positive definite.
pub fn solve_symmetric_sylvester<T: Scalar>(g: &CMatrix<T>, k: &CMatrix<T>) -> Result<CMatrix<T>> {
    if !g.is_square() || g.shape() != k.shape() {
        return Err(ManifoldError::dimension_mismatch(
            format!("square {}x{} operands", g.nrows(), g.nrows()),
            format!("{:?} and {:?}", g.shape(), k.shape()),
        ));
    }
    if !is_finite_matrix(g) || !is_finite_matrix(k) {
        return Err(ManifoldError::numerical_failure(
            "non-finite values entering the Lyapunov-type solve",
        ));
    }
    if g.nrows() == 0 {
        return Ok(k.clone());
    }
    let eigen = g
        .clone()
        .try_symmetric_eigen(<T as Scalar>::EPSILON, MAX_DECOMPOSITION_ITERATIONS)
        .ok_or_else(|| ManifoldError::numerical_failure("eigendecomposition did not converge"))?;

    let values = &eigen.eigenvalues;
    let finite = values.iter().all(|v| <T as Scalar>::to_f64(*v).is_finite());
    let mut lo = values[0];
    let mut hi = values[0];
    for &v in values.iter() {
        if v < lo {
            lo = v;
        }
        if v > hi {
            hi = v;
        }
    }
    if !finite || hi <= T::zero() || lo <= <T as Scalar>::EPSILON * hi {
        debug!(min = %lo, max = %hi, "Gram spectrum rejected");
        return Err(ManifoldError::numerical_failure(format!(
            "Gram matrix is not positive definite (eigenvalues in [{}, {}])",
            lo, hi
        )));
    }

    let w = &eigen.eigenvectors;
    let rotated = w.adjoint() * k * w;
    let scaled = CMatrix::from_fn(rotated.nrows(), rotated.ncols(), |i, j| {
        rotated[(i, j)] / (values[i] + values[j])
    });
    Ok(w * scaled * w.adjoint())
}

/// Scale-free distance of `r rᴴ` from the identity.
///
/// `‖r rᴴ − I‖ / sqrt(‖I‖ · ‖r rᴴ‖)` with Frobenius norms.
pub fn relative_identity_deviation<T: Scalar>(r: &CMatrix<T>) -> T {
    let n = r.nrows();
    let gram = r * r.adjoint();
    let identity = CMatrix::<T>::identity(n, n);
    let gram_norm = gram.norm();
    let identity_norm = <T as Scalar>::from_f64(n as f64).sqrt();
    (&gram - identity).norm() / (identity_norm * gram_norm).sqrt()
}

/// Whether every real and imaginary part is finite.
pub fn is_finite_matrix<T: Scalar>(m: &CMatrix<T>) -> bool {
    m.iter().all(|z| {
        <T as Scalar>::to_f64(z.re).is_finite() && <T as Scalar>::to_f64(z.im).is_finite()
    })
}

fn ensure_finite<T: Scalar>(a: &CMatrix<T>, routine: &str) -> Result<()> {
    if is_finite_matrix(a) {
        return Ok(());
    }
    debug!(rows = a.nrows(), cols = a.ncols(), routine, "non-finite decomposition input");
    Err(ManifoldError::numerical_failure(format!(
        "non-finite values entering the {routine}"
    )))
}

fn ensure_tall<T: Scalar>(a: &CMatrix<T>) -> Result<()> {
    if a.nrows() < a.ncols() {
        return Err(ManifoldError::dimension_mismatch(
            "a matrix with at least as many rows as columns",
            format!("{}x{}", a.nrows(), a.ncols()),
        ));
    }
    Ok(())
}
