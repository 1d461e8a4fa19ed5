//! Block layout helpers shared by the matrix manifolds.

use qriemann_core::types::{CMatrix, Scalar};

/// Stacks the transposed blocks: `[A_1ᵀ; …; A_mᵀ]`.
///
/// For `m` blocks of size `r × c` the result is `(m·c) × r`.
pub fn stack_transposed<T: Scalar>(blocks: &[CMatrix<T>]) -> CMatrix<T> {
    let (rows, cols) = blocks.first().map_or((0, 0), |b| b.shape());
    let mut stacked = CMatrix::zeros(blocks.len() * cols, rows);
    for (i, block) in blocks.iter().enumerate() {
        stacked.rows_mut(i * cols, cols).copy_from(&block.transpose());
    }
    stacked
}

/// Inverse of [`stack_transposed`] for `count` blocks.
pub fn unstack_transposed<T: Scalar>(stacked: &CMatrix<T>, count: usize) -> Vec<CMatrix<T>> {
    let height = stacked.nrows() / count.max(1);
    (0..count)
        .map(|i| stacked.rows(i * height, height).transpose())
        .collect()
}

/// Concatenates blocks side by side: `[A_1 … A_m]`.
pub fn hstack<T: Scalar>(blocks: &[CMatrix<T>]) -> CMatrix<T> {
    let (rows, cols) = blocks.first().map_or((0, 0), |b| b.shape());
    let mut wide = CMatrix::zeros(rows, blocks.len() * cols);
    for (i, block) in blocks.iter().enumerate() {
        wide.columns_mut(i * cols, cols).copy_from(block);
    }
    wide
}

/// Tangent projection of the complex Stiefel manifold at the isometry `u`:
/// `v − ½ u (uᴴ v + vᴴ u)`.
pub fn stiefel_tangent_projection<T: Scalar>(u: &CMatrix<T>, v: &CMatrix<T>) -> CMatrix<T> {
    let half = <T as Scalar>::from_f64(0.5);
    let symmetric = u.adjoint() * v + v.adjoint() * u;
    v - (u * symmetric).map(|z| z * half)
}
