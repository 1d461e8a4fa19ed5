//! Batched complex tensors.
//!
//! A [`Tensor`] of shape `[b_0, …, b_k, r, c]` is stored as a row-major
//! sequence of `r × c` complex matrices, one per combination of the leading
//! indices. Manifolds own the trailing `rank` dimensions of the shape
//! (`(n, n)` for Hermitian matrices, `(m, n, n)` for POVMs); everything in
//! front of them is the batch shape. Batch entries never share state, so the
//! per-entry helpers below may run them in parallel.

use crate::error::{ManifoldError, Result};
use crate::types::{complex, CMatrix, Scalar};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::ops::{Add, Mul, Neg, Sub};

/// Dense batched tensor of complex matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: Scalar> {
    shape: Vec<usize>,
    matrices: Vec<CMatrix<T>>,
}

fn validate_shape(shape: &[usize]) -> Result<()> {
    if shape.len() < 2 {
        return Err(ManifoldError::invalid_argument(format!(
            "tensor shape {shape:?} needs at least two (matrix) dimensions"
        )));
    }
    if shape.iter().any(|&d| d == 0) {
        return Err(ManifoldError::invalid_argument(format!(
            "tensor shape {shape:?} has an empty dimension"
        )));
    }
    Ok(())
}

fn matrix_count(shape: &[usize]) -> usize {
    shape[..shape.len() - 2].iter().product()
}

/// Draws one standard normal sample in the requested precision.
pub(crate) fn sample_normal<T: Scalar, R: Rng + ?Sized>(rng: &mut R) -> T {
    let v: f64 = StandardNormal.sample(rng);
    <T as Scalar>::from_f64(v)
}

#[cfg(feature = "parallel")]
fn collect_chunks<T, R, F>(items: &[CMatrix<T>], per: usize, f: F) -> Vec<R>
where
    T: Scalar,
    R: Send,
    F: Fn(&[CMatrix<T>]) -> R + Send + Sync,
{
    items.par_chunks(per).map(|chunk| f(chunk)).collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_chunks<T, R, F>(items: &[CMatrix<T>], per: usize, f: F) -> Vec<R>
where
    T: Scalar,
    R: Send,
    F: Fn(&[CMatrix<T>]) -> R + Send + Sync,
{
    items.chunks(per).map(|chunk| f(chunk)).collect()
}

#[cfg(feature = "parallel")]
fn collect_chunk_pairs<T, R, F>(a: &[CMatrix<T>], b: &[CMatrix<T>], per: usize, f: F) -> Vec<R>
where
    T: Scalar,
    R: Send,
    F: Fn(&[CMatrix<T>], &[CMatrix<T>]) -> R + Send + Sync,
{
    a.par_chunks(per)
        .zip(b.par_chunks(per))
        .map(|(x, y)| f(x, y))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_chunk_pairs<T, R, F>(a: &[CMatrix<T>], b: &[CMatrix<T>], per: usize, f: F) -> Vec<R>
where
    T: Scalar,
    R: Send,
    F: Fn(&[CMatrix<T>], &[CMatrix<T>]) -> R + Send + Sync,
{
    a.chunks(per).zip(b.chunks(per)).map(|(x, y)| f(x, y)).collect()
}

impl<T: Scalar> Tensor<T> {
    /// Creates a zero tensor of the given shape.
    pub fn zeros(shape: &[usize]) -> Result<Self> {
        validate_shape(shape)?;
        let (rows, cols) = (shape[shape.len() - 2], shape[shape.len() - 1]);
        Ok(Self {
            shape: shape.to_vec(),
            matrices: vec![CMatrix::zeros(rows, cols); matrix_count(shape)],
        })
    }

    /// Wraps a single matrix as a tensor of shape `[rows, cols]`.
    pub fn from_matrix(matrix: CMatrix<T>) -> Self {
        Self {
            shape: vec![matrix.nrows(), matrix.ncols()],
            matrices: vec![matrix],
        }
    }

    /// Builds a tensor from its matrices in row-major order of the leading indices.
    pub fn from_matrices(shape: &[usize], matrices: Vec<CMatrix<T>>) -> Result<Self> {
        validate_shape(shape)?;
        let expected = matrix_count(shape);
        if matrices.len() != expected {
            return Err(ManifoldError::dimension_mismatch(
                format!("{expected} matrices for shape {shape:?}"),
                format!("{} matrices", matrices.len()),
            ));
        }
        let (rows, cols) = (shape[shape.len() - 2], shape[shape.len() - 1]);
        if let Some(bad) = matrices
            .iter()
            .find(|m| m.nrows() != rows || m.ncols() != cols)
        {
            return Err(ManifoldError::dimension_mismatch(
                format!("{rows}x{cols} matrices"),
                format!("a {}x{} matrix", bad.nrows(), bad.ncols()),
            ));
        }
        Ok(Self {
            shape: shape.to_vec(),
            matrices,
        })
    }

    /// Tensor with independent standard normal real and imaginary parts.
    pub fn random_normal<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Result<Self> {
        validate_shape(shape)?;
        let (rows, cols) = (shape[shape.len() - 2], shape[shape.len() - 1]);
        let matrices = (0..matrix_count(shape))
            .map(|_| {
                CMatrix::from_fn(rows, cols, |_, _| {
                    let re = sample_normal::<T, _>(rng);
                    let im = sample_normal::<T, _>(rng);
                    complex(re, im)
                })
            })
            .collect();
        Ok(Self {
            shape: shape.to_vec(),
            matrices,
        })
    }

    /// Full shape, batch dimensions first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Shape `(rows, cols)` of every stored matrix.
    pub fn matrix_shape(&self) -> (usize, usize) {
        let n = self.shape.len();
        (self.shape[n - 2], self.shape[n - 1])
    }

    /// All matrices in storage order.
    pub fn matrices(&self) -> &[CMatrix<T>] {
        &self.matrices
    }

    /// Mutable access to the stored matrices; the shape is fixed.
    pub fn matrices_mut(&mut self) -> &mut [CMatrix<T>] {
        &mut self.matrices
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank < 2 || rank > self.shape.len() {
            return Err(ManifoldError::dimension_mismatch(
                format!("a tensor with at least {rank} dimensions"),
                format!("shape {:?}", self.shape),
            ));
        }
        Ok(())
    }

    /// Leading dimensions not owned by a manifold of the given rank.
    pub fn batch_shape(&self, rank: usize) -> Result<&[usize]> {
        self.check_rank(rank)?;
        Ok(&self.shape[..self.shape.len() - rank])
    }

    /// Number of independent batch entries for a manifold of the given rank.
    pub fn batch_len(&self, rank: usize) -> Result<usize> {
        Ok(self.batch_shape(rank)?.iter().product())
    }

    /// Number of matrices making up one batch entry.
    pub fn entry_len(&self, rank: usize) -> Result<usize> {
        self.check_rank(rank)?;
        let n = self.shape.len();
        Ok(self.shape[n - rank..n - 2].iter().product())
    }

    /// Matrices of batch entry `index`.
    pub fn entry(&self, rank: usize, index: usize) -> Result<&[CMatrix<T>]> {
        let per = self.entry_len(rank)?;
        let count = self.batch_len(rank)?;
        if index >= count {
            return Err(ManifoldError::invalid_argument(format!(
                "batch index {index} out of range for {count} entries"
            )));
        }
        Ok(&self.matrices[index * per..(index + 1) * per])
    }

    /// Fails unless both tensors have exactly the same shape.
    pub fn ensure_same_shape(&self, other: &Self) -> Result<()> {
        if self.shape != other.shape {
            return Err(ManifoldError::dimension_mismatch(
                format!("{:?}", self.shape),
                format!("{:?}", other.shape),
            ));
        }
        Ok(())
    }

    /// Applies `f` to every batch entry, producing a tensor of the same shape.
    pub fn map_entries<F>(&self, rank: usize, f: F) -> Result<Self>
    where
        F: Fn(&[CMatrix<T>]) -> Result<Vec<CMatrix<T>>> + Send + Sync,
    {
        let per = self.entry_len(rank)?;
        let blocks = collect_chunks(&self.matrices, per, f)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        Self::from_matrices(&self.shape, blocks.into_iter().flatten().collect())
    }

    /// Applies `f` to matching batch entries of two same-shaped tensors.
    pub fn zip_map_entries<F>(&self, other: &Self, rank: usize, f: F) -> Result<Self>
    where
        F: Fn(&[CMatrix<T>], &[CMatrix<T>]) -> Result<Vec<CMatrix<T>>> + Send + Sync,
    {
        self.ensure_same_shape(other)?;
        let per = self.entry_len(rank)?;
        let blocks = collect_chunk_pairs(&self.matrices, &other.matrices, per, f)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        Self::from_matrices(&self.shape, blocks.into_iter().flatten().collect())
    }

    /// Reduces every batch entry to a single value.
    pub fn reduce_entries<R, F>(&self, rank: usize, f: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&[CMatrix<T>]) -> R + Send + Sync,
    {
        let per = self.entry_len(rank)?;
        Ok(collect_chunks(&self.matrices, per, f))
    }

    /// Reduces matching batch entries of two same-shaped tensors.
    pub fn zip_reduce_entries<R, F>(&self, other: &Self, rank: usize, f: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&[CMatrix<T>], &[CMatrix<T>]) -> R + Send + Sync,
    {
        self.ensure_same_shape(other)?;
        let per = self.entry_len(rank)?;
        Ok(collect_chunk_pairs(&self.matrices, &other.matrices, per, f))
    }

    /// Multiplies every element by a real factor.
    pub fn scale(&self, factor: T) -> Self {
        Self {
            shape: self.shape.clone(),
            matrices: self
                .matrices
                .iter()
                .map(|m| m.map(|z| z * factor))
                .collect(),
        }
    }

    /// Frobenius norm over the whole tensor.
    pub fn norm(&self) -> T {
        self.matrices
            .iter()
            .fold(T::zero(), |acc, m| acc + m.norm_squared())
            .sqrt()
    }

    /// `Re Σ conj(self) · other` over the whole tensor.
    pub fn real_dot(&self, other: &Self) -> Result<T> {
        self.ensure_same_shape(other)?;
        Ok(self
            .matrices
            .iter()
            .zip(&other.matrices)
            .fold(T::zero(), |acc, (a, b)| acc + a.dotc(b).re))
    }

    /// Whether every real and imaginary part is finite.
    pub fn is_finite(&self) -> bool {
        self.matrices.iter().all(crate::linalg::is_finite_matrix)
    }

    /// Splits into paired real/imaginary planes: shape `[…, r, c, 2]`, row-major.
    pub fn to_real_planes(&self) -> (Vec<usize>, Vec<T>) {
        let mut shape = self.shape.clone();
        shape.push(2);
        let (rows, cols) = self.matrix_shape();
        let mut data = Vec::with_capacity(2 * rows * cols * self.matrices.len());
        for m in &self.matrices {
            for i in 0..rows {
                for j in 0..cols {
                    let z = m[(i, j)];
                    data.push(z.re);
                    data.push(z.im);
                }
            }
        }
        (shape, data)
    }

    /// Inverse of [`Tensor::to_real_planes`].
    pub fn from_real_planes(shape: &[usize], data: &[T]) -> Result<Self> {
        match shape.split_last() {
            Some((&2, complex_shape)) => {
                validate_shape(complex_shape)?;
                let expected: usize = shape.iter().product();
                if data.len() != expected {
                    return Err(ManifoldError::dimension_mismatch(
                        format!("{expected} values for shape {shape:?}"),
                        format!("{} values", data.len()),
                    ));
                }
                let n = complex_shape.len();
                let (rows, cols) = (complex_shape[n - 2], complex_shape[n - 1]);
                let stride = 2 * rows * cols;
                let matrices = data
                    .chunks(stride)
                    .map(|plane| {
                        CMatrix::from_fn(rows, cols, |i, j| {
                            let k = 2 * (i * cols + j);
                            complex(plane[k], plane[k + 1])
                        })
                    })
                    .collect();
                Self::from_matrices(complex_shape, matrices)
            }
            _ => Err(ManifoldError::invalid_argument(format!(
                "real-plane shape {shape:?} must end with a dimension of size 2"
            ))),
        }
    }
}

/// Entry-wise sum of two tensors.
///
/// # Panics
/// Panics if the shapes differ.
impl<'a, 'b, T: Scalar> Add<&'b Tensor<T>> for &'a Tensor<T> {
    type Output = Tensor<T>;

    fn add(self, rhs: &'b Tensor<T>) -> Tensor<T> {
        assert_eq!(self.shape, rhs.shape, "tensor shapes must agree");
        Tensor {
            shape: self.shape.clone(),
            matrices: self
                .matrices
                .iter()
                .zip(&rhs.matrices)
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

/// Entry-wise difference of two tensors.
///
/// # Panics
/// Panics if the shapes differ.
impl<'a, 'b, T: Scalar> Sub<&'b Tensor<T>> for &'a Tensor<T> {
    type Output = Tensor<T>;

    fn sub(self, rhs: &'b Tensor<T>) -> Tensor<T> {
        assert_eq!(self.shape, rhs.shape, "tensor shapes must agree");
        Tensor {
            shape: self.shape.clone(),
            matrices: self
                .matrices
                .iter()
                .zip(&rhs.matrices)
                .map(|(a, b)| a - b)
                .collect(),
        }
    }
}

impl<'a, T: Scalar> Neg for &'a Tensor<T> {
    type Output = Tensor<T>;

    fn neg(self) -> Tensor<T> {
        Tensor {
            shape: self.shape.clone(),
            matrices: self.matrices.iter().map(|m| -m).collect(),
        }
    }
}

impl<'a, T: Scalar> Mul<T> for &'a Tensor<T> {
    type Output = Tensor<T>;

    fn mul(self, rhs: T) -> Tensor<T> {
        self.scale(rhs)
    }
}
