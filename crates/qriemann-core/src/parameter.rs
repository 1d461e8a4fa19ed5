//! Optimizable parameters and the gradients handed to optimizers.

use crate::error::Result;
use crate::tensor::Tensor;
use crate::types::Scalar;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a [`Parameter`].
///
/// Optimizers key their per-parameter state (momentum) by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(u64);

impl ParamId {
    fn next() -> Self {
        Self(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value of the id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A manifold point that an optimizer updates in place.
///
/// Not `Clone`: two parameters sharing an id would share optimizer state.
#[derive(Debug)]
pub struct Parameter<T: Scalar> {
    id: ParamId,
    value: Tensor<T>,
}

impl<T: Scalar> Parameter<T> {
    /// Wraps a point, assigning a fresh id.
    pub fn new(value: Tensor<T>) -> Self {
        Self {
            id: ParamId::next(),
            value,
        }
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn value(&self) -> &Tensor<T> {
        &self.value
    }

    /// Replaces the value; the new tensor must keep the current shape.
    pub fn set_value(&mut self, value: Tensor<T>) -> Result<()> {
        self.value.ensure_same_shape(&value)?;
        self.value = value;
        Ok(())
    }

    pub fn into_value(self) -> Tensor<T> {
        self.value
    }
}

/// Gradient restricted to a subset of batch entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseGradient<T: Scalar> {
    /// Batch entries the values belong to.
    pub indices: Vec<usize>,
    /// One entry per index, stacked along the leading dimension.
    pub values: Tensor<T>,
}

/// Euclidean gradient supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Gradient<T: Scalar> {
    /// Full gradient with the shape of the parameter.
    Dense(Tensor<T>),
    /// Row-sparse gradient; no update rule accepts it.
    Sparse(SparseGradient<T>),
}

impl<T: Scalar> Gradient<T> {
    pub fn is_sparse(&self) -> bool {
        matches!(self, Gradient::Sparse(_))
    }
}

impl<T: Scalar> From<Tensor<T>> for Gradient<T> {
    fn from(tensor: Tensor<T>) -> Self {
        Gradient::Dense(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_ids_are_unique() {
        let a = Parameter::new(Tensor::<f64>::zeros(&[2, 2]).unwrap());
        let b = Parameter::new(Tensor::<f64>::zeros(&[2, 2]).unwrap());
        assert_ne!(a.id(), b.id());
        assert!(a.id().get() != b.id().get());
    }

    #[test]
    fn test_set_value_keeps_shape() {
        let mut p = Parameter::new(Tensor::<f64>::zeros(&[2, 2]).unwrap());
        assert!(p.set_value(Tensor::zeros(&[2, 2]).unwrap()).is_ok());
        assert!(p.set_value(Tensor::zeros(&[3, 2]).unwrap()).is_err());
        assert_eq!(p.into_value().shape(), &[2, 2]);
    }

    #[test]
    fn test_gradient_conversion() {
        let g: Gradient<f64> = Tensor::zeros(&[2, 2]).unwrap().into();
        assert!(!g.is_sparse());
        let sparse = Gradient::Sparse(SparseGradient {
            indices: vec![0],
            values: Tensor::<f64>::zeros(&[1, 2, 2]).unwrap(),
        });
        assert!(sparse.is_sparse());
    }
}
