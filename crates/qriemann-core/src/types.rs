//! Type definitions and aliases for complex-matrix optimization.
//!
//! This module provides the real scalar trait (`f32` or `f64`), the
//! precision tags used when points are generated, and the complex matrix
//! alias every manifold operates on.

use crate::error::{ManifoldError, Result};
use nalgebra::{Complex, DMatrix, RealField};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

/// Dynamically sized complex matrix, the unit of every batched tensor.
pub type CMatrix<T> = DMatrix<Complex<T>>;

/// Trait for the real part of the complex scalars (f32 or f64).
///
/// `Complex<Self>` is what the tensors store; `Self` is what inner
/// products, norms and tolerances are expressed in.
pub trait Scalar:
    RealField + Copy + Default + Display + Debug + Send + Sync + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Precision tag of `Complex<Self>`.
    const PRECISION: Precision;

    /// Convert from f64 (for constants and random samples).
    fn from_f64(v: f64) -> Self;

    /// Convert to f64 (for logging/display).
    fn to_f64(self) -> f64;
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const PRECISION: Precision = Precision::Single;

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const PRECISION: Precision = Precision::Double;

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// Floating-point width of a complex tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Precision {
    /// `Complex<f32>`, a.k.a. complex64.
    Single,
    /// `Complex<f64>`, a.k.a. complex128.
    Double,
}

impl Precision {
    /// Canonical dtype name.
    pub fn name(self) -> &'static str {
        match self {
            Precision::Single => "complex64",
            Precision::Double => "complex128",
        }
    }

    /// Total width in bits of one complex value.
    pub fn bits(self) -> u32 {
        match self {
            Precision::Single => 64,
            Precision::Double => 128,
        }
    }

    /// Maps a complex width in bits to a precision tag.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            64 => Ok(Precision::Single),
            128 => Ok(Precision::Double),
            other => Err(ManifoldError::invalid_argument(format!(
                "unsupported precision: {other}-bit complex values (expected 64 or 128)"
            ))),
        }
    }

    /// Fails unless `self` is the precision of `Complex<T>`.
    pub fn ensure_matches<T: Scalar>(self) -> Result<()> {
        if self == T::PRECISION {
            Ok(())
        } else {
            Err(ManifoldError::invalid_argument(format!(
                "requested {} values but the tensor scalar is {}",
                self.name(),
                T::PRECISION.name()
            )))
        }
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Precision {
    type Err = ManifoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "complex64" | "c64" | "single" => Ok(Precision::Single),
            "complex128" | "c128" | "double" => Ok(Precision::Double),
            other => Err(ManifoldError::invalid_argument(format!(
                "unsupported precision '{other}' (expected complex64 or complex128)"
            ))),
        }
    }
}

/// Builds a complex number from real and imaginary parts.
#[inline]
pub fn complex<T: Scalar>(re: T, im: T) -> Complex<T> {
    Complex::new(re, im)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_parsing() {
        assert_eq!("complex64".parse::<Precision>().unwrap(), Precision::Single);
        assert_eq!("Complex128".parse::<Precision>().unwrap(), Precision::Double);
        let err = "float16".parse::<Precision>().unwrap_err();
        assert!(matches!(err, ManifoldError::InvalidArgument { .. }));
    }

    #[test]
    fn test_precision_bits() {
        assert_eq!(Precision::from_bits(64).unwrap(), Precision::Single);
        assert_eq!(Precision::from_bits(128).unwrap(), Precision::Double);
        assert!(Precision::from_bits(32).is_err());
        assert_eq!(Precision::Double.bits(), 128);
    }

    #[test]
    fn test_precision_matches_scalar() {
        assert!(Precision::Double.ensure_matches::<f64>().is_ok());
        assert!(Precision::Single.ensure_matches::<f32>().is_ok());
        assert!(Precision::Single.ensure_matches::<f64>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_precision_serde() {
        let json = serde_json::to_string(&Precision::Double).unwrap();
        assert_eq!(json, "\"double\"");
        let back: Precision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Precision::Double);
    }
}
