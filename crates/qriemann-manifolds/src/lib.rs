//! Concrete complex-matrix manifolds for Riemannian optimization.
//!
//! This crate provides the manifolds that arise as parameter spaces in
//! quantum-information problems:
//!
//! - [`HermitianMatrix`]: Hermitian matrices (observables, Hamiltonians)
//! - [`Povm`]: the quotient manifold of POVMs given by their Kraus-like blocks
//! - [`Stiefel`]: complex isometries, used for eigenspace problems

pub mod hermitian;
pub mod povm;
pub mod stiefel;
pub mod utils;

// Re-export main manifolds for convenience
pub use hermitian::HermitianMatrix;
pub use povm::Povm;
pub use stiefel::{Stiefel, StiefelRetraction};
