//! Geometric contract checks for every manifold in this crate.
//!
//! Each manifold is run through the shared property tester on seeded random
//! points, then a few properties are re-checked over random seeds and sizes
//! with proptest.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use qriemann_core::{
    manifold::Manifold,
    tensor::Tensor,
    test_utils::{seeded_rng, ManifoldPropertyTester, PropertyTestConfig},
    types::Precision,
};
use qriemann_manifolds::{HermitianMatrix, Povm, Stiefel};

fn config() -> PropertyTestConfig<f64> {
    PropertyTestConfig {
        tolerance: 1e-4,
        ..PropertyTestConfig::default()
    }
}

#[test]
fn test_hermitian_properties() {
    ManifoldPropertyTester::assert_all_properties(&HermitianMatrix::default(), &[4, 4], &config());
}

#[test]
fn test_povm_properties() {
    ManifoldPropertyTester::assert_all_properties(&Povm::default(), &[3, 4, 4], &config());
}

#[test]
fn test_batched_povm_properties() {
    ManifoldPropertyTester::assert_all_properties(&Povm::default(), &[2, 3, 4, 4], &config());
}

#[test]
fn test_stiefel_properties() {
    ManifoldPropertyTester::assert_all_properties(&Stiefel::default(), &[6, 3], &config());
}

#[test]
fn test_stiefel_qr_properties() {
    let stiefel = Stiefel::new("euclidean", "qr").unwrap();
    ManifoldPropertyTester::assert_all_properties(&stiefel, &[6, 3], &config());
}

#[test]
fn test_property_report_counts() {
    let results = ManifoldPropertyTester::test_all_properties(&Povm::default(), &[3, 4, 4], &config());
    assert_eq!(results.len(), 7);
    for (name, result) in results {
        assert!(result.num_tests > 0, "{name} ran no checks");
        assert!(result.passed, "{name}: {:?}", result.errors);
    }
}

#[test]
fn test_batch_entries_are_independent() {
    let povm = Povm::default();
    let mut rng = seeded_rng(17);
    let batched: Tensor<f64> = povm.random_with(&[2, 3, 4, 4], Precision::Double, &mut rng).unwrap();
    let noise = Tensor::random_normal(batched.shape(), &mut rng).unwrap();
    let projected = povm.proj(&batched, &noise).unwrap();

    for k in 0..2 {
        let point = Tensor::from_matrices(&[3, 4, 4], batched.entry(3, k).unwrap().to_vec()).unwrap();
        let direction = Tensor::from_matrices(&[3, 4, 4], noise.entry(3, k).unwrap().to_vec()).unwrap();
        let single = povm.proj(&point, &direction).unwrap();
        assert_eq!(single.matrices(), projected.entry(3, k).unwrap());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_povm_retraction_stays_on_manifold(seed in any::<u64>(), m in 2usize..5, n in 2usize..5, scale in 0.01f64..20.0) {
        let povm = Povm::default();
        let mut rng = seeded_rng(seed);
        let u: Tensor<f64> = povm.random_with(&[m, n, n], Precision::Double, &mut rng).unwrap();
        let v = povm.random_tangent_with(&u, &mut rng).unwrap();
        let moved = povm.retraction(&u, &v.scale(scale)).unwrap();
        prop_assert!(povm.is_in_manifold(&moved, 1e-8).iter().all(|&ok| ok));
    }

    #[test]
    fn prop_stiefel_projection_idempotent(seed in any::<u64>(), p in 1usize..5, extra in 0usize..4) {
        let stiefel = Stiefel::default();
        let n = p + extra;
        let mut rng = seeded_rng(seed);
        let u: Tensor<f64> = stiefel.random_with(&[n, p], Precision::Double, &mut rng).unwrap();
        let noise = Tensor::random_normal(&[n, p], &mut rng).unwrap();
        let once = stiefel.proj(&u, &noise).unwrap();
        let twice = stiefel.proj(&u, &once).unwrap();
        prop_assert!((&twice - &once).norm() < 1e-10 * (1.0 + once.norm()));
    }

    #[test]
    fn prop_hermitian_inner_is_symmetric(seed in any::<u64>(), n in 1usize..6) {
        let hermitian = HermitianMatrix::default();
        let mut rng = seeded_rng(seed);
        let u: Tensor<f64> = hermitian.random_with(&[n, n], Precision::Double, &mut rng).unwrap();
        let a = hermitian.random_tangent_with(&u, &mut rng).unwrap();
        let b = hermitian.random_tangent_with(&u, &mut rng).unwrap();
        let ab = hermitian.inner(&u, &a, &b).unwrap()[0];
        let ba = hermitian.inner(&u, &b, &a).unwrap()[0];
        prop_assert!((ab - ba).abs() < 1e-10 * (1.0 + ab.abs()));
        prop_assert!(hermitian.inner(&u, &a, &a).unwrap()[0] >= 0.0);
    }
}
