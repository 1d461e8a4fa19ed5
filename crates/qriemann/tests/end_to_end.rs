//! End-to-end optimization runs through the public API.

use approx::assert_abs_diff_eq;
use qriemann::prelude::*;
use qriemann_core::test_utils::seeded_rng;
use tracing_subscriber::EnvFilter;

const ITERATIONS: usize = 200;
const DIM: usize = 20;
const RANK: usize = 10;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sum of the `RANK` smallest eigenvalues, the minimum of the Rayleigh cost.
fn lowest_eigenvalue_sum(h: &CMatrix<f64>) -> f64 {
    let mut eigenvalues: Vec<f64> = h.symmetric_eigenvalues().iter().copied().collect();
    eigenvalues.sort_by(|a, b| a.total_cmp(b));
    eigenvalues[..RANK].iter().sum()
}

fn rayleigh_cost(h: &CMatrix<f64>, q: &CMatrix<f64>) -> f64 {
    (q.adjoint() * h * q).trace().re
}

/// Minimizes Re tr(Qᴴ H Q) over St(20, 10) for a fixed random H and returns
/// the distance of the final cost from the exact minimum.
fn rayleigh_error(learning_rate: f64, momentum: f64, nesterov: bool) -> f64 {
    init_tracing();
    let mut rng = seeded_rng(2024);
    let hamiltonian: Tensor<f64> = HermitianMatrix::default()
        .random_with(&[DIM, DIM], Precision::Double, &mut rng)
        .unwrap();
    let h = hamiltonian.matrices()[0].clone();
    let stiefel = Stiefel::default();
    let start: Tensor<f64> = stiefel.random_with(&[DIM, RANK], Precision::Double, &mut rng).unwrap();

    let mut sgd = RiemannianSgd::with_params(stiefel, learning_rate, momentum, nesterov).unwrap();
    let mut param = Parameter::new(start);
    for _ in 0..ITERATIONS {
        sgd.step(&mut param, |q| {
            Tensor::from_matrix((&h * &q.matrices()[0]) * complex(2.0, 0.0))
        })
        .unwrap();
    }

    assert_eq!(stiefel.is_in_manifold(param.value(), 1e-8), vec![true]);
    (rayleigh_cost(&h, &param.value().matrices()[0]) - lowest_eigenvalue_sum(&h)).abs()
}

#[test]
fn test_rayleigh_plain_gradient_descent() {
    assert_abs_diff_eq!(rayleigh_error(0.05, 0.0, false), 0.0, epsilon = 1e-6);
}

#[test]
fn test_rayleigh_momentum() {
    assert_abs_diff_eq!(rayleigh_error(0.1, 0.9, false), 0.0, epsilon = 1e-6);
}

#[test]
fn test_rayleigh_nesterov() {
    assert_abs_diff_eq!(rayleigh_error(0.1, 0.9, true), 0.0, epsilon = 1e-6);
}

/// Σ_i ‖A_i A_iᴴ − P_i‖² and its Euclidean gradient 4 (A_i A_iᴴ − P_i) A_i.
fn povm_fit(point: &Tensor<f64>, target: &Tensor<f64>) -> (f64, Tensor<f64>) {
    let mut cost = 0.0;
    let gradient = point
        .matrices()
        .iter()
        .zip(target.matrices())
        .map(|(a, p)| {
            let residual = a * a.adjoint() - p;
            cost += residual.norm_squared();
            &residual * a * complex(4.0, 0.0)
        })
        .collect();
    (cost, Tensor::from_matrices(point.shape(), gradient).unwrap())
}

#[test]
fn test_povm_fit_stays_on_manifold() {
    init_tracing();
    let povm = Povm::default();
    let mut rng = seeded_rng(7);
    let target_point: Tensor<f64> = povm.random_with(&[3, 2, 2], Precision::Double, &mut rng).unwrap();
    let target = povm.elements(&target_point).unwrap();

    for (learning_rate, momentum) in [(0.02, 0.0), (0.02, 0.9)] {
        let start: Tensor<f64> = povm.random_with(&[3, 2, 2], Precision::Double, &mut rng).unwrap();
        let (initial_cost, _) = povm_fit(&start, &target);

        let mut sgd = RiemannianSgd::with_params(povm, learning_rate, momentum, false).unwrap();
        let mut param = Parameter::new(start);
        for _ in 0..300 {
            let (_, egrad) = povm_fit(param.value(), &target);
            sgd.apply_gradient(&mut param, egrad.into()).unwrap();
            assert_eq!(povm.is_in_manifold(param.value(), 1e-8), vec![true]);
        }

        let (final_cost, _) = povm_fit(param.value(), &target);
        assert!(final_cost < initial_cost, "{final_cost} >= {initial_cost}");
    }
}

#[test]
fn test_batched_hermitian_parameters() {
    // Each batch entry converges to its own target independently.
    let hermitian = HermitianMatrix::default();
    let mut rng = seeded_rng(8);
    let targets: Tensor<f64> = hermitian.random_with(&[4, 3, 3], Precision::Double, &mut rng).unwrap();

    let mut sgd = RiemannianSgd::with_params(hermitian, 0.1, 0.0, false).unwrap();
    let mut param = Parameter::new(Tensor::<f64>::zeros(&[4, 3, 3]).unwrap());
    for _ in 0..300 {
        let egrad = (param.value() - &targets).scale(2.0);
        sgd.apply_gradient(&mut param, egrad.into()).unwrap();
    }
    let distances = param
        .value()
        .zip_reduce_entries(&targets, 2, |x, t| (&x[0] - &t[0]).norm())
        .unwrap();
    assert_eq!(distances.len(), 4);
    assert!(distances.iter().all(|&d| d < 1e-10), "{distances:?}");
}
