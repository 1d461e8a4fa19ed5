//! Test utilities for property-based testing of manifolds.
//!
//! [`ManifoldPropertyTester`] checks the geometric contract of
//! [`Manifold`] implementations on seeded random points: projection
//! idempotence, metric compatibility of the Riemannian gradient, the
//! retraction axioms and the vector-transport properties. Available to other
//! crates through the `test-utils` feature.

use crate::{
    error::Result,
    linalg::{gaussian_matrix, qr_isometry},
    manifold::Manifold,
    tensor::Tensor,
    types::{CMatrix, Scalar},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig<T> {
    /// Tolerance for numerical comparisons
    pub tolerance: T,
    /// Number of random points to test
    pub num_points: usize,
    /// Number of random tangent vectors per point
    pub num_tangents: usize,
    /// Scale factor for tangent vectors
    pub tangent_scale: T,
    /// Seed of the generator drawing points and tangents
    pub seed: u64,
}

impl<T: Scalar> Default for PropertyTestConfig<T> {
    fn default() -> Self {
        Self {
            tolerance: <T as Scalar>::from_f64(1e-4),
            num_points: 5,
            num_tangents: 3,
            tangent_scale: <T as Scalar>::from_f64(0.1),
            seed: 42,
        }
    }
}

/// Results from property tests.
#[derive(Debug)]
pub struct PropertyTestResult<T> {
    /// Whether all tests passed
    pub passed: bool,
    /// Maximum error observed
    pub max_error: T,
    /// Number of tests performed
    pub num_tests: usize,
    /// Detailed error messages
    pub errors: Vec<String>,
}

struct Tally<T> {
    max_error: T,
    num_tests: usize,
    errors: Vec<String>,
}

impl<T: Scalar> Tally<T> {
    fn new() -> Self {
        Self {
            max_error: T::zero(),
            num_tests: 0,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, what: &str, error: T, tolerance: T) {
        self.num_tests += 1;
        if error > self.max_error {
            self.max_error = error;
        }
        if !(error <= tolerance) {
            self.errors.push(format!(
                "{what}: error = {error} > tolerance = {tolerance}"
            ));
        }
    }

    fn fail(&mut self, what: &str, reason: impl std::fmt::Display) {
        self.num_tests += 1;
        self.errors.push(format!("{what}: {reason}"));
    }

    fn finish(self) -> PropertyTestResult<T> {
        PropertyTestResult {
            passed: self.errors.is_empty(),
            max_error: self.max_error,
            num_tests: self.num_tests,
            errors: self.errors,
        }
    }
}

fn abs<T: Scalar>(x: T) -> T {
    if x < T::zero() {
        -x
    } else {
        x
    }
}

/// `‖a − b‖ / max(1, ‖b‖)`.
fn relative_distance<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> T {
    let scale = b.norm();
    let diff = (a - b).norm();
    if scale > T::one() {
        diff / scale
    } else {
        diff
    }
}

/// Property-based tests for manifolds.
pub struct ManifoldPropertyTester;

impl ManifoldPropertyTester {
    /// Runs `body` for every (point, tangent) pair the configuration asks for.
    fn for_each_sample<T, M, F>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
        tally: &mut Tally<T>,
        mut body: F,
    ) where
        T: Scalar,
        M: Manifold<T>,
        F: FnMut(&Tensor<T>, &Tensor<T>, &mut StdRng, &mut Tally<T>) -> Result<()>,
    {
        let mut rng = StdRng::seed_from_u64(config.seed);
        for _ in 0..config.num_points {
            let point = match manifold.random_with(shape, T::PRECISION, &mut rng) {
                Ok(p) => p,
                Err(e) => {
                    tally.fail("random point", e);
                    continue;
                }
            };
            for _ in 0..config.num_tangents {
                let outcome = manifold
                    .random_tangent_with(&point, &mut rng)
                    .and_then(|v| body(&point, &v, &mut rng, tally));
                if let Err(e) = outcome {
                    tally.fail(manifold.name(), e);
                }
            }
        }
    }

    /// Tests that projection is idempotent and fixes tangent vectors.
    pub fn test_projection_idempotent<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> PropertyTestResult<T>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let mut tally = Tally::new();
        Self::for_each_sample(manifold, shape, config, &mut tally, |u, v, rng, tally| {
            let fixed = manifold.proj(u, v)?;
            tally.record("proj(random_tangent)", relative_distance(&fixed, v), config.tolerance);

            let noise = Tensor::random_normal(u.shape(), rng)?;
            let once = manifold.proj(u, &noise)?;
            let twice = manifold.proj(u, &once)?;
            tally.record("proj(proj(x))", relative_distance(&twice, &once), config.tolerance);
            Ok(())
        });
        tally.finish()
    }

    /// Tests `inner(u, v, egrad_to_rgrad(u, g)) = Re Σ conj(v)·g` for tangent `v`.
    pub fn test_metric_compatibility<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> PropertyTestResult<T>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let mut tally = Tally::new();
        Self::for_each_sample(manifold, shape, config, &mut tally, |u, v, rng, tally| {
            let egrad = Tensor::random_normal(u.shape(), rng)?;
            let rgrad = manifold.egrad_to_rgrad(u, &egrad)?;
            let riemannian = manifold.inner(u, v, &rgrad)?;
            let euclidean = v.zip_reduce_entries(&egrad, manifold.rank(), |a, b| {
                a.iter()
                    .zip(b)
                    .fold(T::zero(), |acc, (x, y)| acc + x.dotc(y).re)
            })?;
            for (lhs, rhs) in riemannian.into_iter().zip(euclidean) {
                let scale = if abs(rhs) > T::one() { abs(rhs) } else { T::one() };
                tally.record("metric compatibility", abs(lhs - rhs) / scale, config.tolerance);
            }
            Ok(())
        });
        tally.finish()
    }

    /// Tests that retraction at zero gives the same point: R(u, 0) = u
    pub fn test_retraction_zero<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> PropertyTestResult<T>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let mut tally = Tally::new();
        Self::for_each_sample(manifold, shape, config, &mut tally, |u, _v, _rng, tally| {
            let zero = Tensor::zeros(u.shape())?;
            let retracted = manifold.retraction(u, &zero)?;
            tally.record("R(u, 0)", relative_distance(&retracted, u), config.tolerance);
            Ok(())
        });
        tally.finish()
    }

    /// Tests first-order contact `(R(u, t v) − u) / t → v`.
    ///
    /// The finite difference at `t = 1e-8` must be within tolerance, and the
    /// error must not grow while `t` shrinks from `1e-2` to `1e-6` unless it
    /// is already negligible.
    pub fn test_first_order_contact<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> PropertyTestResult<T>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let steps = [1e-2, 1e-3, 1e-4, 1e-5, 1e-6];
        let floor = config.tolerance * <T as Scalar>::from_f64(1e-2);
        let mut tally = Tally::new();
        Self::for_each_sample(manifold, shape, config, &mut tally, |u, v, _rng, tally| {
            let scale = v.norm();
            if scale <= T::zero() {
                return Ok(());
            }
            let difference_error = |t: f64| -> Result<T> {
                let t = <T as Scalar>::from_f64(t);
                let moved = manifold.retraction(u, &v.scale(t))?;
                let quotient = (&moved - u).scale(T::one() / t);
                Ok((&quotient - v).norm() / scale)
            };

            tally.record("first-order contact at t = 1e-8", difference_error(1e-8)?, config.tolerance);

            let mut previous = difference_error(steps[0])?;
            for &t in &steps[1..] {
                let current = difference_error(t)?;
                if current > previous && current > floor {
                    tally.fail(
                        "first-order contact",
                        format!("error grew from {previous} to {current} at t = {t}"),
                    );
                } else {
                    tally.record("first-order contact", T::zero(), config.tolerance);
                }
                previous = current;
            }
            Ok(())
        });
        tally.finish()
    }

    /// Tests that retractions land on the manifold, including long steps.
    pub fn test_retraction_on_manifold<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> PropertyTestResult<T>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let scales = [config.tangent_scale, T::one(), <T as Scalar>::from_f64(10.0), <T as Scalar>::from_f64(100.0)];
        let mut tally = Tally::new();
        Self::for_each_sample(manifold, shape, config, &mut tally, |u, v, _rng, tally| {
            for &s in &scales {
                let retracted = manifold.retraction(u, &v.scale(s))?;
                if manifold.is_in_manifold(&retracted, config.tolerance).iter().all(|&ok| ok) {
                    tally.record("is_in_manifold(R(u, v))", T::zero(), config.tolerance);
                } else {
                    tally.fail("is_in_manifold(R(u, v))", format!("left the manifold for step scale {s}"));
                }
            }
            Ok(())
        });
        tally.finish()
    }

    /// Tests `vector_transport(u, v1, 0) = v1`.
    pub fn test_transport_zero<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> PropertyTestResult<T>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let mut tally = Tally::new();
        Self::for_each_sample(manifold, shape, config, &mut tally, |u, v, _rng, tally| {
            let zero = Tensor::zeros(u.shape())?;
            let transported = manifold.vector_transport(u, v, &zero)?;
            tally.record("vector_transport(u, v, 0)", relative_distance(&transported, v), config.tolerance);
            Ok(())
        });
        tally.finish()
    }

    /// Tests that transported vectors are tangent at the retracted point and
    /// that `retraction_transport` agrees with the separate operations.
    pub fn test_transport_tangent<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> PropertyTestResult<T>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let mut tally = Tally::new();
        Self::for_each_sample(manifold, shape, config, &mut tally, |u, v1, rng, tally| {
            let v2 = manifold.random_tangent_with(u, rng)?.scale(config.tangent_scale);
            let transported = manifold.vector_transport(u, v1, &v2)?;
            let target = manifold.retraction(u, &v2)?;
            let reprojected = manifold.proj(&target, &transported)?;
            tally.record(
                "vector_transport tangency",
                relative_distance(&reprojected, &transported),
                config.tolerance,
            );

            let (joint_point, joint_vector) = manifold.retraction_transport(u, v1, &v2)?;
            tally.record("retraction_transport point", relative_distance(&joint_point, &target), config.tolerance);
            tally.record(
                "retraction_transport vector",
                relative_distance(&joint_vector, &transported),
                config.tolerance,
            );
            Ok(())
        });
        tally.finish()
    }

    /// Runs every property test and returns the named results.
    pub fn test_all_properties<T, M>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
    ) -> Vec<(&'static str, PropertyTestResult<T>)>
    where
        T: Scalar,
        M: Manifold<T>,
    {
        vec![
            ("projection idempotence", Self::test_projection_idempotent(manifold, shape, config)),
            ("metric compatibility", Self::test_metric_compatibility(manifold, shape, config)),
            ("retraction at zero", Self::test_retraction_zero(manifold, shape, config)),
            ("first-order contact", Self::test_first_order_contact(manifold, shape, config)),
            ("retraction stays on manifold", Self::test_retraction_on_manifold(manifold, shape, config)),
            ("transport at zero", Self::test_transport_zero(manifold, shape, config)),
            ("transport tangency", Self::test_transport_tangent(manifold, shape, config)),
        ]
    }

    /// Panics with every collected message if any property failed.
    pub fn assert_all_properties<T, M>(manifold: &M, shape: &[usize], config: &PropertyTestConfig<T>)
    where
        T: Scalar,
        M: Manifold<T>,
    {
        let failures: Vec<String> = Self::test_all_properties(manifold, shape, config)
            .into_iter()
            .filter(|(_, result)| !result.passed)
            .map(|(name, result)| format!("{name} on {}: {:?}", manifold.name(), result.errors))
            .collect();
        assert!(failures.is_empty(), "property failures:\n{}", failures.join("\n"));
    }
}

/// Reproducible generator for fixtures.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Haar-like random unitary from the QR factor of a Gaussian matrix.
pub fn random_unitary<T: Scalar, R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<CMatrix<T>> {
    qr_isometry(&gaussian_matrix(n, n, rng))
}
