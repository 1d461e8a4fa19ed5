//! Riemannian Stochastic Gradient Descent (SGD) optimizer.
//!
//! This module implements SGD adapted for manifolds of complex matrices.
//! Every update keeps the parameter on its manifold: the step is taken in
//! the tangent space and mapped back with the manifold's retraction.
//!
//! # Algorithm Overview
//!
//! Given a point `u` and a Euclidean gradient `g`:
//! 1. Convert to the Riemannian gradient `r = egrad_to_rgrad(u, g)`
//! 2. Without momentum: `u ← R_u(−lr·r)`
//! 3. With momentum `β`: `m ← β·m + (1 − β)·r`, then
//!    `(u, m) ← retraction_transport(u, m, −lr·m)`, so the velocity follows
//!    the point into its new tangent space
//! 4. Nesterov: the gradient of step 3 is evaluated at the look-ahead point
//!    `R_u(−β·lr·m)`
//!
//! Momentum state is kept per parameter, created on its first update and
//! dropped with the optimizer or on [`RiemannianSgd::reset`].

use qriemann_core::{
    error::{ManifoldError, OptimizerError, OptimizerResult},
    manifold::Manifold,
    parameter::{Gradient, ParamId, Parameter},
    tensor::Tensor,
    types::Scalar,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Momentum method for SGD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MomentumMethod<T>
where
    T: Scalar,
{
    /// No momentum
    None,

    /// Classical momentum: m_k = β·m_{k−1} + (1 − β)·grad_k
    Classical { coefficient: T },

    /// Nesterov accelerated gradient, evaluated at the look-ahead point
    Nesterov { coefficient: T },
}

/// Configuration for the SGD optimizer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SgdConfig<T>
where
    T: Scalar,
{
    /// Step length applied to the (momentum-averaged) Riemannian gradient
    pub learning_rate: T,

    /// Momentum coefficient β in [0, 1]; 0 disables momentum
    pub momentum: T,

    /// Whether to evaluate gradients at the Nesterov look-ahead point
    pub nesterov: bool,
}

impl<T> Default for SgdConfig<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            learning_rate: <T as Scalar>::from_f64(0.01),
            momentum: T::zero(),
            nesterov: false,
        }
    }
}

impl<T> SgdConfig<T>
where
    T: Scalar,
{
    /// Creates a new SGD configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: T) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the momentum coefficient.
    pub fn with_momentum(mut self, momentum: T) -> Self {
        self.momentum = momentum;
        self
    }

    /// Enables or disables Nesterov look-ahead.
    pub fn with_nesterov(mut self, nesterov: bool) -> Self {
        self.nesterov = nesterov;
        self
    }

    /// Checks the hyper-parameters.
    ///
    /// # Errors
    /// The learning rate must be finite and positive and the momentum must
    /// lie in `[0, 1]`.
    pub fn validate(&self) -> OptimizerResult<()> {
        let lr = self.learning_rate;
        if !<T as Scalar>::to_f64(lr).is_finite() || lr <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "learning rate must be positive and finite",
                "learning_rate",
                lr.to_string(),
            ));
        }
        let beta = self.momentum;
        if !(beta >= T::zero() && beta <= T::one()) {
            return Err(OptimizerError::invalid_configuration(
                "momentum must lie in [0, 1]",
                "momentum",
                beta.to_string(),
            ));
        }
        Ok(())
    }

    /// The update rule these settings select.
    pub fn momentum_method(&self) -> MomentumMethod<T> {
        if self.nesterov {
            MomentumMethod::Nesterov {
                coefficient: self.momentum,
            }
        } else if self.momentum > T::zero() {
            MomentumMethod::Classical {
                coefficient: self.momentum,
            }
        } else {
            MomentumMethod::None
        }
    }
}

/// Riemannian Stochastic Gradient Descent optimizer.
///
/// Generic over any [`Manifold`]; the manifold is only reached through the
/// trait, so the same optimizer drives Hermitian, POVM and Stiefel
/// parameters.
///
/// # Examples
///
/// ```rust
/// use qriemann_core::prelude::*;
/// use qriemann_manifolds::HermitianMatrix;
/// use qriemann_optim::RiemannianSgd;
///
/// let mut sgd = RiemannianSgd::with_params(HermitianMatrix::default(), 0.1, 0.9, false).unwrap();
/// let mut param = Parameter::new(Tensor::<f64>::zeros(&[2, 2]).unwrap());
/// let grad = Tensor::<f64>::zeros(&[2, 2]).unwrap();
/// sgd.apply_gradient(&mut param, grad.into()).unwrap();
/// assert!(sgd.momentum(&param).is_some());
/// ```
#[derive(Debug)]
pub struct RiemannianSgd<T, M>
where
    T: Scalar,
    M: Manifold<T>,
{
    manifold: M,
    config: SgdConfig<T>,
    momentum: HashMap<ParamId, Tensor<T>>,
}

impl<T, M> RiemannianSgd<T, M>
where
    T: Scalar,
    M: Manifold<T>,
{
    /// Creates a new SGD optimizer with the given configuration.
    pub fn new(manifold: M, config: SgdConfig<T>) -> OptimizerResult<Self> {
        config.validate()?;
        debug!(
            manifold = manifold.name(),
            learning_rate = %config.learning_rate,
            momentum = %config.momentum,
            nesterov = config.nesterov,
            "created Riemannian SGD"
        );
        Ok(Self {
            manifold,
            config,
            momentum: HashMap::new(),
        })
    }

    /// Shortcut for [`RiemannianSgd::new`] with explicit hyper-parameters.
    pub fn with_params(manifold: M, learning_rate: T, momentum: T, nesterov: bool) -> OptimizerResult<Self> {
        Self::new(
            manifold,
            SgdConfig::new()
                .with_learning_rate(learning_rate)
                .with_momentum(momentum)
                .with_nesterov(nesterov),
        )
    }

    pub fn config(&self) -> &SgdConfig<T> {
        &self.config
    }

    pub fn manifold(&self) -> &M {
        &self.manifold
    }

    /// Current momentum of a parameter, if one has been created.
    pub fn momentum(&self, param: &Parameter<T>) -> Option<&Tensor<T>> {
        self.momentum.get(&param.id())
    }

    /// Drops all momentum state.
    pub fn reset(&mut self) {
        self.momentum.clear();
    }

    /// Point at which the next gradient of `param` should be evaluated.
    ///
    /// For Nesterov momentum this is `R_u(−β·lr·m)`; otherwise, or before
    /// the first update, it is the parameter value itself.
    pub fn lookahead(&self, param: &Parameter<T>) -> OptimizerResult<Tensor<T>> {
        let point = param.value();
        match (self.config.momentum_method(), self.momentum.get(&param.id())) {
            (MomentumMethod::Nesterov { coefficient }, Some(velocity)) => {
                let step = velocity.scale(-(coefficient * self.config.learning_rate));
                Ok(self.manifold.retraction(point, &step)?)
            }
            _ => Ok(point.clone()),
        }
    }

    /// Evaluates `grad_fn` at [`RiemannianSgd::lookahead`] and applies the result.
    pub fn step<F>(&mut self, param: &mut Parameter<T>, grad_fn: F) -> OptimizerResult<()>
    where
        F: FnOnce(&Tensor<T>) -> Tensor<T>,
    {
        let at = self.lookahead(param)?;
        let egrad = grad_fn(&at);
        self.apply_gradient(param, Gradient::Dense(egrad))
    }

    /// Updates `param` in place from a Euclidean gradient.
    ///
    /// With Nesterov momentum the gradient is expected to have been evaluated
    /// at [`RiemannianSgd::lookahead`]; it is brought to the tangent space of
    /// the current point before use.
    ///
    /// # Errors
    /// Sparse gradients are unsupported, gradients must have the shape of the
    /// parameter and be finite, and manifold failures are propagated. The parameter and its
    /// momentum are left untouched on error.
    pub fn apply_gradient(&mut self, param: &mut Parameter<T>, gradient: Gradient<T>) -> OptimizerResult<()> {
        let egrad = match gradient {
            Gradient::Dense(tensor) => tensor,
            Gradient::Sparse(_) => {
                return Err(OptimizerError::unsupported(
                    "sparse gradient updates are not supported",
                ))
            }
        };
        let point = param.value();
        if egrad.shape() != point.shape() {
            return Err(ManifoldError::dimension_mismatch(
                format!("gradient of shape {:?}", point.shape()),
                format!("{:?}", egrad.shape()),
            )
            .into());
        }
        if !egrad.is_finite() {
            return Err(ManifoldError::numerical_failure("gradient contains non-finite values").into());
        }

        let id = param.id();
        let lr = self.config.learning_rate;
        let rgrad = self.manifold.egrad_to_rgrad(point, &egrad)?;
        trace!(
            param = id.get(),
            gradient_norm = %rgrad.norm(),
            "sgd update"
        );

        let updated = match self.config.momentum_method() {
            MomentumMethod::None => self.manifold.retraction(point, &rgrad.scale(-lr))?,
            MomentumMethod::Classical { coefficient } | MomentumMethod::Nesterov { coefficient } => {
                let fresh = rgrad.scale(T::one() - coefficient);
                let velocity = match self.momentum.get(&id) {
                    Some(previous) => &previous.scale(coefficient) + &fresh,
                    None => {
                        debug!(param = id.get(), manifold = self.manifold.name(), "creating momentum slot");
                        fresh
                    }
                };
                let (updated, transported) =
                    self.manifold
                        .retraction_transport(point, &velocity, &velocity.scale(-lr))?;
                self.momentum.insert(id, transported);
                updated
            }
        };
        param.set_value(updated)?;
        Ok(())
    }

    /// Applies one gradient to each of several parameters, in order.
    ///
    /// Stops at the first failure; earlier parameters keep their update.
    pub fn apply_gradients<'a, I>(&mut self, updates: I) -> OptimizerResult<()>
    where
        I: IntoIterator<Item = (&'a mut Parameter<T>, Gradient<T>)>,
    {
        for (param, gradient) in updates {
            self.apply_gradient(param, gradient)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qriemann_core::ErrorKind;

    #[test]
    fn test_sgd_config() {
        let config = SgdConfig::<f64>::new()
            .with_learning_rate(0.1)
            .with_momentum(0.9)
            .with_nesterov(true);

        assert_eq!(config.learning_rate, 0.1);
        assert!(config.nesterov);
        assert_eq!(config.momentum_method(), MomentumMethod::Nesterov { coefficient: 0.9 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_momentum_method_selection() {
        let plain = SgdConfig::<f64>::default();
        assert_eq!(plain.learning_rate, 0.01);
        assert_eq!(plain.momentum_method(), MomentumMethod::None);
        assert_eq!(
            plain.clone().with_momentum(0.5).momentum_method(),
            MomentumMethod::Classical { coefficient: 0.5 }
        );
        assert_eq!(
            plain.with_nesterov(true).momentum_method(),
            MomentumMethod::Nesterov { coefficient: 0.0 }
        );
    }

    #[test]
    fn test_config_validation() {
        for lr in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let err = SgdConfig::new().with_learning_rate(lr).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        for beta in [-0.5, 1.5, f64::NAN] {
            let err = SgdConfig::new().with_momentum(beta).validate().unwrap_err();
            assert!(matches!(err, OptimizerError::InvalidConfiguration { ref parameter, .. } if parameter == "momentum"));
        }
        assert!(SgdConfig::new().with_momentum(1.0).validate().is_ok());
        assert!(SgdConfig::new().with_momentum(0.0).validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let config = SgdConfig::<f64>::new().with_learning_rate(0.05).with_momentum(0.9);
        let json = serde_json::to_string(&config).unwrap();
        let back: SgdConfig<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
