use super::as_batch;
use crate::thread_safe_sequential::{ThreadSafeSequential, build_mlp};
use acrl_core::distributions::{Actor, Policy};
use anyhow::Result;
use candle_core::{Module, Tensor};
use candle_nn::{Activation, Init, VarBuilder};
use std::f64::consts::PI;

/// Gaussian policy with a state dependent mean and a learnable, state independent `log_std`.
#[derive(Debug, Clone)]
pub struct DiagGaussianDistribution {
    mean_net: ThreadSafeSequential,
    log_std: Tensor,
}

impl DiagGaussianDistribution {
    pub fn new(mean_net: ThreadSafeSequential, log_std: Tensor) -> Self {
        Self { mean_net, log_std }
    }

    pub fn build(
        observation_size: usize,
        action_size: usize,
        n_layers: usize,
        size: usize,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let mean_net = build_mlp(
            observation_size,
            action_size,
            n_layers,
            size,
            Activation::Tanh,
            vb,
            "mean",
        )?;
        let log_std = vb.get_with_hints(action_size, "log_std", Init::Const(0.))?;
        Ok(Self::new(mean_net, log_std))
    }

    pub fn mean(&self, observations: &Tensor) -> Result<Tensor> {
        Ok(self.mean_net.forward(observations)?)
    }

    pub fn std(&self) -> Result<f32> {
        let std = self.log_std.exp()?.mean_all()?.to_scalar::<f32>()?;
        Ok(std)
    }
}

impl Actor for DiagGaussianDistribution {
    type Tensor = Tensor;

    fn get_action(&self, observation: &Tensor) -> Result<Tensor> {
        let (observations, single) = as_batch(observation)?;
        let mean = self.mean(&observations)?;
        let noise = Tensor::randn(0f32, 1., mean.shape(), mean.device())?;
        let std = self.log_std.exp()?;
        let actions = mean.add(&noise.broadcast_mul(&std)?)?.detach();
        if single {
            Ok(actions.squeeze(0)?)
        } else {
            Ok(actions)
        }
    }
}

impl Policy for DiagGaussianDistribution {
    /// Multivariate normal with diagonal covariance, summed over the action dimensions.
    fn log_probs(&self, observations: &Tensor, actions: &Tensor) -> Result<Tensor> {
        let mean = self.mean(observations)?;
        let var = self.log_std.affine(2., 0.)?.exp()?;
        let log_sqrt_2pi = (2. * PI).sqrt().ln();
        let log_probs = actions
            .sub(&mean)?
            .sqr()?
            .broadcast_div(&var.affine(2., 0.)?)?
            .neg()?
            .broadcast_sub(&self.log_std)?
            .affine(1., -log_sqrt_2pi)?;
        Ok(log_probs.sum(1)?)
    }

    fn entropy(&self, _observations: &Tensor) -> Result<Tensor> {
        let log_2pi_plus_1_div_2 = 0.5 * ((2. * PI).ln() + 1.);
        let entropy = self
            .log_std
            .affine(1., log_2pi_plus_1_div_2)?
            .sum_all()?;
        Ok(entropy)
    }
}
