use crate::{
    distributions::{
        DistributionKind, categorical_distribution::CategoricalDistribution,
        diagonal_distribution::DiagGaussianDistribution,
    },
    optimizer::OptimizerWithMaxGrad,
    tensors::PolicyLoss,
};
use acrl_core::{
    distributions::{Actor, Policy},
    policies::LearningModule,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use std::{fmt::Debug, path::Path};

#[derive(Debug, Clone)]
pub struct MlpPolicyParams {
    pub ac_dim: usize,
    pub ob_dim: usize,
    pub n_layers: usize,
    pub size: usize,
    pub discrete: bool,
    pub learning_rate: f64,
    pub max_grad_norm: Option<f32>,
}

/// The actor: a categorical (discrete) or diagonal Gaussian (continuous) policy over an MLP,
/// trained with its own Adam optimizer.
pub struct MlpPolicy {
    distribution: DistributionKind,
    optimizer: OptimizerWithMaxGrad,
    varmap: VarMap,
    discrete: bool,
}

impl Debug for MlpPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlpPolicy")
            .field("distribution", &self.distribution)
            .field("optimizer", &self.optimizer)
            .field("discrete", &self.discrete)
            .finish()
    }
}

impl MlpPolicy {
    pub fn build(params: &MlpPolicyParams, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let distribution = if params.discrete {
            DistributionKind::Categorical(CategoricalDistribution::build(
                params.ob_dim,
                params.ac_dim,
                params.n_layers,
                params.size,
                &vb,
                device.clone(),
            )?)
        } else {
            DistributionKind::DiagGaussian(DiagGaussianDistribution::build(
                params.ob_dim,
                params.ac_dim,
                params.n_layers,
                params.size,
                &vb,
            )?)
        };
        let optimizer =
            OptimizerWithMaxGrad::adam(varmap.clone(), params.learning_rate, params.max_grad_norm)?;
        Ok(Self {
            distribution,
            optimizer,
            varmap,
            discrete: params.discrete,
        })
    }

    /// The forward pass: the action distribution of the current parameters.
    pub fn distribution(&self) -> &DistributionKind {
        &self.distribution
    }

    pub fn is_discrete(&self) -> bool {
        self.discrete
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    /// One policy-gradient step on `-mean(log π(a|s) · A(s, a))`. Returns the loss before the
    /// step.
    pub fn update(
        &mut self,
        observations: &Tensor,
        actions: &Tensor,
        advantages: &Tensor,
    ) -> Result<f32> {
        let logps = self.distribution.log_probs(observations, actions)?;
        let policy_loss = PolicyLoss(advantages.mul(&logps)?.neg()?.mean_all()?);
        let loss = policy_loss.to_scalar::<f32>()?;
        LearningModule::update(self, policy_loss)?;
        Ok(loss)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.varmap.save(path)?;
        Ok(())
    }

    /// Loads parameters saved by `save` into this (identically shaped) policy.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.varmap.load(path)?;
        Ok(())
    }
}

impl LearningModule for MlpPolicy {
    type Losses = PolicyLoss;

    fn update(&mut self, losses: Self::Losses) -> Result<()> {
        self.optimizer.backward_step(&losses)?;
        Ok(())
    }
}

impl Actor for MlpPolicy {
    type Tensor = Tensor;

    fn get_action(&self, observation: &Tensor) -> Result<Tensor> {
        self.distribution.get_action(observation)
    }
}

impl Policy for MlpPolicy {
    fn log_probs(&self, observations: &Tensor, actions: &Tensor) -> Result<Tensor> {
        self.distribution.log_probs(observations, actions)
    }

    fn entropy(&self, observations: &Tensor) -> Result<Tensor> {
        self.distribution.entropy(observations)
    }
}
