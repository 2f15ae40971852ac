pub mod categorical_distribution;
pub mod diagonal_distribution;

use acrl_core::distributions::{Actor, Policy};
use anyhow::Result;
use candle_core::Tensor;
use categorical_distribution::CategoricalDistribution;
use diagonal_distribution::DiagGaussianDistribution;

/// Unsqueezes a single observation into a batch of one. The flag tells whether the batch
/// dimension has to be removed from the result again.
pub(crate) fn as_batch(observation: &Tensor) -> Result<(Tensor, bool)> {
    match observation.rank() {
        1 => Ok((observation.unsqueeze(0)?, true)),
        2 => Ok((observation.clone(), false)),
        rank => anyhow::bail!("observations must have rank 1 or 2, got rank {rank}"),
    }
}

#[derive(Debug, Clone)]
pub enum DistributionKind {
    Categorical(CategoricalDistribution),
    DiagGaussian(DiagGaussianDistribution),
}

impl Actor for DistributionKind {
    type Tensor = Tensor;

    fn get_action(&self, observation: &Tensor) -> Result<Tensor> {
        match self {
            Self::Categorical(cat) => cat.get_action(observation),
            Self::DiagGaussian(diag) => diag.get_action(observation),
        }
    }
}

impl Policy for DistributionKind {
    fn log_probs(&self, observations: &Tensor, actions: &Tensor) -> Result<Tensor> {
        match self {
            Self::Categorical(cat) => cat.log_probs(observations, actions),
            Self::DiagGaussian(diag) => diag.log_probs(observations, actions),
        }
    }

    fn entropy(&self, observations: &Tensor) -> Result<Tensor> {
        match self {
            Self::Categorical(cat) => cat.entropy(observations),
            Self::DiagGaussian(diag) => diag.entropy(observations),
        }
    }
}
