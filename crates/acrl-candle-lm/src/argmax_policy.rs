use crate::{
    distributions::as_batch,
    thread_safe_sequential::{ThreadSafeSequential, build_mlp},
};
use acrl_core::{distributions::Actor, policies::QValues};
use anyhow::Result;
use candle_core::{Module, Tensor};
use candle_nn::{Activation, VarBuilder};

/// Greedy policy over a Q function: picks `argmax_a Q(s, a)`.
#[derive(Debug, Clone)]
pub struct ArgMaxPolicy<C> {
    critic: C,
}

impl<C: QValues<Tensor = Tensor>> ArgMaxPolicy<C> {
    pub fn new(critic: C) -> Self {
        Self { critic }
    }

    pub fn critic(&self) -> &C {
        &self.critic
    }
}

impl<C: QValues<Tensor = Tensor>> Actor for ArgMaxPolicy<C> {
    type Tensor = Tensor;

    fn get_action(&self, observation: &Tensor) -> Result<Tensor> {
        let (observations, single) = as_batch(observation)?;
        let actions = self.critic.qa_values(&observations)?.argmax(1)?;
        if single {
            Ok(actions.squeeze(0)?)
        } else {
            Ok(actions)
        }
    }
}

/// Q network mapping an observation to one value per discrete action.
#[derive(Debug, Clone)]
pub struct SequentialQFunction {
    q_net: ThreadSafeSequential,
}

impl SequentialQFunction {
    pub fn new(q_net: ThreadSafeSequential) -> Self {
        Self { q_net }
    }

    pub fn build(
        observation_size: usize,
        action_size: usize,
        n_layers: usize,
        size: usize,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let q_net = build_mlp(
            observation_size,
            action_size,
            n_layers,
            size,
            Activation::Relu,
            vb,
            "q",
        )?;
        Ok(Self::new(q_net))
    }
}

impl QValues for SequentialQFunction {
    type Tensor = Tensor;

    fn qa_values(&self, observations: &Tensor) -> Result<Tensor> {
        Ok(self.q_net.forward(observations)?)
    }
}
