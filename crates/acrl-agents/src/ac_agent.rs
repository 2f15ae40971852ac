use crate::hooks::{ACHooks, DefaultACHooks, HookResult};
use acrl_candle_lm::{
    critic::{BootstrappedContinuousCritic, bootstrapped_targets},
    policy::MlpPolicy,
    tensors::Advantages,
};
use acrl_core::{
    agents::Agent,
    error::AcrlError,
    utils::{
        path::Path,
        replay_buffer::{Batch, ReplayBuffer},
        stats::{mean_std, standardize},
    },
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use tracing::debug;

/// Update settings of `ACAgent`. The discount lives in the critic, see
/// `BootstrappedContinuousCritic::gamma`.
#[derive(Debug, Clone)]
pub struct ACParams {
    pub standardize_advantages: bool,
    pub num_critic_updates_per_agent_update: usize,
    pub num_actor_updates_per_agent_update: usize,
}

impl Default for ACParams {
    fn default() -> Self {
        Self {
            standardize_advantages: true,
            num_critic_updates_per_agent_update: 1,
            num_actor_updates_per_agent_update: 1,
        }
    }
}

/// Mean losses of one `ACAgent::train` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ACTrainLog {
    pub critic_loss: f32,
    pub actor_loss: f32,
}

/// A `Batch` stacked into tensors of leading dimension `N`.
pub struct BatchTensors {
    pub observations: Tensor,
    pub actions: Tensor,
    pub rewards: Tensor,
    pub next_observations: Tensor,
    pub terminals: Tensor,
}

impl BatchTensors {
    pub fn from_batch(batch: &Batch<Tensor>, device: &Device) -> Result<Self> {
        let n = batch.len();
        anyhow::ensure!(n > 0, "cannot train on an empty batch");
        for (context, actual) in [
            ("observations", batch.observations.len()),
            ("actions", batch.actions.len()),
            ("next_observations", batch.next_observations.len()),
            ("terminals", batch.terminals.len()),
        ] {
            if actual != n {
                return Err(AcrlError::ShapeMismatch {
                    context,
                    expected: n,
                    actual,
                }
                .into());
            }
        }
        let terminals: Vec<f32> = batch
            .terminals
            .iter()
            .map(|terminal| if *terminal { 1. } else { 0. })
            .collect();
        Ok(Self {
            observations: Tensor::stack(&batch.observations, 0)?,
            actions: Tensor::stack(&batch.actions, 0)?,
            rewards: Tensor::from_slice(&batch.rewards, n, device)?,
            next_observations: Tensor::stack(&batch.next_observations, 0)?,
            terminals: Tensor::from_vec(terminals, n, device)?,
        })
    }
}

pub struct ACAgent {
    actor: MlpPolicy,
    critic: BootstrappedContinuousCritic,
    replay_buffer: ReplayBuffer<Tensor>,
    params: ACParams,
    hooks: Box<dyn ACHooks>,
    device: Device,
}

impl ACAgent {
    pub fn new(
        actor: MlpPolicy,
        critic: BootstrappedContinuousCritic,
        params: ACParams,
        device: Device,
    ) -> Self {
        Self {
            actor,
            critic,
            replay_buffer: ReplayBuffer::default(),
            params,
            hooks: Box::new(DefaultACHooks),
            device,
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn ACHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_replay_buffer(mut self, replay_buffer: ReplayBuffer<Tensor>) -> Self {
        self.replay_buffer = replay_buffer;
        self
    }

    pub fn critic(&self) -> &BootstrappedContinuousCritic {
        &self.critic
    }

    pub fn params(&self) -> &ACParams {
        &self.params
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer<Tensor> {
        &self.replay_buffer
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// `A(s, a) = r + gamma * V(s') * (1 - terminal) - V(s)` with the critic's `gamma`, optionally
    /// standardized. Critic values are detached, the actor update does not backpropagate into the
    /// critic.
    pub fn estimate_advantage(
        &self,
        observations: &Tensor,
        next_observations: &Tensor,
        rewards: &Tensor,
        terminals: &Tensor,
    ) -> Result<Advantages> {
        let values = self.critic.forward(observations)?.detach();
        let next_values = self.critic.forward(next_observations)?.detach();
        let q_values =
            bootstrapped_targets(rewards, &next_values, terminals, self.critic.gamma())?;
        let advantages = q_values.sub(&values)?;
        if !self.params.standardize_advantages {
            return Ok(Advantages(advantages));
        }
        let standardized = standardize(&advantages.to_vec1::<f32>()?);
        let n = standardized.len();
        Ok(Advantages(Tensor::from_vec(standardized, n, &self.device)?))
    }

    fn update_critic(&mut self, batch: &BatchTensors) -> Result<Vec<f32>> {
        (0..self.params.num_critic_updates_per_agent_update)
            .map(|_| {
                self.critic.update(
                    &batch.observations,
                    &batch.next_observations,
                    &batch.rewards,
                    &batch.terminals,
                )
            })
            .collect()
    }

    fn update_actor(&mut self, batch: &BatchTensors, advantages: &Advantages) -> Result<Vec<f32>> {
        (0..self.params.num_actor_updates_per_agent_update)
            .map(|_| {
                self.actor
                    .update(&batch.observations, &batch.actions, advantages)
            })
            .collect()
    }
}

impl Agent for ACAgent {
    type Actor = MlpPolicy;
    type Log = ACTrainLog;

    fn actor(&self) -> &Self::Actor {
        &self.actor
    }

    fn train(&mut self, batch: Batch<Tensor>) -> Result<ACTrainLog> {
        let batch = BatchTensors::from_batch(&batch, &self.device)?;
        let critic_losses = self.update_critic(&batch)?;
        let mut advantages = self.estimate_advantage(
            &batch.observations,
            &batch.next_observations,
            &batch.rewards,
            &batch.terminals,
        )?;
        let actor_losses = match self
            .hooks
            .after_advantage_hook(&batch.observations, &mut advantages)?
        {
            HookResult::Continue => self.update_actor(&batch, &advantages)?,
            HookResult::Break => vec![],
        };
        let log = ACTrainLog {
            critic_loss: mean_std(&critic_losses).0,
            actor_loss: mean_std(&actor_losses).0,
        };
        debug!(
            critic_loss = log.critic_loss,
            actor_loss = log.actor_loss,
            "actor-critic update"
        );
        Ok(log)
    }

    fn add_to_replay_buffer(&mut self, paths: Vec<Path<Tensor>>) {
        self.replay_buffer.add_rollouts(paths);
    }

    fn sample(&self, batch_size: usize) -> Result<Batch<Tensor>> {
        self.replay_buffer.sample_recent_data(batch_size)
    }
}
