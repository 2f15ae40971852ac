use crate::config::AgentConfig;
use acrl_agents::ac_agent::{ACAgent, ACParams};
use acrl_candle_lm::{
    critic::{BootstrappedContinuousCritic, CriticParams},
    policy::{MlpPolicy, MlpPolicyParams},
};
use acrl_core::{env::EnvironmentDescription, utils::replay_buffer::ReplayBuffer};
use anyhow::Result;
use candle_core::{Device, Tensor};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ACAgentBuilder {
    pub config: AgentConfig,
}

impl ACAgentBuilder {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn policy_params<T>(
        &self,
        env_description: &EnvironmentDescription<T>,
    ) -> MlpPolicyParams {
        MlpPolicyParams {
            ac_dim: env_description.action_size(),
            ob_dim: env_description.observation_size(),
            n_layers: self.config.n_layers,
            size: self.config.size,
            discrete: self
                .config
                .discrete
                .unwrap_or_else(|| env_description.is_discrete()),
            learning_rate: self.config.learning_rate,
            max_grad_norm: self.config.max_grad_norm,
        }
    }

    pub fn critic_params<T>(&self, env_description: &EnvironmentDescription<T>) -> CriticParams {
        CriticParams {
            ob_dim: env_description.observation_size(),
            n_layers: self.config.n_layers,
            size: self.config.size,
            learning_rate: self.config.learning_rate,
            gamma: self.config.gamma,
            num_target_updates: self.config.num_target_updates,
            num_grad_steps_per_target_update: self.config.num_grad_steps_per_target_update,
            max_grad_norm: self.config.max_grad_norm,
        }
    }

    pub fn build(
        &self,
        env_description: &EnvironmentDescription<Tensor>,
        device: &Device,
    ) -> Result<ACAgent> {
        self.config.validate()?;
        let policy_params = self.policy_params(env_description);
        debug!(?policy_params, "building actor");
        let actor = MlpPolicy::build(&policy_params, device)?;
        let critic =
            BootstrappedContinuousCritic::build(&self.critic_params(env_description), device)?;
        let params = ACParams {
            standardize_advantages: self.config.standardize_advantages,
            num_critic_updates_per_agent_update: self.config.num_critic_updates_per_agent_update,
            num_actor_updates_per_agent_update: self.config.num_actor_updates_per_agent_update,
        };
        Ok(ACAgent::new(actor, critic, params, device.clone())
            .with_replay_buffer(ReplayBuffer::new(self.config.replay_buffer_size)))
    }
}
