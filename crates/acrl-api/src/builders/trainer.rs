use crate::{builders::ac_agent::ACAgentBuilder, config::ExperimentConfig};
use acrl_agents::ac_agent::{ACAgent, ACTrainLog};
use acrl_core::{
    env::Env,
    rng,
    trainer::{DefaultTrainerHooks, LearningSchedule, Trainer, TrainerParams},
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use derive_more::{Deref, DerefMut};
use tracing::info;

pub type ACTrainer<E> = Trainer<E, ACAgent, DefaultTrainerHooks<ACTrainLog>>;

pub struct TrainerBuilder {
    pub device: Device,
    pub learning_schedule: LearningSchedule,
    pub params: TrainerParams,
    pub seed: Option<u64>,
}

impl Default for TrainerBuilder {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            learning_schedule: LearningSchedule::iteration_bound(100),
            params: TrainerParams::default(),
            seed: None,
        }
    }
}

impl TrainerBuilder {
    pub fn set_learning_schedule(&mut self, learning_schedule: LearningSchedule) {
        self.learning_schedule = learning_schedule;
    }
}

#[derive(Deref, DerefMut, Default)]
pub struct ACTrainerBuilder {
    #[deref]
    #[deref_mut]
    trainer_builder: TrainerBuilder,
    pub agent_builder: ACAgentBuilder,
}

impl ACTrainerBuilder {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            trainer_builder: TrainerBuilder {
                learning_schedule: LearningSchedule::iteration_bound(config.training.n_iter),
                params: config.training.trainer_params(),
                seed: Some(config.training.seed),
                ..Default::default()
            },
            agent_builder: ACAgentBuilder::new(config.agent.clone()),
        }
    }

    pub fn build<E: Env<Tensor = Tensor>>(&self, env: E) -> Result<ACTrainer<E>> {
        if let Some(seed) = self.seed {
            rng::seed(seed);
        }
        let env_description = env.env_description();
        info!(
            observation_size = env_description.observation_size(),
            action_size = env_description.action_size(),
            discrete = env_description.is_discrete(),
            "building actor-critic trainer"
        );
        let agent = self.agent_builder.build(&env_description, &self.device)?;
        let hooks = DefaultTrainerHooks::new(self.learning_schedule);
        Ok(Trainer::new(env, agent, hooks, self.params.clone()))
    }
}
