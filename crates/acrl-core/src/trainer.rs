use crate::{
    Algorithm,
    agents::{Agent, TensorOfAgent},
    distributions::Actor,
    env::Env,
    utils::{path::Path, path::sample_trajectories, stats::mean_std},
};
use anyhow::Result;
use std::{fmt::Debug, marker::PhantomData};
use tracing::info;

macro_rules! break_on_hook_res {
    ($hook_res:expr) => {
        if $hook_res {
            break;
        }
    };
}

#[derive(Debug, Clone)]
pub struct TrainerParams {
    /// Env steps collected before the very first update
    pub batch_size_initial: usize,
    /// Env steps collected on every later iteration
    pub batch_size: usize,
    /// Transitions handed to each `Agent::train` call
    pub train_batch_size: usize,
    pub num_agent_train_steps_per_iter: usize,
    /// Maximum episode length
    pub ep_len: usize,
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self {
            batch_size_initial: 1000,
            batch_size: 1000,
            train_batch_size: 1000,
            num_agent_train_steps_per_iter: 1,
            ep_len: 200,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LearningSchedule {
    IterationBound {
        total_iterations: usize,
        current_iteration: usize,
    },
    TotalStepBound {
        total_steps: usize,
        current_step: usize,
    },
}

impl LearningSchedule {
    pub fn iteration_bound(total_iterations: usize) -> Self {
        Self::IterationBound {
            total_iterations,
            current_iteration: 0,
        }
    }

    pub fn total_step_bound(total_steps: usize) -> Self {
        Self::TotalStepBound {
            total_steps,
            current_step: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        match self {
            Self::IterationBound {
                total_iterations,
                current_iteration,
            } => current_iteration >= total_iterations,
            Self::TotalStepBound {
                total_steps,
                current_step,
            } => current_step >= total_steps,
        }
    }

    /// Records a finished collection phase of `steps` env steps.
    fn record_collection(&mut self, steps: usize) {
        match self {
            Self::IterationBound {
                current_iteration, ..
            } => *current_iteration += 1,
            Self::TotalStepBound { current_step, .. } => *current_step += steps,
        }
    }
}

/// Every hook returning `true` stops the training loop.
pub trait TrainerHooks<T: Clone, L> {
    fn init_hook(&mut self) -> bool;

    fn post_collection_hook(&mut self, paths: &[Path<T>], env_steps: usize) -> bool;

    fn post_training_hook(&mut self, logs: &[L]) -> bool;

    fn shutdown_hook(&mut self) -> Result<()>;
}

/// Logs progress and stops the loop right after the training phase that exhausts the schedule,
/// so no rollouts are collected past it.
pub struct DefaultTrainerHooks<L> {
    iteration: usize,
    total_env_steps: usize,
    learning_schedule: LearningSchedule,
    _log: PhantomData<L>,
}

impl<L> DefaultTrainerHooks<L> {
    pub fn new(learning_schedule: LearningSchedule) -> Self {
        Self {
            iteration: 0,
            total_env_steps: 0,
            learning_schedule,
            _log: PhantomData,
        }
    }
}

impl<T: Clone, L: Debug> TrainerHooks<T, L> for DefaultTrainerHooks<L> {
    fn init_hook(&mut self) -> bool {
        self.learning_schedule.is_exhausted()
    }

    fn post_collection_hook(&mut self, paths: &[Path<T>], env_steps: usize) -> bool {
        self.learning_schedule.record_collection(env_steps);
        self.total_env_steps += env_steps;
        let returns: Vec<f32> = paths.iter().map(Path::total_reward).collect();
        let ep_lens: Vec<f32> = paths.iter().map(|p| p.len() as f32).collect();
        let (average_return, std_return) = mean_std(&returns);
        let (average_ep_len, _) = mean_std(&ep_lens);
        info!(
            iteration = self.iteration,
            episodes = paths.len(),
            env_steps_so_far = self.total_env_steps,
            average_return,
            std_return,
            max_return = returns.iter().cloned().fold(f32::MIN, f32::max),
            min_return = returns.iter().cloned().fold(f32::MAX, f32::min),
            average_ep_len,
            "collected rollouts"
        );
        false
    }

    fn post_training_hook(&mut self, logs: &[L]) -> bool {
        if let Some(log) = logs.last() {
            info!(iteration = self.iteration, "trained: {log:?}");
        }
        self.iteration += 1;
        self.learning_schedule.is_exhausted()
    }

    fn shutdown_hook(&mut self) -> Result<()> {
        info!(
            iterations = self.iteration,
            env_steps = self.total_env_steps,
            "training finished"
        );
        Ok(())
    }
}

/// Alternates between collecting rollouts with the agent's actor and updating the agent on the
/// most recent transitions of its replay buffer.
pub struct Trainer<E: Env, A: Agent, H: TrainerHooks<TensorOfAgent<A>, A::Log>> {
    pub env: E,
    pub agent: A,
    pub hooks: H,
    pub params: TrainerParams,
}

impl<E, A, H> Trainer<E, A, H>
where
    E: Env,
    A: Agent,
    A::Actor: Actor<Tensor = E::Tensor>,
    H: TrainerHooks<TensorOfAgent<A>, A::Log>,
{
    pub fn new(env: E, agent: A, hooks: H, params: TrainerParams) -> Self {
        Self {
            env,
            agent,
            hooks,
            params,
        }
    }

    fn training_step(&mut self) -> Result<Vec<A::Log>> {
        (0..self.params.num_agent_train_steps_per_iter)
            .map(|_| {
                let batch = self.agent.sample(self.params.train_batch_size)?;
                self.agent.train(batch)
            })
            .collect()
    }
}

impl<E, A, H> Algorithm for Trainer<E, A, H>
where
    E: Env,
    A: Agent,
    A::Actor: Actor<Tensor = E::Tensor>,
    H: TrainerHooks<TensorOfAgent<A>, A::Log>,
{
    fn train(&mut self) -> Result<()> {
        if self.hooks.init_hook() {
            return Ok(());
        }
        let mut first_iteration = true;
        loop {
            // collection phase
            let batch_size = if first_iteration {
                self.params.batch_size_initial
            } else {
                self.params.batch_size
            };
            first_iteration = false;
            let (paths, env_steps) = sample_trajectories(
                &mut self.env,
                self.agent.actor(),
                batch_size,
                self.params.ep_len,
            )?;
            break_on_hook_res!(self.hooks.post_collection_hook(&paths, env_steps));
            self.agent.add_to_replay_buffer(paths);

            // learning phase
            let logs = self.training_step()?;
            break_on_hook_res!(self.hooks.post_training_hook(&logs));
        }
        self.hooks.shutdown_hook()
    }
}

#[cfg(test)]
mod test {
    use super::LearningSchedule;

    #[test]
    fn iteration_bound_runs_the_requested_iterations() {
        let mut schedule = LearningSchedule::iteration_bound(3);
        let exhausted: Vec<bool> = (0..3)
            .map(|_| {
                schedule.record_collection(10);
                schedule.is_exhausted()
            })
            .collect();
        assert_eq!(exhausted, vec![false, false, true]);
        assert!(LearningSchedule::iteration_bound(0).is_exhausted());
    }

    #[test]
    fn step_bound_stops_after_enough_steps() {
        let mut schedule = LearningSchedule::total_step_bound(25);
        assert!(!schedule.is_exhausted());
        let exhausted: Vec<bool> = (0..3)
            .map(|_| {
                schedule.record_collection(10);
                schedule.is_exhausted()
            })
            .collect();
        assert_eq!(exhausted, vec![false, false, true]);
    }
}
