use acrl_core::{
    Algorithm,
    agents::Agent,
    distributions::Actor,
    env::{Env, EnvironmentDescription, SnapShot, Space},
    trainer::{DefaultTrainerHooks, LearningSchedule, Trainer, TrainerParams},
    utils::{
        path::Path,
        replay_buffer::{Batch, ReplayBuffer},
    },
};
use anyhow::Result;

// episodes always last `length` steps
struct FixedLengthEnv {
    length: usize,
    steps: usize,
    total_steps: usize,
}

impl FixedLengthEnv {
    fn new(length: usize) -> Self {
        Self {
            length,
            steps: 0,
            total_steps: 0,
        }
    }
}

impl Env for FixedLengthEnv {
    type Tensor = f32;

    fn reset(&mut self, _seed: u64) -> Result<f32> {
        self.steps = 0;
        Ok(0.)
    }

    fn step(&mut self, action: &f32) -> Result<SnapShot<f32>> {
        self.steps += 1;
        self.total_steps += 1;
        Ok(SnapShot {
            state: self.steps as f32,
            reward: *action,
            terminated: self.steps == self.length,
            trancuated: false,
        })
    }

    fn env_description(&self) -> EnvironmentDescription<f32> {
        EnvironmentDescription::new(
            Space::continous_from_dims(vec![1]),
            Space::continous_from_dims(vec![1]),
        )
    }
}

struct Constant;

impl Actor for Constant {
    type Tensor = f32;

    fn get_action(&self, _observation: &f32) -> Result<f32> {
        Ok(1.)
    }
}

#[derive(Default)]
struct RecordingAgent {
    replay_buffer: ReplayBuffer<f32>,
    trained_on: Vec<usize>,
}

impl Agent for RecordingAgent {
    type Actor = Constant;
    type Log = usize;

    fn actor(&self) -> &Constant {
        &Constant
    }

    fn train(&mut self, batch: Batch<f32>) -> Result<usize> {
        self.trained_on.push(batch.len());
        Ok(batch.len())
    }

    fn add_to_replay_buffer(&mut self, paths: Vec<Path<f32>>) {
        self.replay_buffer.add_rollouts(paths);
    }

    fn sample(&self, batch_size: usize) -> Result<Batch<f32>> {
        self.replay_buffer.sample_recent_data(batch_size)
    }
}

fn params() -> TrainerParams {
    TrainerParams {
        batch_size_initial: 12,
        batch_size: 7,
        train_batch_size: 4,
        num_agent_train_steps_per_iter: 2,
        ep_len: 100,
    }
}

#[test]
fn iteration_bound_training() -> Result<()> {
    let env = FixedLengthEnv::new(5);
    let hooks = DefaultTrainerHooks::new(LearningSchedule::iteration_bound(3));
    let mut trainer = Trainer::new(env, RecordingAgent::default(), hooks, params());
    trainer.train()?;
    // 15 steps in the first iteration, 10 in each later one
    assert_eq!(trainer.agent.replay_buffer.len(), 35);
    // every collected step ends up in the buffer
    assert_eq!(trainer.env.total_steps, 35);
    assert_eq!(trainer.agent.trained_on, vec![4; 6]);
    Ok(())
}

#[test]
fn step_bound_training() -> Result<()> {
    let env = FixedLengthEnv::new(5);
    let hooks = DefaultTrainerHooks::new(LearningSchedule::total_step_bound(20));
    let mut trainer = Trainer::new(env, RecordingAgent::default(), hooks, params());
    trainer.train()?;
    assert_eq!(trainer.agent.replay_buffer.len(), 25);
    assert_eq!(trainer.env.total_steps, 25);
    assert_eq!(trainer.agent.trained_on.len(), 4);
    Ok(())
}

#[test]
fn episodes_are_cut_at_ep_len() -> Result<()> {
    let env = FixedLengthEnv::new(50);
    let hooks = DefaultTrainerHooks::new(LearningSchedule::iteration_bound(1));
    let params = TrainerParams {
        ep_len: 3,
        ..params()
    };
    let mut trainer = Trainer::new(env, RecordingAgent::default(), hooks, params);
    trainer.train()?;
    assert_eq!(trainer.env.total_steps, 12);
    let paths = trainer.agent.replay_buffer.paths();
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().all(|path| path.len() == 3));
    assert!(paths.iter().all(|path| path.terminals == vec![false, false, true]));
    Ok(())
}

#[test]
fn large_batches_are_not_collected_past_the_schedule() -> Result<()> {
    let hooks = DefaultTrainerHooks::new(LearningSchedule::iteration_bound(3));
    let params = TrainerParams {
        batch_size_initial: 100,
        batch_size: 100,
        ..params()
    };
    let env = FixedLengthEnv::new(5);
    let mut trainer = Trainer::new(env, RecordingAgent::default(), hooks, params);
    trainer.train()?;
    assert_eq!(trainer.env.total_steps, 300);
    assert_eq!(trainer.agent.replay_buffer.len(), 300);
    assert_eq!(trainer.agent.trained_on.len(), 6);
    Ok(())
}

#[test]
fn exhausted_schedule_collects_nothing() -> Result<()> {
    let hooks = DefaultTrainerHooks::new(LearningSchedule::iteration_bound(0));
    let env = FixedLengthEnv::new(5);
    let mut trainer = Trainer::new(env, RecordingAgent::default(), hooks, params());
    trainer.train()?;
    assert_eq!(trainer.env.total_steps, 0);
    assert!(trainer.agent.trained_on.is_empty());
    Ok(())
}
