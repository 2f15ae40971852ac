use crate::{distributions::Actor, env::Env, error::AcrlError, rng::RNG};
use anyhow::Result;
use rand::Rng;

/// One rollout. All vectors have the same length, `next_observations[i]` is the observation that
/// followed `actions[i]`.
#[derive(Debug, Clone)]
pub struct Path<T: Clone> {
    pub observations: Vec<T>,
    pub actions: Vec<T>,
    pub rewards: Vec<f32>,
    pub next_observations: Vec<T>,
    pub terminals: Vec<bool>,
}

impl<T: Clone> Default for Path<T> {
    fn default() -> Self {
        Self {
            observations: vec![],
            actions: vec![],
            rewards: vec![],
            next_observations: vec![],
            terminals: vec![],
        }
    }
}

impl<T: Clone> Path<T> {
    pub fn push_step(
        &mut self,
        observation: T,
        action: T,
        reward: f32,
        next_observation: T,
        terminal: bool,
    ) {
        self.observations.push(observation);
        self.actions.push(action);
        self.rewards.push(reward);
        self.next_observations.push(next_observation);
        self.terminals.push(terminal);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }
}

/// Runs a single episode. The last recorded step is always marked terminal, even when the
/// episode was cut at `max_path_length`.
pub fn sample_trajectory<E, A>(
    env: &mut E,
    actor: &A,
    max_path_length: usize,
) -> Result<Path<E::Tensor>>
where
    E: Env,
    A: Actor<Tensor = E::Tensor>,
{
    if max_path_length == 0 {
        return Err(AcrlError::InvalidParameter {
            name: "max_path_length",
            reason: "a rollout needs at least one step".into(),
        }
        .into());
    }
    let seed = RNG.with_borrow_mut(|rng| rng.random::<u64>());
    let mut observation = env.reset(seed)?;
    let mut path = Path::default();
    loop {
        let action = actor.get_action(&observation)?;
        let snapshot = env.step(&action)?;
        let rollout_done = snapshot.done() || path.len() + 1 >= max_path_length;
        path.push_step(
            observation,
            action,
            snapshot.reward,
            snapshot.state.clone(),
            rollout_done,
        );
        if rollout_done {
            break;
        }
        observation = snapshot.state;
    }
    Ok(path)
}

/// Collects whole episodes until at least `min_timesteps` transitions were gathered. Returns the
/// paths together with the number of environment steps taken.
pub fn sample_trajectories<E, A>(
    env: &mut E,
    actor: &A,
    min_timesteps: usize,
    max_path_length: usize,
) -> Result<(Vec<Path<E::Tensor>>, usize)>
where
    E: Env,
    A: Actor<Tensor = E::Tensor>,
{
    let mut timesteps_this_batch = 0;
    let mut paths = vec![];
    while timesteps_this_batch < min_timesteps {
        let path = sample_trajectory(env, actor, max_path_length)?;
        timesteps_this_batch += path.len();
        paths.push(path);
    }
    Ok((paths, timesteps_this_batch))
}

pub fn sample_n_trajectories<E, A>(
    env: &mut E,
    actor: &A,
    n: usize,
    max_path_length: usize,
) -> Result<Vec<Path<E::Tensor>>>
where
    E: Env,
    A: Actor<Tensor = E::Tensor>,
{
    (0..n)
        .map(|_| sample_trajectory(env, actor, max_path_length))
        .collect()
}
