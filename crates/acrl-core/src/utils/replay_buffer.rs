use crate::{error::AcrlError, rng::RNG, utils::path::Path};
use anyhow::Result;
use rand::seq::index;

pub const DEFAULT_MAX_SIZE: usize = 1_000_000;

/// Flattened transitions, as consumed by an agent update.
#[derive(Debug, Clone)]
pub struct Batch<T: Clone> {
    pub observations: Vec<T>,
    pub actions: Vec<T>,
    pub rewards: Vec<f32>,
    pub next_observations: Vec<T>,
    pub terminals: Vec<bool>,
}

impl<T: Clone> Batch<T> {
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Append-only list of rollouts that forgets everything older than `max_size` transitions.
#[derive(Debug, Clone)]
pub struct ReplayBuffer<T: Clone> {
    max_size: usize,
    paths: Vec<Path<T>>,
    observations: Vec<T>,
    actions: Vec<T>,
    rewards: Vec<f32>,
    next_observations: Vec<T>,
    terminals: Vec<bool>,
}

impl<T: Clone> Default for ReplayBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl<T: Clone> ReplayBuffer<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            paths: vec![],
            observations: vec![],
            actions: vec![],
            rewards: vec![],
            next_observations: vec![],
            terminals: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn paths(&self) -> &[Path<T>] {
        &self.paths
    }

    pub fn add_rollouts(&mut self, paths: Vec<Path<T>>) {
        for path in paths {
            self.observations.extend_from_slice(&path.observations);
            self.actions.extend_from_slice(&path.actions);
            self.rewards.extend_from_slice(&path.rewards);
            self.next_observations
                .extend_from_slice(&path.next_observations);
            self.terminals.extend_from_slice(&path.terminals);
            self.paths.push(path);
        }
        self.truncate_front();
    }

    fn truncate_front(&mut self) {
        let overflow = self.len().saturating_sub(self.max_size);
        if overflow > 0 {
            self.observations.drain(..overflow);
            self.actions.drain(..overflow);
            self.rewards.drain(..overflow);
            self.next_observations.drain(..overflow);
            self.terminals.drain(..overflow);
        }
        // whole paths are dropped once the remaining ones already hold `max_size` transitions
        let mut path_steps: usize = self.paths.iter().map(Path::len).sum();
        let mut drop_paths = 0;
        for path in self.paths.iter() {
            if path_steps - path.len() < self.max_size {
                break;
            }
            path_steps -= path.len();
            drop_paths += 1;
        }
        self.paths.drain(..drop_paths);
    }

    fn gather(&self, indices: impl Iterator<Item = usize> + Clone) -> Batch<T> {
        Batch {
            observations: indices.clone().map(|i| self.observations[i].clone()).collect(),
            actions: indices.clone().map(|i| self.actions[i].clone()).collect(),
            rewards: indices.clone().map(|i| self.rewards[i]).collect(),
            next_observations: indices
                .clone()
                .map(|i| self.next_observations[i].clone())
                .collect(),
            terminals: indices.map(|i| self.terminals[i]).collect(),
        }
    }

    /// The last `batch_size` transitions in insertion order. Asking for more than what is
    /// stored returns everything.
    pub fn sample_recent_data(&self, batch_size: usize) -> Result<Batch<T>> {
        if self.is_empty() {
            return Err(AcrlError::EmptyReplayBuffer.into());
        }
        let start = self.len().saturating_sub(batch_size);
        Ok(self.gather(start..self.len()))
    }

    /// The most recent whole paths, oldest first, covering at least `batch_size` transitions when
    /// the buffer holds that many.
    pub fn sample_recent_paths(&self, batch_size: usize) -> Result<Vec<Path<T>>> {
        if self.paths.is_empty() {
            return Err(AcrlError::EmptyReplayBuffer.into());
        }
        let mut covered = 0;
        let mut start = self.paths.len();
        while start > 0 && covered < batch_size {
            start -= 1;
            covered += self.paths[start].len();
        }
        Ok(self.paths[start..].to_vec())
    }

    /// Uniformly samples `batch_size` distinct transitions.
    pub fn sample_random_data(&self, batch_size: usize) -> Result<Batch<T>> {
        if self.is_empty() {
            return Err(AcrlError::EmptyReplayBuffer.into());
        }
        let amount = batch_size.min(self.len());
        let indices = RNG.with_borrow_mut(|rng| index::sample(rng, self.len(), amount).into_vec());
        Ok(self.gather(indices.into_iter()))
    }
}
