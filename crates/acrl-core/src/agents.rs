use crate::{
    distributions::Actor,
    utils::{path::Path, replay_buffer::Batch},
};
use anyhow::Result;
use std::fmt::Debug;

pub trait Agent {
    /// The acting policy
    type Actor: Actor;

    /// Whatever a single training step reports back (losses, mostly)
    type Log: Debug;

    /// Retrieves the policy used to collect rollouts
    fn actor(&self) -> &Self::Actor;

    /// Runs one update on a batch of flattened transitions
    fn train(&mut self, batch: Batch<TensorOfAgent<Self>>) -> Result<Self::Log>;

    fn add_to_replay_buffer(&mut self, paths: Vec<Path<TensorOfAgent<Self>>>);

    /// The most recent `batch_size` transitions of the replay buffer
    fn sample(&self, batch_size: usize) -> Result<Batch<TensorOfAgent<Self>>>;
}

pub type TensorOfAgent<A> = <<A as Agent>::Actor as Actor>::Tensor;
