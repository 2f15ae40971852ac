pub mod agents;
pub mod distributions;
pub mod env;
pub mod error;
pub mod policies;
pub mod rng;
pub mod trainer;
pub mod utils;

use anyhow::Result;

/// A learning algorithm. `Trainer` is the only implementor: it alternates between
/// collecting rollouts and updating the agent from its replay buffer.
pub trait Algorithm {
    fn train(&mut self) -> Result<()>;
}
