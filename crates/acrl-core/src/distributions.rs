use anyhow::Result;

/// Anything that can act in an environment.
pub trait Actor {
    type Tensor: Clone;

    /// Queries the actor with a single observation (rank 1) or a batch of observations (rank 2).
    /// A single observation yields a single action, a batch yields a batch of actions.
    fn get_action(&self, observation: &Self::Tensor) -> Result<Self::Tensor>;
}

/// A stochastic actor whose log likelihoods can be differentiated.
pub trait Policy: Actor {
    /// One log probability per row of `observations`/`actions`.
    fn log_probs(
        &self,
        observations: &Self::Tensor,
        actions: &Self::Tensor,
    ) -> Result<Self::Tensor>;

    fn entropy(&self, observations: &Self::Tensor) -> Result<Self::Tensor>;
}
