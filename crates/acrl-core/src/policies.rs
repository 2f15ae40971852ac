use anyhow::Result;

/// State value estimator V(s).
pub trait ValueFunction {
    type Tensor;

    /// Returns a tensor of shape `[N]` for `N` stacked observations.
    fn calculate_values(&self, observations: &Self::Tensor) -> Result<Self::Tensor>;
}

/// State-action value estimator Q(s, ·).
pub trait QValues {
    type Tensor;

    /// Returns a tensor of shape `[N, n_actions]` for `N` stacked observations.
    fn qa_values(&self, observations: &Self::Tensor) -> Result<Self::Tensor>;
}

// convinience trait
pub trait LearningModule {
    type Losses;

    fn update(&mut self, losses: Self::Losses) -> Result<()>;
}
