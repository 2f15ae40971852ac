use acrl_candle_lm::tensors::Advantages;
use anyhow::Result;
use candle_core::Tensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    Continue,
    Break,
}

/// Observation points inside `ACAgent::train`.
pub trait ACHooks {
    /// Called with the freshly estimated advantages, before the actor updates. Returning
    /// `HookResult::Break` skips the actor updates of this training step.
    fn after_advantage_hook(
        &mut self,
        observations: &Tensor,
        advantages: &mut Advantages,
    ) -> Result<HookResult>;
}

pub struct DefaultACHooks;

impl ACHooks for DefaultACHooks {
    fn after_advantage_hook(
        &mut self,
        _observations: &Tensor,
        _advantages: &mut Advantages,
    ) -> Result<HookResult> {
        Ok(HookResult::Continue)
    }
}
