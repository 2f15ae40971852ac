use super::as_batch;
use crate::thread_safe_sequential::{ThreadSafeSequential, build_mlp};
use acrl_core::{
    distributions::{Actor, Policy},
    rng::RNG,
};
use anyhow::Result;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{
    Activation, VarBuilder,
    ops::{log_softmax, softmax},
};
use rand::distr::{Distribution as RandDistribution, weighted::WeightedIndex};

/// Discrete policy. Actions are `u32` indices into the logits.
#[derive(Clone, Debug)]
pub struct CategoricalDistribution {
    action_size: usize,
    logits: ThreadSafeSequential,
    device: Device,
}

impl CategoricalDistribution {
    pub fn new(action_size: usize, logits: ThreadSafeSequential, device: Device) -> Self {
        Self {
            action_size,
            logits,
            device,
        }
    }

    pub fn build(
        observation_size: usize,
        action_size: usize,
        n_layers: usize,
        size: usize,
        vb: &VarBuilder,
        device: Device,
    ) -> Result<Self> {
        let logits = build_mlp(
            observation_size,
            action_size,
            n_layers,
            size,
            Activation::Tanh,
            vb,
            "logits",
        )?;
        Ok(Self::new(action_size, logits, device))
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    pub fn logits(&self, observations: &Tensor) -> Result<Tensor> {
        Ok(self.logits.forward(observations)?)
    }
}

impl Actor for CategoricalDistribution {
    type Tensor = Tensor;

    fn get_action(&self, observation: &Tensor) -> Result<Tensor> {
        let (observations, single) = as_batch(observation)?;
        let action_probs: Vec<Vec<f32>> = softmax(&self.logits(&observations)?, 1)?.to_vec2()?;
        let actions = action_probs
            .iter()
            .map(|probs| {
                let distribution = WeightedIndex::new(probs)?;
                Ok(RNG.with_borrow_mut(|rng| distribution.sample(rng)) as u32)
            })
            .collect::<Result<Vec<u32>>>()?;
        let batch_size = actions.len();
        let actions = Tensor::from_vec(actions, batch_size, &self.device)?;
        if single {
            Ok(actions.squeeze(0)?)
        } else {
            Ok(actions)
        }
    }
}

impl Policy for CategoricalDistribution {
    fn log_probs(&self, observations: &Tensor, actions: &Tensor) -> Result<Tensor> {
        let log_probs = log_softmax(&self.logits(observations)?, 1)?;
        let actions = actions.to_dtype(DType::U32)?.flatten_all()?.unsqueeze(1)?;
        Ok(log_probs.gather(&actions, 1)?.squeeze(1)?)
    }

    fn entropy(&self, observations: &Tensor) -> Result<Tensor> {
        let logits = self.logits(observations)?;
        let probs = softmax(&logits, 1)?;
        let log_probs = log_softmax(&logits, 1)?;
        Ok(probs.mul(&log_probs)?.sum(1)?.neg()?.mean_all()?)
    }
}

#[cfg(test)]
mod test {
    use super::CategoricalDistribution;
    use crate::thread_safe_sequential::{ThreadSafeLayer, ThreadSafeSequential};
    use acrl_core::distributions::{Actor, Policy};
    use anyhow::Result;
    use candle_core::{DType, Device, Tensor};
    use candle_nn::Linear;

    // logits are the observation itself
    fn identity_distribution(device: &Device) -> Result<CategoricalDistribution> {
        let weight = Tensor::eye(3, DType::F32, device)?;
        let logits = ThreadSafeSequential::default()
            .add_layer(ThreadSafeLayer::linear(Linear::new(weight, None)));
        Ok(CategoricalDistribution::new(3, logits, device.clone()))
    }

    #[test]
    fn single_observation_gives_scalar_action() -> Result<()> {
        let device = Device::Cpu;
        let dist = identity_distribution(&device)?;
        let observation = Tensor::new(&[0f32, 0., 0.], &device)?;
        let action = dist.get_action(&observation)?;
        assert_eq!(action.rank(), 0);
        assert!(action.to_scalar::<u32>()? < 3);
        let observations = Tensor::zeros((5, 3), DType::F32, &device)?;
        assert_eq!(dist.get_action(&observations)?.dims(), &[5]);
        Ok(())
    }

    #[test]
    fn dominant_logit_is_always_sampled() -> Result<()> {
        let device = Device::Cpu;
        let dist = identity_distribution(&device)?;
        let observations = Tensor::new(&[[0f32, 50., 0.], [0., 0., 50.]], &device)?;
        for _ in 0..10 {
            let actions: Vec<u32> = dist.get_action(&observations)?.to_vec1()?;
            assert_eq!(actions, vec![1, 2]);
        }
        Ok(())
    }

    #[test]
    fn log_probs_match_log_softmax() -> Result<()> {
        let device = Device::Cpu;
        let dist = identity_distribution(&device)?;
        let observations = Tensor::new(&[[0f32, 0., 0.], [2f32.ln(), 0., 0.]], &device)?;
        let actions = Tensor::new(&[1u32, 0], &device)?;
        let log_probs: Vec<f32> = dist.log_probs(&observations, &actions)?.to_vec1()?;
        assert!((log_probs[0] - (1f32 / 3.).ln()).abs() < 1e-5);
        assert!((log_probs[1] - 0.5f32.ln()).abs() < 1e-5);
        let entropy = dist
            .entropy(&observations.narrow(0, 0, 1)?)?
            .to_scalar::<f32>()?;
        assert!((entropy - 3f32.ln()).abs() < 1e-5);
        Ok(())
    }
}
