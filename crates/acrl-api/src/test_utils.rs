use acrl_core::env::{Env, EnvironmentDescription, SnapShot, Space};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A discrete corridor. The agent starts in cell 0 and is rewarded once it reaches the last cell,
/// which ends the episode. Action 1 moves right, every other action moves left. The corridor has
/// at least two cells.
pub struct ChainEnv {
    length: usize,
    position: usize,
    device: Device,
}

impl ChainEnv {
    pub fn new(length: usize) -> Result<Self> {
        anyhow::ensure!(length >= 2, "a chain needs at least two cells, got {length}");
        Ok(Self {
            length,
            position: 0,
            device: Device::Cpu,
        })
    }

    fn observation(&self) -> Result<Tensor> {
        let mut one_hot = vec![0f32; self.length];
        one_hot[self.position] = 1.;
        Ok(Tensor::from_vec(one_hot, self.length, &self.device)?)
    }
}

impl Env for ChainEnv {
    type Tensor = Tensor;

    fn reset(&mut self, _seed: u64) -> Result<Tensor> {
        self.position = 0;
        self.observation()
    }

    fn step(&mut self, action: &Tensor) -> Result<SnapShot<Tensor>> {
        let action = action.flatten_all()?.to_dtype(DType::U32)?.to_vec1::<u32>()?;
        self.position = match action.first() {
            Some(1) => (self.position + 1).min(self.length - 1),
            _ => self.position.saturating_sub(1),
        };
        let terminated = self.position == self.length - 1;
        Ok(SnapShot {
            state: self.observation()?,
            reward: if terminated { 1. } else { 0. },
            terminated,
            trancuated: false,
        })
    }

    fn env_description(&self) -> EnvironmentDescription<Tensor> {
        EnvironmentDescription::new(
            Space::continous_from_dims(vec![self.length]),
            Space::Discrete(2),
        )
    }
}

/// A point on a line that should be pushed towards the origin. Rewards are `-x^2`, episodes are
/// truncated after `horizon` steps.
pub struct PointEnv {
    horizon: usize,
    steps: usize,
    x: f32,
    device: Device,
}

impl PointEnv {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            steps: 0,
            x: 0.,
            device: Device::Cpu,
        }
    }
}

impl Env for PointEnv {
    type Tensor = Tensor;

    fn reset(&mut self, seed: u64) -> Result<Tensor> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.x = rng.random_range(-1f32..1.);
        self.steps = 0;
        Ok(Tensor::new(&[self.x], &self.device)?)
    }

    fn step(&mut self, action: &Tensor) -> Result<SnapShot<Tensor>> {
        let push = action.flatten_all()?.to_vec1::<f32>()?;
        let push = push.first().copied().unwrap_or(0.).clamp(-1., 1.);
        self.x += 0.1 * push;
        self.steps += 1;
        Ok(SnapShot {
            state: Tensor::new(&[self.x], &self.device)?,
            reward: -self.x * self.x,
            terminated: false,
            trancuated: self.steps >= self.horizon,
        })
    }

    fn env_description(&self) -> EnvironmentDescription<Tensor> {
        EnvironmentDescription::new(
            Space::continous_from_dims(vec![1]),
            Space::continous_from_dims(vec![1]),
        )
    }
}
