use anyhow::Result;

#[derive(Debug, Clone)]
pub enum Space<T> {
    Discrete(usize),
    Continous {
        min: Option<T>,
        max: Option<T>,
        size: usize,
    },
}

impl<T> Space<T> {
    pub fn continous_from_dims(dims: Vec<usize>) -> Self {
        Self::Continous {
            min: None,
            max: None,
            size: dims.iter().product(),
        }
    }

    pub fn size(&self) -> usize {
        match &self {
            Self::Discrete(size) => *size,
            Self::Continous { size, .. } => *size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentDescription<T> {
    pub observation_space: Space<T>,
    pub action_space: Space<T>,
}

impl<T> EnvironmentDescription<T> {
    pub fn new(observation_space: Space<T>, action_space: Space<T>) -> Self {
        Self {
            observation_space,
            action_space,
        }
    }

    pub fn action_size(&self) -> usize {
        self.action_space.size()
    }

    pub fn observation_size(&self) -> usize {
        self.observation_space.size()
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.action_space, Space::Discrete(_))
    }
}

pub struct SnapShot<T> {
    pub state: T,
    pub reward: f32,
    pub terminated: bool,
    pub trancuated: bool,
}

impl<T> SnapShot<T> {
    pub fn done(&self) -> bool {
        self.terminated || self.trancuated
    }
}

pub trait Env {
    type Tensor: Clone;

    fn reset(&mut self, seed: u64) -> Result<Self::Tensor>;
    fn step(&mut self, action: &Self::Tensor) -> Result<SnapShot<Self::Tensor>>;
    fn env_description(&self) -> EnvironmentDescription<Self::Tensor>;
}
