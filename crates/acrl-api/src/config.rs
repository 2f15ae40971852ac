use acrl_core::trainer::TrainerParams;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Network and update hyperparameters of an actor-critic agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub n_layers: usize,
    pub size: usize,
    pub learning_rate: f64,
    pub gamma: f32,
    pub standardize_advantages: bool,
    pub num_target_updates: usize,
    pub num_grad_steps_per_target_update: usize,
    pub num_critic_updates_per_agent_update: usize,
    pub num_actor_updates_per_agent_update: usize,
    pub max_grad_norm: Option<f32>,
    pub replay_buffer_size: usize,
    /// Overrides the action space type reported by the environment
    pub discrete: Option<bool>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            n_layers: 2,
            size: 64,
            learning_rate: 5e-3,
            gamma: 1.,
            standardize_advantages: true,
            num_target_updates: 10,
            num_grad_steps_per_target_update: 10,
            num_critic_updates_per_agent_update: 1,
            num_actor_updates_per_agent_update: 1,
            max_grad_norm: None,
            replay_buffer_size: 1_000_000,
            discrete: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(invalid("size", "hidden layers need at least one unit"));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0. {
            return Err(invalid("learning_rate", "must be positive"));
        }
        if !(0. ..=1.).contains(&self.gamma) {
            return Err(invalid("gamma", format!("{} is outside [0, 1]", self.gamma)));
        }
        if self.num_target_updates == 0 || self.num_grad_steps_per_target_update == 0 {
            return Err(invalid(
                "num_target_updates",
                "the critic needs at least one gradient step per update",
            ));
        }
        if self
            .max_grad_norm
            .is_some_and(|max_grad_norm| max_grad_norm.is_nan() || max_grad_norm <= 0.)
        {
            return Err(invalid("max_grad_norm", "must be positive"));
        }
        if self.replay_buffer_size == 0 {
            return Err(invalid("replay_buffer_size", "must be positive"));
        }
        Ok(())
    }
}

/// Outer loop settings. `batch_size_initial` and `train_batch_size` fall back to `batch_size`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub n_iter: usize,
    pub batch_size: usize,
    pub batch_size_initial: Option<usize>,
    pub train_batch_size: Option<usize>,
    pub num_agent_train_steps_per_iter: usize,
    pub ep_len: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_iter: 100,
            batch_size: 1000,
            batch_size_initial: None,
            train_batch_size: None,
            num_agent_train_steps_per_iter: 1,
            ep_len: 200,
            seed: 1,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("n_iter", self.n_iter),
            ("batch_size", self.batch_size),
            ("ep_len", self.ep_len),
            (
                "num_agent_train_steps_per_iter",
                self.num_agent_train_steps_per_iter,
            ),
            (
                "batch_size_initial",
                self.batch_size_initial.unwrap_or(self.batch_size),
            ),
            (
                "train_batch_size",
                self.train_batch_size.unwrap_or(self.batch_size),
            ),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be positive"));
            }
        }
        Ok(())
    }

    pub fn trainer_params(&self) -> TrainerParams {
        TrainerParams {
            batch_size_initial: self.batch_size_initial.unwrap_or(self.batch_size),
            batch_size: self.batch_size,
            train_batch_size: self.train_batch_size.unwrap_or(self.batch_size),
            num_agent_train_steps_per_iter: self.num_agent_train_steps_per_iter,
            ep_len: self.ep_len,
        }
    }
}

/// A full experiment, as read from a toml file with `[agent]` and `[training]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub agent: AgentConfig,
    pub training: TrainingConfig,
}

impl ExperimentConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.validate()?;
        self.training.validate()
    }
}

#[cfg(test)]
mod test {
    use super::{ConfigError, ExperimentConfig};
    use anyhow::Result;

    #[test]
    fn empty_config_uses_defaults() -> Result<()> {
        let config = ExperimentConfig::from_toml_str("")?;
        assert_eq!(config.agent.n_layers, 2);
        assert_eq!(config.agent.size, 64);
        assert_eq!(config.agent.gamma, 1.);
        assert!(config.agent.standardize_advantages);
        let params = config.training.trainer_params();
        assert_eq!(params.batch_size_initial, params.batch_size);
        assert_eq!(params.train_batch_size, params.batch_size);
        Ok(())
    }

    #[test]
    fn partial_tables_override_defaults() -> Result<()> {
        let config = ExperimentConfig::from_toml_str(
            r#"
            [agent]
            gamma = 0.9
            num_target_updates = 5
            max_grad_norm = 0.5

            [training]
            batch_size = 200
            train_batch_size = 50
            "#,
        )?;
        assert_eq!(config.agent.gamma, 0.9);
        assert_eq!(config.agent.num_target_updates, 5);
        assert_eq!(config.agent.max_grad_norm, Some(0.5));
        assert_eq!(config.agent.num_grad_steps_per_target_update, 10);
        let params = config.training.trainer_params();
        assert_eq!(params.batch_size_initial, 200);
        assert_eq!(params.train_batch_size, 50);
        Ok(())
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for source in [
            "[agent]\ngamma = 1.5",
            "[agent]\nlearning_rate = 0.0",
            "[agent]\nsize = 0",
            "[training]\nbatch_size = 0",
        ] {
            let err = ExperimentConfig::from_toml_str(source);
            assert!(matches!(err, Err(ConfigError::Invalid { .. })), "{source}");
        }
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = ExperimentConfig::from_toml_str("[agent]\nlayers = 3");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }
}
