use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcrlError {
    #[error("cannot sample from an empty replay buffer")]
    EmptyReplayBuffer,

    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
