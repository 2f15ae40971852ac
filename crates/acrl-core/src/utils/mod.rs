pub mod path;
pub mod replay_buffer;
pub mod stats;
