pub mod ac_agent;
pub mod hooks;
