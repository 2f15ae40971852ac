pub mod argmax_policy;
pub mod critic;
pub mod distributions;
pub mod optimizer;
pub mod policy;
pub mod tensors;
pub mod thread_safe_sequential;
