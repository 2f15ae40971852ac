pub mod builders;
pub mod config;
pub mod logging;

#[cfg(feature = "test-utils")]
pub mod test_utils;
