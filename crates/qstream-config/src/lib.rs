pub mod config;
pub mod error;

pub use config::{get_config, init, set_config, StreamConfig, CONFIG_ENV};
pub use error::{ConfigError, Result};

#[cfg(test)]
pub mod test_utils;
