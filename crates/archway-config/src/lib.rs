pub mod annotations;
pub mod backend;
pub mod config;
pub mod error;

#[cfg(test)]
pub mod test_utils;

pub use backend::BackendConfig;
pub use config::{default_config_path, generate_default_config, Config};
pub use error::{ConfigError, Result};
