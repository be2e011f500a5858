// Configuration management module
// Loads, validates and persists the TOML settings shared by the CLI and the service

pub mod settings;
pub mod show;


pub use settings::{
    Config, ConfigError, ContextConfig, EmbeddingConfig, EncoderConfig, ProjectionConfig,
};
pub use show::{init_config, show_config};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
