
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::context::DEFAULT_CONTEXT_BUDGET;
use crate::embeddings::pooling::Pooling;

pub const CONFIG_DIR_ENV: &str = "WIKICHECK_HOME";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncoderConfig {
    /// ONNX graph of the pretrained encoder; relative paths resolve against the config directory
    pub model_path: PathBuf,
    /// HuggingFace `tokenizer.json` matching the model
    pub tokenizer_path: PathBuf,
    /// Inputs longer than this many tokens are truncated before pooling
    pub max_sequence_length: usize,
    pub intra_threads: usize,
    /// Feed an all-zero `token_type_ids` tensor (BERT-style graphs require it)
    pub token_type_ids: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/bge-small-en-v1.5/model.onnx"),
            tokenizer_path: PathBuf::from("models/bge-small-en-v1.5/tokenizer.json"),
            max_sequence_length: 512,
            intra_threads: 2,
            token_type_ids: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub pooling: Pooling,
    /// Random projection applied after pooling; absent means disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectionConfig {
    pub target_dim: usize,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContextConfig {
    /// Total characters shared by all excerpts of one assembled context
    pub total_budget: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            total_budget: DEFAULT_CONTEXT_BUDGET,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid model path: {0} (cannot be empty)")]
    InvalidModelPath(String),
    #[error("Invalid tokenizer path: {0} (cannot be empty)")]
    InvalidTokenizerPath(String),
    #[error("Invalid max sequence length: {0} (must be between 1 and 8192)")]
    InvalidMaxSequenceLength(usize),
    #[error("Invalid intra-op thread count: {0} (must be between 1 and 64)")]
    InvalidIntraThreads(usize),
    #[error("Invalid projection target dimension: {0} (must be between 1 and 4096)")]
    InvalidTargetDimension(usize),
    #[error("Invalid context budget: {0} (must be at least 1)")]
    InvalidContextBudget(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Resolve the configuration directory: `$WIKICHECK_HOME`, then `~/.wikicheck`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        dirs::home_dir()
            .map(|home| home.join(".wikicheck"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("wikicheck"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.encoder.validate()?;

        if let Some(projection) = &self.embedding.projection {
            if !(1..=4096).contains(&projection.target_dim) {
                return Err(ConfigError::InvalidTargetDimension(projection.target_dim));
            }
        }

        if self.context.total_budget == 0 {
            return Err(ConfigError::InvalidContextBudget(
                self.context.total_budget,
            ));
        }

        Ok(())
    }

    /// Resolve a configured path against the config directory
    #[inline]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.get_base_dir().join(path)
        }
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Get the path for the SQLite document store
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.get_base_dir().join("documents.db")
    }

    /// Get the directory holding persisted projection matrices
    #[inline]
    pub fn projections_path(&self) -> PathBuf {
        self.get_base_dir().join("projections")
    }

    #[inline]
    pub fn model_path(&self) -> PathBuf {
        self.resolve_path(&self.encoder.model_path)
    }

    #[inline]
    pub fn tokenizer_path(&self) -> PathBuf {
        self.resolve_path(&self.encoder.tokenizer_path)
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidModelPath(
                self.model_path.display().to_string(),
            ));
        }

        if self.tokenizer_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidTokenizerPath(
                self.tokenizer_path.display().to_string(),
            ));
        }

        if !(1..=8192).contains(&self.max_sequence_length) {
            return Err(ConfigError::InvalidMaxSequenceLength(
                self.max_sequence_length,
            ));
        }

        if !(1..=64).contains(&self.intra_threads) {
            return Err(ConfigError::InvalidIntraThreads(self.intra_threads));
        }

        Ok(())
    }
}
