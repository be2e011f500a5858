use thiserror::Error;

pub type Result<T> = std::result::Result<T, WikicheckError>;

#[derive(Error, Debug)]
pub enum WikicheckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Projection artifact already exists: {0}")]
    DuplicateArtifact(String),

    #[error("Projection artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error(
        "Context budget of {budget} characters is too small for {documents} documents"
    )]
    BudgetTooSmall { budget: usize, documents: usize },

    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<config::ConfigError> for WikicheckError {
    #[inline]
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<sqlx::Error> for WikicheckError {
    #[inline]
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub mod commands;
pub mod config;
pub mod context;
pub mod database;
pub mod embeddings;
pub mod service;
