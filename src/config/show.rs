use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use tracing::info;

use super::Config;

/// Write a default `config.toml` unless one already exists. Returns whether a file was written.
#[inline]
pub fn init_config(config_dir: &Path) -> Result<bool> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    if config.config_file_path().exists() {
        return Ok(false);
    }

    config.save().context("Failed to save configuration")?;
    info!(
        "Wrote default configuration to {}",
        config.config_file_path().display()
    );
    Ok(true)
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Encoder Settings:").bold().yellow());
    eprintln!(
        "  Model: {}",
        style(config.model_path().display()).cyan()
    );
    eprintln!(
        "  Tokenizer: {}",
        style(config.tokenizer_path().display()).cyan()
    );
    eprintln!(
        "  Max Sequence Length: {}",
        style(config.encoder.max_sequence_length).cyan()
    );
    eprintln!(
        "  Intra-op Threads: {}",
        style(config.encoder.intra_threads).cyan()
    );
    eprintln!(
        "  Token Type Ids: {}",
        style(config.encoder.token_type_ids).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Pooling: {}", style(config.embedding.pooling).cyan());
    match &config.embedding.projection {
        Some(projection) => eprintln!(
            "  Projection: {} (target dimension {}, seed {})",
            style("enabled").green(),
            style(projection.target_dim).cyan(),
            style(projection.seed).cyan()
        ),
        None => eprintln!("  Projection: {}", style("disabled").dim()),
    }

    eprintln!();
    eprintln!("{}", style("Context Settings:").bold().yellow());
    eprintln!(
        "  Total Budget: {} characters",
        style(config.context.total_budget).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
    eprintln!(
        "Document store: {}",
        style(config.database_path().display()).dim()
    );
    eprintln!(
        "Projection matrices: {}",
        style(config.projections_path().display()).dim()
    );

    Ok(())
}
