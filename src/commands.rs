use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::context::ContextAssembler;
use crate::database::Database;
use crate::embeddings::{
    ArtifactKey, EmbeddingGenerator, FsArtifactStore, ProjectionBuilder, cosine_distance,
    cosine_similarity,
};
use crate::service::{DimensionResponse, EmbedResponse};

/// Build and persist the projection matrix for `(source_dim, target_dim)`
#[inline]
pub fn build_projection(
    config_dir: &Path,
    source_dim: usize,
    target_dim: usize,
    seed: u64,
) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let store = FsArtifactStore::new(config.projections_path());
    let path = store.path_for(&ArtifactKey::new(source_dim, target_dim));

    ProjectionBuilder::new(store)
        .build(source_dim, target_dim, seed)
        .with_context(|| format!("Failed to build projection matrix {}", path.display()))?;

    eprintln!(
        "{}",
        style(format!(
            "✓ Random projection matrix {target_dim}x{source_dim} (seed {seed}) saved"
        ))
        .green()
    );
    eprintln!("  {}", style(path.display()).dim());
    Ok(())
}

fn load_generator(config_dir: &Path) -> Result<EmbeddingGenerator> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    EmbeddingGenerator::from_config(&config).context("Failed to start embedding generator")
}

/// Print the embedding of `text` as `{"vector": [...]}`
#[inline]
pub fn embed_text(config_dir: &Path, text: &str) -> Result<()> {
    let generator = load_generator(config_dir)?;
    let vector = generator.embed(text)?;

    let response = EmbedResponse {
        vector: vector.into_inner(),
    };
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

/// Print the final embedding dimension as `{"dim": N}`
#[inline]
pub fn show_dimension(config_dir: &Path) -> Result<()> {
    let generator = load_generator(config_dir)?;

    let response = DimensionResponse {
        dim: generator.dimension(),
    };
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

/// Print the cosine similarity and cosine distance (`1 - similarity`) of two texts' embeddings
#[inline]
pub fn compare_texts(config_dir: &Path, first: &str, second: &str) -> Result<()> {
    let generator = load_generator(config_dir)?;
    let a = generator.embed(first)?;
    let b = generator.embed(second)?;

    let response = serde_json::json!({
        "cosine_similarity": cosine_similarity(&a, &b)?,
        "cosine_distance": cosine_distance(&a, &b)?,
    });
    println!("{response}");
    Ok(())
}

/// Load a JSONL dataset into the document store
#[inline]
pub async fn import_documents(config_dir: &Path, dataset: &Path) -> Result<()> {
    let database = Database::initialize_from_config_dir(config_dir)
        .await
        .context("Failed to initialize database")?;

    let stats = database.import_jsonl(dataset).await?;
    let total = database.count_documents().await?;

    println!("Imported {} documents", stats.imported);
    if stats.skipped_blank > 0 {
        println!("  Skipped blank lines: {}", stats.skipped_blank);
    }
    println!("  Documents in store: {}", total);
    Ok(())
}

/// List the first `limit` documents of the store
#[inline]
pub async fn list_documents(config_dir: &Path, limit: i64) -> Result<()> {
    let database = Database::initialize_from_config_dir(config_dir)
        .await
        .context("Failed to initialize database")?;

    let total = database.count_documents().await?;
    if total == 0 {
        println!("The document store is empty.");
        println!("Use 'wikicheck import <file.jsonl>' to load documents.");
        return Ok(());
    }

    println!("Documents ({} total):", total);
    for (id, title) in database.list_document_titles(limit).await? {
        println!("  {:>8}  {}", id, title);
    }
    Ok(())
}

/// Print the context assembled from `document_ids`
#[inline]
pub async fn assemble_context(
    config_dir: &Path,
    document_ids: &[i64],
    budget: Option<usize>,
) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let database = Database::initialize_from_config_dir(config_dir)
        .await
        .context("Failed to initialize database")?;

    let assembler =
        ContextAssembler::new(database).with_default_budget(config.context.total_budget);
    let budget = budget.unwrap_or_else(|| assembler.default_budget());

    info!(
        "Assembling context from {} documents within {} characters",
        document_ids.len(),
        budget
    );
    let context = assembler.assemble(document_ids, budget).await?;

    print!("{context}");
    Ok(())
}
