use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::context::{DocumentRecord, DocumentStore};
use crate::WikicheckError;


pub mod models;
pub mod queries;

pub use models::{Document, ImportStats, NewDocument};
pub use queries::DocumentQueries;

pub type DbPool = Pool<Sqlite>;

const ACQUIRE_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECONDS))
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("documents.db");

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(&db_path).await
    }

    // Document operations
    /// Append `document` at the next position
    pub async fn insert_document(&self, document: &NewDocument) -> Result<Document> {
        DocumentQueries::create(&self.pool, document).await
    }

    pub async fn get_document_by_id(&self, id: i64) -> Result<Option<Document>> {
        DocumentQueries::get_by_id(&self.pool, id).await
    }

    pub async fn count_documents(&self) -> Result<i64> {
        DocumentQueries::count(&self.pool).await
    }

    pub async fn list_document_titles(&self, limit: i64) -> Result<Vec<(i64, String)>> {
        DocumentQueries::list_titles(&self.pool, limit).await
    }

    /// Load a JSONL dump (one `{"title": .., "text": ..}` object per line) in a single transaction.
    ///
    /// Each non-blank line is appended at the next position, so importing into an
    /// empty store gives the first document id 0. Blank lines are skipped; a
    /// malformed line aborts the import and nothing is committed.
    pub async fn import_jsonl(&self, path: &Path) -> Result<ImportStats> {
        info!("Importing documents from {}", path.display());

        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open dataset: {}", path.display()))?;
        let mut lines = BufReader::new(file).lines();

        let bar = if console::user_attended_stderr() {
            ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template("{spinner} [{pos}] Importing {msg}")
                    .context("Invalid progress template")?,
            )
        } else {
            ProgressBar::hidden()
        };

        let mut transaction = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for document import")?;

        let mut stats = ImportStats::default();
        let mut line_number = 0usize;

        while let Some(line) = lines
            .next_line()
            .await
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?
        {
            line_number += 1;
            if line.trim().is_empty() {
                stats.skipped_blank += 1;
                continue;
            }

            let document: NewDocument = serde_json::from_str(&line)
                .with_context(|| format!("Invalid document on line {line_number}"))?;

            bar.set_message(document.title.clone());
            DocumentQueries::create_in_transaction(&mut transaction, &document).await?;
            stats.imported += 1;
            bar.inc(1);
        }

        transaction
            .commit()
            .await
            .context("Failed to commit document import")?;
        bar.finish_and_clear();

        if stats.skipped_blank > 0 {
            warn!("Skipped {} blank lines", stats.skipped_blank);
        }
        info!(
            "Imported {} documents from {}",
            stats.imported,
            path.display()
        );
        Ok(stats)
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn get_document(&self, id: i64) -> crate::Result<Option<DocumentRecord>> {
        let document = self
            .get_document_by_id(id)
            .await
            .map_err(|e| WikicheckError::Database(format!("{e:#}")))?;

        Ok(document.map(DocumentRecord::from))
    }
}
