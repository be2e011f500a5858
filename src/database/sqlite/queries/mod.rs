
use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

const INSERT_AT_NEXT_POSITION: &str = r#"
    INSERT INTO documents (id, title, text, imported_date)
    VALUES ((SELECT COALESCE(MAX(id) + 1, 0) FROM documents), ?, ?, ?)
"#;

/// Documents are numbered by position: the first stored document has id 0
pub struct DocumentQueries;

impl DocumentQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_document: &NewDocument) -> Result<Document> {
        let id = sqlx::query(INSERT_AT_NEXT_POSITION)
            .bind(&new_document.title)
            .bind(&new_document.text)
            .bind(Utc::now().naive_utc())
            .execute(pool)
            .await
            .context("Failed to create document")?
            .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created document"))
    }

    /// Insert inside an open transaction, returning the assigned id
    #[inline]
    pub async fn create_in_transaction(
        transaction: &mut Transaction<'_, Sqlite>,
        new_document: &NewDocument,
    ) -> Result<i64> {
        let id = sqlx::query(INSERT_AT_NEXT_POSITION)
            .bind(&new_document.title)
            .bind(&new_document.text)
            .bind(Utc::now().naive_utc())
            .execute(&mut **transaction)
            .await
            .with_context(|| format!("Failed to insert document '{}'", new_document.title))?
            .last_insert_rowid();

        Ok(id)
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Document>> {
        let result = sqlx::query_as::<_, Document>(
            r#"
            SELECT id,
                   title,
                   text,
                   imported_date
            FROM documents WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get document by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await
            .context("Failed to count documents")?;

        debug!("Document store holds {} documents", count);
        Ok(count)
    }

    #[inline]
    pub async fn list_titles(pool: &SqlitePool, limit: i64) -> Result<Vec<(i64, String)>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, title FROM documents ORDER BY id LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list document titles")?;

        Ok(rows)
    }
}
