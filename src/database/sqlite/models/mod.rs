#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::context::DocumentRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub imported_date: NaiveDateTime,
}

/// One line of a JSONL dataset dump.
///
/// Other fields of the line (a wikipedia dump's page `id` and `url`) are ignored;
/// the stored id is the document's 0-based position in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub text: String,
}

impl From<Document> for DocumentRecord {
    #[inline]
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            title: document.title,
            text: document.text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped_blank: usize,
}
