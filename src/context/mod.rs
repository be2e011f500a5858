// Context assembly module
// Builds the character-budgeted multi-document context that grounds a fact-check request


use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Result, WikicheckError};

/// Total characters shared by all excerpts when the caller does not pick a budget
pub const DEFAULT_CONTEXT_BUDGET: usize = 2000;

/// Line opening every block of an assembled context
pub const BLOCK_SEPARATOR: &str = "\n---------\n";

/// A document as served by the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub title: String,
    pub text: String,
}

/// Read-only source of documents for context assembly
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when no document has this id
    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        (**self).get_document(id).await
    }
}

/// Document store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: HashMap<i64, DocumentRecord>,
}

impl MemoryDocumentStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document under its id
    #[inline]
    pub fn insert(&mut self, record: DocumentRecord) {
        self.documents.insert(record.id, record);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<DocumentRecord> for MemoryDocumentStore {
    fn from_iter<I: IntoIterator<Item = DocumentRecord>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().map(|record| (record.id, record)).collect(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        Ok(self.documents.get(&id).cloned())
    }
}

/// Characters each document may contribute: `floor(budget / documents) - 1`
pub fn excerpt_length(total_budget: usize, documents: usize) -> Result<usize> {
    if documents == 0 {
        return Err(WikicheckError::InvalidInput(
            "context assembly needs at least one document id".to_string(),
        ));
    }

    (total_budget / documents)
        .checked_sub(1)
        .filter(|&length| length > 0)
        .ok_or(WikicheckError::BudgetTooSmall {
            budget: total_budget,
            documents,
        })
}

/// Prefix of `text` holding at most `max_chars` characters
#[inline]
#[expect(
    clippy::string_slice,
    reason = "char_indices only yields char boundaries"
)]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(end, _)| &text[..end])
}

/// One document's contribution to an assembled context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBlock<'a> {
    pub title: &'a str,
    pub excerpt: &'a str,
}

impl<'a> ContextBlock<'a> {
    #[inline]
    pub fn from_record(record: &'a DocumentRecord, excerpt_length: usize) -> Self {
        Self {
            title: &record.title,
            excerpt: truncate_chars(&record.text, excerpt_length),
        }
    }

    /// Append `<separator><title>: \n\n<excerpt>\n` to `out`
    pub fn render_into(&self, out: &mut String) {
        out.push_str(BLOCK_SEPARATOR);
        out.push_str(self.title);
        out.push_str(": \n\n");
        out.push_str(self.excerpt);
        out.push('\n');
    }
}

/// Concatenated blocks for one request, in caller order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    text: String,
    block_count: usize,
    excerpt_length: usize,
}

impl AssembledContext {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.text
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    #[inline]
    pub fn excerpt_length(&self) -> usize {
        self.excerpt_length
    }
}

impl std::fmt::Display for AssembledContext {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Pass-through assembler: no ranking, no deduplication, equal split of the budget
#[derive(Debug, Clone)]
pub struct ContextAssembler<S> {
    store: S,
    default_budget: usize,
}

impl<S: DocumentStore> ContextAssembler<S> {
    #[inline]
    pub fn new(store: S) -> Self {
        Self {
            store,
            default_budget: DEFAULT_CONTEXT_BUDGET,
        }
    }

    #[inline]
    pub fn with_default_budget(mut self, total_budget: usize) -> Self {
        self.default_budget = total_budget;
        self
    }

    #[inline]
    pub fn default_budget(&self) -> usize {
        self.default_budget
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Assemble the context for `document_ids` within `total_budget` characters.
    ///
    /// Documents are fetched one after another in the given order. Any id the
    /// store cannot resolve aborts the whole assembly with
    /// [`WikicheckError::DocumentNotFound`].
    pub async fn assemble(
        &self,
        document_ids: &[i64],
        total_budget: usize,
    ) -> Result<AssembledContext> {
        let excerpt_length = excerpt_length(total_budget, document_ids.len()).inspect_err(|e| {
            warn!("Rejected context request: {}", e);
        })?;

        let mut text = String::new();
        for &id in document_ids {
            let record = self
                .store
                .get_document(id)
                .await?
                .ok_or(WikicheckError::DocumentNotFound(id))?;

            ContextBlock::from_record(&record, excerpt_length).render_into(&mut text);
        }

        debug!(
            "Assembled context of {} blocks ({} characters per excerpt)",
            document_ids.len(),
            excerpt_length
        );

        Ok(AssembledContext {
            text,
            block_count: document_ids.len(),
            excerpt_length,
        })
    }

    #[inline]
    pub async fn assemble_default(&self, document_ids: &[i64]) -> Result<AssembledContext> {
        self.assemble(document_ids, self.default_budget).await
    }
}
