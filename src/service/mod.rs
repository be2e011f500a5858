// Retrieval service
// Transport-agnostic request/response surface over the embedding generator and the context assembler

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::config::Config;
use crate::context::{ContextAssembler, DocumentStore};
use crate::database::Database;
use crate::embeddings::EmbeddingGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionResponse {
    pub dim: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembleContextRequest {
    pub document_ids: Vec<i64>,
    /// Falls back to the configured budget when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_budget: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembleContextResponse {
    pub context: String,
}

/// Everything a fact-check front end needs, constructed once at start-up
#[derive(Debug)]
pub struct RetrievalService<S> {
    generator: Arc<EmbeddingGenerator>,
    assembler: ContextAssembler<S>,
}

impl RetrievalService<Database> {
    /// Load the encoder, projection and document store named by `config`
    pub async fn from_config(config: &Config) -> Result<Self> {
        let generator = EmbeddingGenerator::from_config(config)?;
        let database = Database::initialize_from_config_dir(config.get_base_dir()).await?;
        let assembler =
            ContextAssembler::new(database).with_default_budget(config.context.total_budget);

        Ok(Self::new(Arc::new(generator), assembler))
    }
}

impl<S: DocumentStore> RetrievalService<S> {
    #[inline]
    pub fn new(generator: Arc<EmbeddingGenerator>, assembler: ContextAssembler<S>) -> Self {
        Self {
            generator,
            assembler,
        }
    }

    #[inline]
    pub fn generator(&self) -> &Arc<EmbeddingGenerator> {
        &self.generator
    }

    #[inline]
    pub fn assembler(&self) -> &ContextAssembler<S> {
        &self.assembler
    }

    pub fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse> {
        let vector = self.generator.embed(&request.text)?;
        Ok(EmbedResponse {
            vector: vector.into_inner(),
        })
    }

    #[inline]
    pub fn embedding_dimension(&self) -> DimensionResponse {
        DimensionResponse {
            dim: self.generator.dimension(),
        }
    }

    pub async fn assemble_context(
        &self,
        request: &AssembleContextRequest,
    ) -> Result<AssembleContextResponse> {
        let budget = request
            .total_budget
            .unwrap_or_else(|| self.assembler.default_budget());
        debug!(
            "Assembling context for {} documents within {} characters",
            request.document_ids.len(),
            budget
        );

        let context = self
            .assembler
            .assemble(&request.document_ids, budget)
            .await?;

        Ok(AssembleContextResponse {
            context: context.into_string(),
        })
    }
}
