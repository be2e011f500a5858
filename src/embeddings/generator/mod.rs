
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use tracing::{debug, info};

use crate::config::{Config, ProjectionConfig};
use crate::embeddings::encoder::{OnnxEncoder, TokenEncoder, WARMUP_TEXT};
use crate::embeddings::pooling::Pooling;
use crate::embeddings::projection::{ArtifactKey, ArtifactStore, FsArtifactStore, ProjectionMatrix};
use crate::{Result, WikicheckError};

/// Fixed-length embedding; the length never changes for one generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    #[inline]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl Deref for EmbeddingVector {
    type Target = [f32];

    #[inline]
    fn deref(&self) -> &[f32] {
        &self.0
    }
}

impl From<EmbeddingVector> for Vec<f32> {
    #[inline]
    fn from(vector: EmbeddingVector) -> Self {
        vector.0
    }
}

/// Dimensionality reduction applied after pooling
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    #[default]
    Disabled,
    Enabled(ProjectionMatrix),
}

/// Immutable text-to-vector service: encoder, pooling rule and optional projection.
///
/// Build it once at start-up and share it (e.g. behind an `Arc`); every method
/// takes `&self` and nothing is mutated after construction.
pub struct EmbeddingGenerator {
    encoder: Box<dyn TokenEncoder>,
    pooling: Pooling,
    projection: Projection,
    dimension: usize,
}

impl std::fmt::Debug for EmbeddingGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingGenerator")
            .field("encoder", &self.encoder.name())
            .field("pooling", &self.pooling)
            .field("projection", &matches!(self.projection, Projection::Enabled(_)))
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl EmbeddingGenerator {
    /// Assemble a generator and run the start-up health check.
    ///
    /// A projection whose source dimension differs from the encoder's hidden
    /// size fails with [`WikicheckError::DimensionMismatch`]; an encoder that
    /// cannot embed the warm-up text fails with
    /// [`WikicheckError::EncoderUnavailable`].
    pub fn new(
        encoder: Box<dyn TokenEncoder>,
        pooling: Pooling,
        projection: Projection,
    ) -> Result<Self> {
        let hidden_size = encoder.hidden_size();
        if hidden_size == 0 {
            return Err(WikicheckError::EncoderUnavailable(format!(
                "encoder {} reports an empty hidden size",
                encoder.name()
            )));
        }

        let dimension = match &projection {
            Projection::Disabled => hidden_size,
            Projection::Enabled(matrix) => {
                if matrix.source_dim() != hidden_size {
                    return Err(WikicheckError::DimensionMismatch {
                        expected: hidden_size,
                        actual: matrix.source_dim(),
                    });
                }
                matrix.target_dim()
            }
        };

        let generator = Self {
            encoder,
            pooling,
            projection,
            dimension,
        };

        let warmup = generator.embed(WARMUP_TEXT).map_err(|e| match e {
            WikicheckError::DimensionMismatch { .. } => e,
            other => WikicheckError::EncoderUnavailable(format!(
                "start-up warm-up failed for {}: {other}",
                generator.encoder.name()
            )),
        })?;
        debug!("Start-up warm-up produced {} dimensions", warmup.len());

        info!(
            "Embedding generator ready: encoder {}, {} pooling, dimension {}",
            generator.encoder.name(),
            generator.pooling,
            generator.dimension
        );
        Ok(generator)
    }

    /// Load the ONNX encoder and, when enabled, the persisted projection matrix named by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let encoder = OnnxEncoder::load(config)?;
        let store = FsArtifactStore::new(config.projections_path());
        let projection =
            Projection::from_store(&store, config.embedding.projection, encoder.hidden_size())?;
        Self::new(Box::new(encoder), config.embedding.pooling, projection)
    }

    /// Final vector length, post-projection when enabled
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn pooling(&self) -> Pooling {
        self.pooling
    }

    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    #[inline]
    pub fn encoder_name(&self) -> &str {
        self.encoder.name()
    }

    pub fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        if text.is_empty() {
            return Err(WikicheckError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        debug!("Generating embedding for text (length: {})", text.len());

        let states = self.encoder.encode(text)?;
        let pooled = self.pooling.pool(&states)?;

        let hidden_size = self.encoder.hidden_size();
        if pooled.len() != hidden_size {
            return Err(WikicheckError::DimensionMismatch {
                expected: hidden_size,
                actual: pooled.len(),
            });
        }

        let vector = match &self.projection {
            Projection::Disabled => pooled,
            Projection::Enabled(matrix) => matrix.project(&pooled)?,
        };

        Ok(EmbeddingVector(vector))
    }

    /// Embed `texts` in order; stops at the first failure
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl Projection {
    /// Resolve the projection described by `settings` from `store`.
    ///
    /// The matrix is looked up under `(hidden_size, target_dim)`. A missing
    /// artifact or one built from another seed is a configuration error.
    pub fn from_store<S: ArtifactStore>(
        store: &S,
        settings: Option<ProjectionConfig>,
        hidden_size: usize,
    ) -> Result<Self> {
        let Some(settings) = settings else {
            return Ok(Self::Disabled);
        };

        let key = ArtifactKey::new(hidden_size, settings.target_dim);
        let matrix = store.load(&key).map_err(|e| match e {
            WikicheckError::ArtifactNotFound(key) => WikicheckError::Config(format!(
                "projection matrix {key} has not been built; run `wikicheck build-projection --source-dim {hidden_size} --target-dim {} --seed {}`",
                settings.target_dim, settings.seed
            )),
            other => other,
        })?;

        if matrix.seed() != settings.seed {
            return Err(WikicheckError::Config(format!(
                "projection matrix {key} was built with seed {} but the configuration asks for seed {}",
                matrix.seed(),
                settings.seed
            )));
        }

        Ok(Self::Enabled(matrix))
    }
}
