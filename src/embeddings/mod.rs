// Embeddings module
// Encoder inference, pooling, random projection and vector similarity

pub mod encoder;
pub mod generator;
pub mod pooling;
pub mod projection;
pub mod similarity;

#[cfg(test)]
pub(crate) mod testing;

pub use encoder::{OnnxEncoder, TokenEncoder};
pub use generator::{EmbeddingGenerator, EmbeddingVector, Projection};
pub use pooling::{Pooling, TokenStates};
pub use projection::{
    ArtifactKey, ArtifactStore, FsArtifactStore, ProjectionBuilder, ProjectionMatrix,
};
pub use similarity::{cosine_distance, cosine_similarity, dot_product};
