use super::*;
use crate::WikicheckError;
use crate::context::{DocumentRecord, MemoryDocumentStore};
use crate::embeddings::testing::HashEncoder;
use crate::embeddings::{Pooling, Projection, ProjectionMatrix};

fn service(projection: Projection) -> RetrievalService<MemoryDocumentStore> {
    let generator = EmbeddingGenerator::new(
        Box::new(HashEncoder::new(12)),
        Pooling::MeanPool,
        projection,
    )
    .expect("should build generator");

    let store: MemoryDocumentStore = [
        DocumentRecord {
            id: 1,
            title: "Amboise".to_string(),
            text: "Amboise is a commune in the Indre-et-Loire department.".repeat(10),
        },
        DocumentRecord {
            id: 2,
            title: "Alain Connes".to_string(),
            text: "Alain Connes is a French mathematician born in Draguignan.".repeat(10),
        },
    ]
    .into_iter()
    .collect();

    RetrievalService::new(
        Arc::new(generator),
        ContextAssembler::new(store).with_default_budget(200),
    )
}

#[test]
fn dimension_matches_every_embedding() {
    let matrix = ProjectionMatrix::generate(12, 5, 0).expect("should generate matrix");
    let service = service(Projection::Enabled(matrix));
    let dimension = service.embedding_dimension();
    assert_eq!(dimension, DimensionResponse { dim: 5 });

    for text in [
        "Alain Connes was born in 1948 in Amboise",
        "Is the Loire the longest river in France?",
    ] {
        let response = service
            .embed(&EmbedRequest {
                text: text.to_string(),
            })
            .expect("should embed");
        assert_eq!(response.vector.len(), dimension.dim);
    }
}

#[test]
fn embed_is_repeatable() {
    let service = service(Projection::Disabled);
    let request = EmbedRequest {
        text: "The Mediterranean diet emphasizes fish".to_string(),
    };
    let first = service.embed(&request).expect("should embed");
    let second = service.embed(&request).expect("should embed");
    assert_eq!(first, second);
}

#[tokio::test]
async fn assemble_context_with_explicit_budget() {
    let service = service(Projection::Disabled);
    let response = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![2, 1],
            total_budget: Some(100),
        })
        .await
        .expect("should assemble");

    assert!(response.context.starts_with("\n---------\nAlain Connes: \n\n"));
    assert_eq!(response.context.matches("---------").count(), 2);
}

#[tokio::test]
async fn assemble_context_falls_back_to_default_budget() {
    let service = service(Projection::Disabled);
    let response = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![1],
            total_budget: None,
        })
        .await
        .expect("should assemble");

    let excerpt = response
        .context
        .trim_start_matches("\n---------\nAmboise: \n\n")
        .trim_end_matches('\n');
    assert_eq!(excerpt.chars().count(), 199);
}

#[tokio::test]
async fn assemble_context_reports_missing_document() {
    let service = service(Projection::Disabled);
    let result = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![1, 3],
            total_budget: Some(50),
        })
        .await;
    assert!(matches!(result, Err(WikicheckError::DocumentNotFound(3))));
}

#[test]
fn request_and_response_wire_shapes() {
    let request: AssembleContextRequest =
        serde_json::from_str(r#"{"document_ids": [17, 4]}"#).expect("should parse request");
    assert_eq!(request.document_ids, vec![17, 4]);
    assert_eq!(request.total_budget, None);

    let dimension = serde_json::to_string(&DimensionResponse { dim: 384 })
        .expect("should serialize response");
    assert_eq!(dimension, r#"{"dim":384}"#);

    let embed: EmbedRequest =
        serde_json::from_str(r#"{"text": "hello"}"#).expect("should parse request");
    assert_eq!(embed.text, "hello");
}
