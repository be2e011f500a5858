#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests for the retrieval service over the SQLite document store
// Imports a JSONL dataset, then serves embeddings and assembled contexts from it

use std::sync::Arc;
use tempfile::TempDir;

use wikicheck::config::Config;
use wikicheck::context::ContextAssembler;
use wikicheck::database::Database;
use wikicheck::embeddings::{EmbeddingGenerator, Pooling, Projection, TokenEncoder, TokenStates};
use wikicheck::service::{AssembleContextRequest, EmbedRequest, RetrievalService};
use wikicheck::{Result, WikicheckError};

const DATASET: &str = r#"{"id": "1017", "title": "Amboise", "text": "Amboise is a commune in the Indre-et-Loire department of central France. It lies on the banks of the Loire."}
{"id": "1004", "title": "Alain Connes", "text": "Alain Connes is a French mathematician, known for his contributions to operator algebras and noncommutative geometry."}

{"id": "1023", "title": "Loire", "text": "The Loire is the longest river in France."}
"#;

/// Two-token encoder: a constant summary token and a length-derived token
struct LengthEncoder;

impl TokenEncoder for LengthEncoder {
    fn name(&self) -> &str {
        "length-encoder"
    }

    fn hidden_size(&self) -> usize {
        4
    }

    fn encode(&self, text: &str) -> Result<TokenStates> {
        let length = text.chars().count() as f32;
        let data = vec![1.0, 0.0, 0.0, 0.0, length, 1.0 / length, 0.5, -0.5];
        TokenStates::new(data, vec![1, 1], 4)
    }
}

async fn create_test_service() -> anyhow::Result<(RetrievalService<Database>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };

    let dataset = temp_dir.path().join("wiki.jsonl");
    std::fs::write(&dataset, DATASET)?;

    let database = Database::initialize_from_config_dir(config.get_base_dir()).await?;
    let stats = database.import_jsonl(&dataset).await?;
    assert_eq!(stats.imported, 3);
    assert_eq!(stats.skipped_blank, 1);

    let generator = EmbeddingGenerator::new(
        Box::new(LengthEncoder),
        Pooling::MeanPool,
        Projection::Disabled,
    )?;
    let assembler =
        ContextAssembler::new(database).with_default_budget(config.context.total_budget);

    Ok((
        RetrievalService::new(Arc::new(generator), assembler),
        temp_dir,
    ))
}

#[tokio::test]
async fn assembles_context_in_rank_order() {
    let (service, _temp_dir) = create_test_service()
        .await
        .expect("can create test service");

    let response = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![1, 0],
            total_budget: Some(62),
        })
        .await
        .expect("should assemble context");

    assert_eq!(
        response.context,
        "\n---------\nAlain Connes: \n\nAlain Connes is a French mathe\n\
         \n---------\nAmboise: \n\nAmboise is a commune in the In\n"
    );
}

#[tokio::test]
async fn dataset_page_ids_are_not_document_ids() {
    let (service, _temp_dir) = create_test_service()
        .await
        .expect("can create test service");

    let result = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![1017],
            total_budget: None,
        })
        .await;
    assert!(matches!(
        result,
        Err(WikicheckError::DocumentNotFound(1017))
    ));
}

#[tokio::test]
async fn default_budget_keeps_short_documents_whole() {
    let (service, _temp_dir) = create_test_service()
        .await
        .expect("can create test service");

    let response = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![2],
            total_budget: None,
        })
        .await
        .expect("should assemble context");

    assert_eq!(
        response.context,
        "\n---------\nLoire: \n\nThe Loire is the longest river in France.\n"
    );
}

#[tokio::test]
async fn unknown_document_fails_the_request() {
    let (service, _temp_dir) = create_test_service()
        .await
        .expect("can create test service");

    let result = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![0, 99],
            total_budget: None,
        })
        .await;
    assert!(matches!(result, Err(WikicheckError::DocumentNotFound(99))));
}

#[tokio::test]
async fn budget_too_small_for_document_count() {
    let (service, _temp_dir) = create_test_service()
        .await
        .expect("can create test service");

    let result = service
        .assemble_context(&AssembleContextRequest {
            document_ids: vec![0, 1, 2],
            total_budget: Some(5),
        })
        .await;
    assert!(matches!(
        result,
        Err(WikicheckError::BudgetTooSmall {
            budget: 5,
            documents: 3
        })
    ));
}

#[tokio::test]
async fn embeddings_match_reported_dimension() {
    let (service, _temp_dir) = create_test_service()
        .await
        .expect("can create test service");

    let dimension = service.embedding_dimension();
    assert_eq!(dimension.dim, 4);

    let response = service
        .embed(&EmbedRequest {
            text: "Amboise is on the Loire".to_string(),
        })
        .expect("should embed");
    assert_eq!(response.vector.len(), dimension.dim);
}

#[tokio::test]
async fn import_rejects_malformed_dataset_atomically() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let database = Database::initialize_from_config_dir(temp_dir.path())
        .await
        .expect("can create database");

    let dataset = temp_dir.path().join("broken.jsonl");
    std::fs::write(
        &dataset,
        "{\"title\": \"Good\", \"text\": \"fine\"}\n{\"title\": \"Bad\"\n",
    )
    .expect("can write dataset");

    assert!(database.import_jsonl(&dataset).await.is_err());
    assert_eq!(
        database
            .count_documents()
            .await
            .expect("should count documents"),
        0
    );
}
