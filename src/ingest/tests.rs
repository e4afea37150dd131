use super::*;
use crate::config::{Config, EmbeddingConfig, StoreConfig};
use tempfile::TempDir;

async fn create_test_ingestor() -> (Ingestor, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        embedding: EmbeddingConfig {
            dimension: 4,
            ..EmbeddingConfig::default()
        },
        store: StoreConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    };

    let client = OllamaClient::new(&config).expect("should create client");
    let store = VectorStore::new(&config).await.expect("should create store");
    let ingestor = Ingestor::new(client, store, config.collection_spec());

    (ingestor, temp_dir)
}

#[tokio::test]
async fn empty_batch_produces_empty_report() {
    let (ingestor, _temp_dir) = create_test_ingestor().await;

    let report = ingestor
        .ingest_records(Vec::new())
        .await
        .expect("empty ingest should succeed");

    assert_eq!(report.records, 0);
}

#[tokio::test]
async fn missing_input_file_is_rejected() {
    let (ingestor, temp_dir) = create_test_ingestor().await;

    let err = ingestor
        .ingest_file(&temp_dir.path().join("no-such-file.jsonl"))
        .await
        .expect_err("missing file should fail");
    assert!(matches!(err, RecipeError::InvalidInput(_)));
}

#[tokio::test]
async fn malformed_input_file_is_rejected_before_any_write() {
    let (ingestor, temp_dir) = create_test_ingestor().await;

    let path = temp_dir.path().join("bad.jsonl");
    std::fs::write(&path, "{\"id\": \"r1\"}\n").expect("should write file");

    let err = ingestor
        .ingest_file(&path)
        .await
        .expect_err("record without text should fail");
    assert!(matches!(err, RecipeError::InvalidInput(_)));

    // Validation happens before the collection is touched.
    assert!(
        !ingestor
            .store
            .collection_exists(&ingestor.spec.name)
            .await
            .expect("should check existence")
    );
}

#[tokio::test]
async fn batch_size_is_clamped_to_at_least_one() {
    let (ingestor, _temp_dir) = create_test_ingestor().await;
    let ingestor = ingestor.with_batch_size(0);

    assert_eq!(ingestor.batch_size, 1);
}
