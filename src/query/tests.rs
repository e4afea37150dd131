use super::*;
use crate::config::{Config, EmbeddingConfig, StoreConfig};
use tempfile::TempDir;

#[tokio::test]
async fn empty_query_is_rejected_before_embedding() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        embedding: EmbeddingConfig::default(),
        store: StoreConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    };

    let client = OllamaClient::new(&config).expect("should create client");
    let store = VectorStore::new(&config).await.expect("should create store");
    let searcher = Searcher::new(client, store, config.collection_spec());

    let err = searcher
        .search("   ", None, 10)
        .await
        .expect_err("empty query should be rejected");
    assert!(matches!(err, RecipeError::InvalidInput(_)));
}
