use super::*;
use crate::config::{Config, EmbeddingConfig, StoreConfig};

fn config_with_embedding(embedding: EmbeddingConfig) -> Config {
    Config {
        embedding,
        store: StoreConfig::default(),
        base_dir: std::path::PathBuf::new(),
    }
}

#[test]
fn client_configuration() {
    let config = config_with_embedding(EmbeddingConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
        dimension: 384,
    });
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.dimension(), 384);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = config_with_embedding(EmbeddingConfig::default());
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn embed_rejects_empty_text() {
    let config = config_with_embedding(EmbeddingConfig::default());
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let err = client.embed("").expect_err("empty text should be rejected");
    assert!(matches!(err, RecipeError::InvalidInput(_)));

    let err = client
        .embed("   \n\t ")
        .expect_err("whitespace-only text should be rejected");
    assert!(matches!(err, RecipeError::InvalidInput(_)));
}

#[test]
fn embed_batch_rejects_empty_member() {
    let config = config_with_embedding(EmbeddingConfig::default());
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let err = client
        .embed_batch(&["tomato soup".to_string(), String::new()])
        .expect_err("batch with empty member should be rejected");
    assert!(matches!(err, RecipeError::InvalidInput(_)));
}

#[test]
fn embed_batch_empty_input_returns_empty() {
    let config = config_with_embedding(EmbeddingConfig::default());
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let results = client.embed_batch(&[]).expect("empty batch should succeed");
    assert!(results.is_empty());
}

#[test]
fn check_dimension_enforces_configured_dimension() {
    let config = config_with_embedding(EmbeddingConfig {
        dimension: 4,
        ..EmbeddingConfig::default()
    });
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert!(client.check_dimension(&[0.1, 0.2, 0.3, 0.4]).is_ok());

    let err = client
        .check_dimension(&[0.1, 0.2])
        .expect_err("short vector should be rejected");
    assert!(matches!(err, RecipeError::EmbeddingUnavailable(_)));
}
