use super::*;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config {
        embedding: EmbeddingConfig::default(),
        store: StoreConfig::default(),
        base_dir: PathBuf::new(),
    };
    assert!(config.validate().is_ok());
}

#[test]
fn load_returns_defaults_when_file_missing() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");
    assert_eq!(config.embedding, EmbeddingConfig::default());
    assert_eq!(config.store, StoreConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load(temp_dir.path()).expect("should load defaults");
    config.embedding.model = "mxbai-embed-large".to_string();
    config.embedding.dimension = 1024;
    config.store.collection = "test-recipes".to_string();
    config.save().expect("should save");

    let reloaded = Config::load(temp_dir.path()).expect("should reload");
    assert_eq!(reloaded.embedding.model, "mxbai-embed-large");
    assert_eq!(reloaded.embedding.dimension, 1024);
    assert_eq!(reloaded.store.collection, "test-recipes");
}

#[test]
fn partial_config_file_uses_defaults_for_missing_sections() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[embedding]\nmodel = \"custom-model\"\n",
    )
    .expect("should write config");

    let config = Config::load(temp_dir.path()).expect("should load");
    assert_eq!(config.embedding.model, "custom-model");
    assert_eq!(config.embedding.port, 11434);
    assert_eq!(config.store, StoreConfig::default());
}

#[test]
fn embedding_validation_rejects_bad_values() {
    let mut config = EmbeddingConfig::default();
    assert!(config.set_protocol("gopher".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model("  ".to_string()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_batch_size(2000).is_err());
    assert!(config.set_dimension(16).is_err());

    assert!(config.set_model("nomic-embed-text:latest".to_string()).is_ok());
    assert!(config.set_dimension(768).is_ok());
    assert!(config.validate().is_ok());
}

#[test]
fn embedding_url_is_built_from_parts() {
    let config = EmbeddingConfig {
        protocol: "https".to_string(),
        host: "embeddings.internal".to_string(),
        port: 8443,
        ..EmbeddingConfig::default()
    };

    let url = config.url().expect("should build url");
    assert_eq!(url.as_str(), "https://embeddings.internal:8443/");
}

#[test]
fn store_validation_rejects_bad_collection_names() {
    let mut config = StoreConfig::default();
    config.collection = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidCollectionName(_))
    ));

    config.collection = "my recipes".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidCollectionName(_))
    ));
}

#[test]
fn store_validation_rejects_reserved_payload_fields() {
    let mut config = StoreConfig::default();
    config.payload_fields.push(PayloadField {
        name: "vector".to_string(),
        kind: PayloadKind::Text,
    });

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ReservedPayloadFieldName(_))
    ));
}

#[test]
fn store_validation_rejects_duplicate_payload_fields() {
    let mut config = StoreConfig::default();
    config.payload_fields.push(PayloadField {
        name: "cuisine".to_string(),
        kind: PayloadKind::Number,
    });

    assert!(matches!(
        config.validate(),
        Err(ConfigError::DuplicatePayloadField(_))
    ));
}

#[test]
fn store_validation_rejects_malformed_field_names() {
    let mut config = StoreConfig::default();
    config.payload_fields.push(PayloadField {
        name: "1st_field".to_string(),
        kind: PayloadKind::Text,
    });

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidPayloadFieldName(_))
    ));
}

#[test]
fn collection_spec_reflects_settings() {
    let config = Config {
        embedding: EmbeddingConfig {
            dimension: 384,
            ..EmbeddingConfig::default()
        },
        store: StoreConfig::default(),
        base_dir: PathBuf::from("/tmp/recipe-search"),
    };

    let spec = config.collection_spec();
    assert_eq!(spec.name, "recipes");
    assert_eq!(spec.dimension, 384);
    assert_eq!(spec.metric, crate::store::DistanceMetric::Cosine);
    assert_eq!(spec.payload_fields.len(), 4);
}
