use super::*;
use crate::config::{Config, EmbeddingConfig, StoreConfig};
use crate::store::Filter;
use tempfile::TempDir;

fn create_test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        embedding: EmbeddingConfig {
            dimension: 4,
            ..EmbeddingConfig::default()
        },
        store: StoreConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    };
    (config, temp_dir)
}

fn create_test_point(id: &str, vector: Vec<f32>, cuisine: &str) -> RecipePoint {
    let mut payload = Payload::new();
    payload.insert(
        "title".to_string(),
        PayloadValue::Text(format!("Recipe {}", id)),
    );
    payload.insert("cuisine".to_string(), PayloadValue::Text(cuisine.to_string()));
    payload.insert(
        "tags".to_string(),
        PayloadValue::TextList(vec!["dinner".to_string()]),
    );

    RecipePoint {
        id: id.to_string(),
        vector,
        payload,
    }
}

#[tokio::test]
async fn vector_store_initialization() {
    let (config, _temp_dir) = create_test_config();

    let result = VectorStore::new(&config).await;
    assert!(
        result.is_ok(),
        "Failed to initialize VectorStore: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn ensure_collection_is_idempotent() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();

    store
        .ensure_collection(&spec)
        .await
        .expect("first ensure should succeed");
    store
        .ensure_collection(&spec)
        .await
        .expect("second ensure should be a no-op");

    assert!(
        store
            .collection_exists(&spec.name)
            .await
            .expect("should check existence")
    );
}

#[tokio::test]
async fn ensure_collection_rejects_dimension_change() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();

    store
        .ensure_collection(&spec)
        .await
        .expect("should create collection");

    let mut changed = spec.clone();
    changed.dimension = 8;

    let err = store
        .ensure_collection(&changed)
        .await
        .expect_err("dimension change should be rejected");
    assert!(matches!(
        err,
        RecipeError::DimensionMismatch {
            expected: 8,
            actual: 4
        }
    ));
}

#[tokio::test]
async fn upsert_and_count() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();
    store
        .ensure_collection(&spec)
        .await
        .expect("should create collection");

    let points = vec![
        create_test_point("r1", vec![1.0, 0.0, 0.0, 0.0], "italian"),
        create_test_point("r2", vec![0.0, 1.0, 0.0, 0.0], "french"),
    ];

    store
        .upsert(&spec, points)
        .await
        .expect("upsert should succeed");

    let count = store.count(&spec).await.expect("should count");
    assert_eq!(count, 2);
}

#[tokio::test]
async fn upsert_replaces_existing_id() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();
    store
        .ensure_collection(&spec)
        .await
        .expect("should create collection");

    store
        .upsert(
            &spec,
            vec![create_test_point("r1", vec![1.0, 0.0, 0.0, 0.0], "italian")],
        )
        .await
        .expect("first upsert should succeed");

    store
        .upsert(
            &spec,
            vec![create_test_point("r1", vec![0.0, 0.0, 1.0, 0.0], "mexican")],
        )
        .await
        .expect("second upsert should succeed");

    let count = store.count(&spec).await.expect("should count");
    assert_eq!(count, 1, "upsert must not duplicate ids");

    let results = store
        .search(&spec, &[0.0, 0.0, 1.0, 0.0], None, 5)
        .await
        .expect("search should succeed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "r1");
    assert_eq!(
        results[0].payload.get("cuisine"),
        Some(&PayloadValue::Text("mexican".to_string())),
        "replacement must reflect the latest payload"
    );
}

#[tokio::test]
async fn search_returns_self_retrieval_top_hit() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();
    store
        .ensure_collection(&spec)
        .await
        .expect("should create collection");

    store
        .upsert(
            &spec,
            vec![
                create_test_point("r1", vec![1.0, 0.0, 0.0, 0.0], "italian"),
                create_test_point("r2", vec![0.0, 1.0, 0.0, 0.0], "french"),
                create_test_point("r3", vec![0.0, 0.0, 1.0, 0.0], "thai"),
            ],
        )
        .await
        .expect("upsert should succeed");

    let results = store
        .search(&spec, &[1.0, 0.0, 0.0, 0.0], None, 10)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id, "r1", "exact vector should be the top hit");

    for window in results.windows(2) {
        assert!(
            window[0].score >= window[1].score,
            "results must be in descending score order"
        );
    }
}

#[tokio::test]
async fn upsert_rejects_wrong_dimension_and_leaves_collection_unchanged() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();
    store
        .ensure_collection(&spec)
        .await
        .expect("should create collection");

    store
        .upsert(
            &spec,
            vec![create_test_point("r1", vec![1.0, 0.0, 0.0, 0.0], "italian")],
        )
        .await
        .expect("valid upsert should succeed");

    let err = store
        .upsert(
            &spec,
            vec![
                create_test_point("r2", vec![0.0, 1.0, 0.0, 0.0], "french"),
                create_test_point("r3", vec![0.0, 1.0], "thai"),
            ],
        )
        .await
        .expect_err("wrong dimension should be rejected");

    assert!(matches!(
        err,
        RecipeError::DimensionMismatch {
            expected: 4,
            actual: 2
        }
    ));

    let count = store.count(&spec).await.expect("should count");
    assert_eq!(count, 1, "failed upsert must not write any rows");
}

#[tokio::test]
async fn search_missing_collection_fails_with_collection_not_found() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();

    let err = store
        .search(&spec, &[0.0, 0.0, 0.0, 0.0], None, 5)
        .await
        .expect_err("missing collection should fail");
    assert!(matches!(err, RecipeError::CollectionNotFound(_)));
}

#[tokio::test]
async fn search_with_payload_filter() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();
    store
        .ensure_collection(&spec)
        .await
        .expect("should create collection");

    store
        .upsert(
            &spec,
            vec![
                create_test_point("r1", vec![1.0, 0.0, 0.0, 0.0], "italian"),
                create_test_point("r2", vec![0.9, 0.1, 0.0, 0.0], "french"),
            ],
        )
        .await
        .expect("upsert should succeed");

    let filter = Filter::new().equals("cuisine", PayloadValue::Text("french".to_string()));
    let results = store
        .search(&spec, &[1.0, 0.0, 0.0, 0.0], Some(&filter), 10)
        .await
        .expect("filtered search should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "r2");
}

#[tokio::test]
async fn upsert_rejects_undeclared_payload_field() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config).await.expect("should create store");
    let spec = config.collection_spec();
    store
        .ensure_collection(&spec)
        .await
        .expect("should create collection");

    let mut point = create_test_point("r1", vec![1.0, 0.0, 0.0, 0.0], "italian");
    point
        .payload
        .insert("calories".to_string(), PayloadValue::Number(250.0));

    let err = store
        .upsert(&spec, vec![point])
        .await
        .expect_err("undeclared field should be rejected");
    assert!(matches!(err, RecipeError::InvalidInput(_)));
}
