use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecipeError>;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Failed to ingest record '{record_id}': {source}")]
    Ingestion {
        record_id: String,
        #[source]
        source: Box<RecipeError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RecipeError {
    /// Wrap an error as a per-record ingestion failure.
    #[inline]
    pub fn ingestion(record_id: impl Into<String>, source: RecipeError) -> Self {
        Self::Ingestion {
            record_id: record_id.into(),
            source: Box::new(source),
        }
    }
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod ingest;
pub mod query;
pub mod records;
pub mod store;
