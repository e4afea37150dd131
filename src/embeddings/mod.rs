// Embeddings module
// Handles text-to-vector conversion through a local Ollama instance

pub mod ollama;

pub use ollama::{DEFAULT_EMBEDDING_DIMENSION, OllamaClient};
