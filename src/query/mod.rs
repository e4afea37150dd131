// Query driver
// Embeds a free-text query and surfaces ranked matches from the store

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::embeddings::ollama::OllamaClient;
use crate::store::{CollectionSpec, Filter, ScoredPoint, VectorStore};
use crate::{RecipeError, Result};

/// Drives the query path: one embedding call followed by one search call.
pub struct Searcher {
    client: OllamaClient,
    store: VectorStore,
    spec: CollectionSpec,
}

impl Searcher {
    #[inline]
    pub fn new(client: OllamaClient, store: VectorStore, spec: CollectionSpec) -> Self {
        Self {
            client,
            store,
            spec,
        }
    }

    /// Return up to `limit` matches for the query text, ordered by descending
    /// similarity, optionally restricted by a payload filter.
    #[inline]
    pub async fn search(
        &self,
        query: &str,
        filter: Option<&Filter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        if query.trim().is_empty() {
            return Err(RecipeError::InvalidInput(
                "query text must not be empty".to_string(),
            ));
        }

        let limit = limit.max(1);

        debug!("Searching '{}' for: {}", self.spec.name, query);

        let query_vector = self.client.embed(query)?;

        self.store
            .search(&self.spec, &query_vector, filter, limit)
            .await
    }
}
