// Ingestion driver
// Orchestrates loading, embedding, and upserting recipe records

#[cfg(test)]
mod tests;

use std::path::Path;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::RecipeError;
use crate::Result;
use crate::embeddings::ollama::OllamaClient;
use crate::records::{RecipeRecord, load_records};
use crate::store::{CollectionSpec, RecipePoint, VectorStore};

const DEFAULT_UPSERT_BATCH_SIZE: usize = 64;

/// Drives the ingestion path: for each record, compute an embedding and
/// upsert it into the collection.
///
/// Failure policy is fail-fast: the first record that cannot be embedded or
/// stored aborts the run with an error naming that record. Upserts are
/// idempotent, so an aborted run can simply be re-run.
pub struct Ingestor {
    client: OllamaClient,
    store: VectorStore,
    spec: CollectionSpec,
    batch_size: usize,
}

/// Summary of a completed ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub records: usize,
    pub elapsed: Duration,
}

impl Ingestor {
    #[inline]
    pub fn new(client: OllamaClient, store: VectorStore, spec: CollectionSpec) -> Self {
        Self {
            client,
            store,
            spec,
            batch_size: DEFAULT_UPSERT_BATCH_SIZE,
        }
    }

    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Ingest all records from a JSON Lines file.
    #[inline]
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let records = load_records(path, &self.spec)?;

        self.store.ensure_collection(&self.spec).await?;

        self.ingest_records(records).await
    }

    /// Ingest a batch of already-validated records. The collection must
    /// exist.
    #[inline]
    pub async fn ingest_records(&self, records: Vec<RecipeRecord>) -> Result<IngestReport> {
        let started = Instant::now();
        let total = records.len();

        info!("Ingesting {} records into '{}'", total, self.spec.name);

        let progress = ProgressBar::new(total as u64);

        for chunk in records.chunks(self.batch_size) {
            let embeddings = self.embed_chunk(chunk)?;

            let points: Vec<RecipePoint> = chunk
                .iter()
                .zip(embeddings)
                .map(|(record, vector)| RecipePoint {
                    id: record.id.clone(),
                    vector,
                    payload: record.payload.clone(),
                })
                .collect();

            self.upsert_chunk(points).await?;
            progress.inc(chunk.len() as u64);
        }

        progress.finish_and_clear();

        let report = IngestReport {
            records: total,
            elapsed: started.elapsed(),
        };

        info!(
            "Ingested {} records in {:.2}s",
            report.records,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    /// Embed one chunk of records. The batch endpoint is tried first; if it
    /// fails, records are embedded individually so the failure can be
    /// attributed to a specific record id.
    fn embed_chunk(&self, chunk: &[RecipeRecord]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunk.iter().map(|r| r.text.clone()).collect();

        match self.client.embed_batch(&texts) {
            Ok(embeddings) => Ok(embeddings),
            Err(batch_error) => {
                warn!(
                    "Batch embedding failed ({}), retrying records individually",
                    batch_error
                );

                let mut embeddings = Vec::with_capacity(chunk.len());
                for record in chunk {
                    let vector = self
                        .client
                        .embed(&record.text)
                        .map_err(|e| RecipeError::ingestion(&record.id, e))?;
                    embeddings.push(vector);
                }
                Ok(embeddings)
            }
        }
    }

    /// Upsert one chunk of points, falling back to per-point upserts on
    /// failure to find the offending record.
    async fn upsert_chunk(&self, points: Vec<RecipePoint>) -> Result<()> {
        let batch_error = match self.store.upsert(&self.spec, points.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!(
            "Batch upsert failed ({}), retrying points individually",
            batch_error
        );

        for point in points {
            let id = point.id.clone();
            self.store
                .upsert(&self.spec, vec![point])
                .await
                .map_err(|e| RecipeError::ingestion(id, e))?;
        }

        debug!("Per-point upsert fallback succeeded");
        Ok(())
    }
}
