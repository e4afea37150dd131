#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{
    Array, BooleanArray, FixedSizeListArray, Float32Array, Float64Array, ListArray,
    ListBuilder, RecordBatchIterator, StringArray, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use futures::TryStreamExt;
use itertools::Itertools;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use tracing::{debug, error, info, warn};

use super::{
    CollectionSpec, DistanceMetric, Filter, Payload, PayloadKind, PayloadValue, RecipePoint,
    ScoredPoint,
};
use crate::{RecipeError, Result, config::Config};

/// Vector database store using LanceDB for persistence and similarity search
pub struct VectorStore {
    connection: Connection,
}

impl VectorStore {
    /// Open (or create) the LanceDB database under the configured base
    /// directory.
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RecipeError::Store(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());

        let connection = match lancedb::connect(&uri).execute().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to connect to LanceDB: {}", e);

                let error_msg = e.to_string().to_lowercase();
                if error_msg.contains("corrupt")
                    || error_msg.contains("invalid")
                    || error_msg.contains("malformed")
                {
                    warn!("Database corruption detected, attempting recovery");
                    Self::attempt_corruption_recovery(&db_path)?;

                    lancedb::connect(&uri).execute().await.map_err(|e| {
                        RecipeError::Store(format!(
                            "Failed to connect to LanceDB after recovery: {}",
                            e
                        ))
                    })?
                } else {
                    return Err(RecipeError::Store(format!(
                        "Failed to connect to LanceDB: {}",
                        e
                    )));
                }
            }
        };

        info!("Vector store initialized successfully");
        Ok(Self { connection })
    }

    /// Create the collection if it does not exist. Idempotent; fails with
    /// `DimensionMismatch` if the collection exists with a different vector
    /// dimension.
    #[inline]
    pub async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let table_names = self.table_names().await?;

        if table_names.contains(&spec.name) {
            let actual = self.existing_dimension(&spec.name).await?;
            if actual != spec.dimension {
                return Err(RecipeError::DimensionMismatch {
                    expected: spec.dimension,
                    actual,
                });
            }
            debug!(
                "Collection '{}' already exists with dimension {}",
                spec.name, actual
            );
            return Ok(());
        }

        let schema = build_schema(spec);
        self.connection
            .create_empty_table(&spec.name, schema)
            .execute()
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to create collection: {}", e)))?;

        info!(
            "Created collection '{}' with {} dimensions ({} metric)",
            spec.name, spec.dimension, spec.metric
        );
        Ok(())
    }

    /// Whether the collection exists in the database.
    #[inline]
    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.table_names().await?.contains(&name.to_string()))
    }

    /// Insert or replace points keyed by id.
    ///
    /// Every point is validated against the collection spec before any write,
    /// so a bad point leaves the collection unchanged.
    #[inline]
    pub async fn upsert(&self, spec: &CollectionSpec, points: Vec<RecipePoint>) -> Result<()> {
        if points.is_empty() {
            debug!("No points to upsert");
            return Ok(());
        }

        let table = self.open_table(&spec.name).await?;

        for point in &points {
            if point.id.trim().is_empty() {
                return Err(RecipeError::InvalidInput(
                    "point id must not be empty".to_string(),
                ));
            }
            if point.vector.len() != spec.dimension {
                return Err(RecipeError::DimensionMismatch {
                    expected: spec.dimension,
                    actual: point.vector.len(),
                });
            }
            spec.validate_payload(&point.payload)?;
        }

        debug!("Upserting {} points into '{}'", points.len(), spec.name);

        // Replace semantics: drop any existing rows for these ids, then append.
        let ids = points
            .iter()
            .map(|p| format!("'{}'", p.id.replace('\'', "''")))
            .join(", ");
        table
            .delete(&format!("id IN ({})", ids))
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to replace existing points: {}", e)))?;

        let record_batch = build_record_batch(spec, &points)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to insert points: {}", e)))?;

        info!("Upserted {} points into '{}'", points.len(), spec.name);
        Ok(())
    }

    /// Search for the `top_k` nearest stored vectors, optionally restricted
    /// by a payload filter. Results are ordered by descending similarity.
    #[inline]
    pub async fn search(
        &self,
        spec: &CollectionSpec,
        query_vector: &[f32],
        filter: Option<&Filter>,
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>> {
        if query_vector.len() != spec.dimension {
            return Err(RecipeError::DimensionMismatch {
                expected: spec.dimension,
                actual: query_vector.len(),
            });
        }

        let table = self.open_table(&spec.name).await?;

        debug!(
            "Searching '{}' with top_k {} (filter: {})",
            spec.name,
            top_k,
            filter.is_some_and(|f| !f.is_empty())
        );

        let mut query = table
            .vector_search(query_vector)
            .map_err(|e| RecipeError::Store(format!("Failed to create vector search: {}", e)))?
            .distance_type(distance_type(spec.metric))
            .column("vector")
            .limit(top_k);

        if let Some(filter) = filter {
            if !filter.is_empty() {
                query = query.only_if(filter.to_predicate(spec)?);
            }
        }

        let mut stream = query
            .execute()
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to execute search: {}", e)))?;

        let mut results = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to read result stream: {}", e)))?
        {
            results.extend(parse_search_batch(spec, &batch)?);
        }

        // The store returns rows in ascending distance order; make the
        // descending-similarity ordering explicit.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!("Search returned {} results", results.len());
        Ok(results)
    }

    /// Number of points stored in the collection.
    #[inline]
    pub async fn count(&self, spec: &CollectionSpec) -> Result<usize> {
        let table = self.open_table(&spec.name).await?;

        table
            .count_rows(None)
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to count rows: {}", e)))
    }

    /// Drop the collection and all its points. Returns whether a collection
    /// was actually removed.
    #[inline]
    pub async fn clear(&self, spec: &CollectionSpec) -> Result<bool> {
        if !self.collection_exists(&spec.name).await? {
            return Ok(false);
        }

        self.connection
            .drop_table(&spec.name)
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to drop collection: {}", e)))?;

        info!("Dropped collection '{}'", spec.name);
        Ok(true)
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        self.connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to list collections: {}", e)))
    }

    async fn open_table(&self, name: &str) -> Result<lancedb::Table> {
        match self.connection.open_table(name).execute().await {
            Ok(table) => Ok(table),
            Err(lancedb::Error::TableNotFound { .. }) => {
                Err(RecipeError::CollectionNotFound(name.to_string()))
            }
            Err(e) => Err(RecipeError::Store(format!(
                "Failed to open collection '{}': {}",
                name, e
            ))),
        }
    }

    /// Read the vector dimension from an existing collection's schema.
    async fn existing_dimension(&self, name: &str) -> Result<usize> {
        let table = self.open_table(name).await?;

        let schema = table
            .schema()
            .await
            .map_err(|e| RecipeError::Store(format!("Failed to get collection schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(RecipeError::Store(format!(
            "Collection '{}' has no vector column",
            name
        )))
    }

    /// Attempt to recover from database corruption by moving the broken
    /// directory aside.
    fn attempt_corruption_recovery(db_path: &PathBuf) -> Result<()> {
        warn!("Attempting database corruption recovery at {:?}", db_path);

        if db_path.exists() {
            let backup_path = db_path.with_extension("corrupted_backup");
            if let Err(e) = std::fs::rename(db_path, &backup_path) {
                error!("Failed to backup corrupted database: {}", e);
            } else {
                info!("Corrupted database backed up to {:?}", backup_path);
            }
        }

        if db_path.exists() {
            std::fs::remove_dir_all(db_path).map_err(|e| {
                RecipeError::Store(format!("Failed to remove corrupted database: {}", e))
            })?;
        }

        info!("Database corruption recovery completed");
        Ok(())
    }
}

fn distance_type(metric: DistanceMetric) -> DistanceType {
    match metric {
        DistanceMetric::Cosine => DistanceType::Cosine,
        DistanceMetric::L2 => DistanceType::L2,
        DistanceMetric::Dot => DistanceType::Dot,
    }
}

/// Arrow schema for a collection: core columns plus one column per declared
/// payload field.
fn build_schema(spec: &CollectionSpec) -> Arc<Schema> {
    let mut fields = vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                spec.dimension as i32,
            ),
            false,
        ),
    ];

    for payload_field in &spec.payload_fields {
        fields.push(match payload_field.kind {
            PayloadKind::Text => Field::new(&payload_field.name, DataType::Utf8, true),
            PayloadKind::Number => Field::new(&payload_field.name, DataType::Float64, true),
            PayloadKind::Flag => Field::new(&payload_field.name, DataType::Boolean, true),
            PayloadKind::TextList => Field::new(
                &payload_field.name,
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
                true,
            ),
        });
    }

    fields.push(Field::new("created_at", DataType::Utf8, false));

    Arc::new(Schema::new(fields))
}

fn build_record_batch(spec: &CollectionSpec, points: &[RecipePoint]) -> Result<RecordBatch> {
    let len = points.len();
    let schema = build_schema(spec);

    let ids: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();

    let mut flat_values = Vec::with_capacity(len * spec.dimension);
    for point in points {
        flat_values.extend_from_slice(&point.vector);
    }
    let values_array = Float32Array::from(flat_values);
    let item_field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array = FixedSizeListArray::try_new(
        item_field,
        spec.dimension as i32,
        Arc::new(values_array),
        None,
    )
    .map_err(|e| RecipeError::Store(format!("Failed to create vector array: {}", e)))?;

    let mut arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
    ];

    for payload_field in &spec.payload_fields {
        arrays.push(build_payload_array(payload_field.kind, &payload_field.name, points));
    }

    let created_at = Utc::now().to_rfc3339();
    arrays.push(Arc::new(StringArray::from(vec![
        created_at.as_str();
        len
    ])));

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| RecipeError::Store(format!("Failed to create record batch: {}", e)))
}

fn build_payload_array(kind: PayloadKind, name: &str, points: &[RecipePoint]) -> Arc<dyn Array> {
    match kind {
        PayloadKind::Text => {
            let values: Vec<Option<&str>> = points
                .iter()
                .map(|p| match p.payload.get(name) {
                    Some(PayloadValue::Text(s)) => Some(s.as_str()),
                    _ => None,
                })
                .collect();
            Arc::new(StringArray::from(values))
        }
        PayloadKind::Number => {
            let values: Vec<Option<f64>> = points
                .iter()
                .map(|p| match p.payload.get(name) {
                    Some(PayloadValue::Number(n)) => Some(*n),
                    _ => None,
                })
                .collect();
            Arc::new(Float64Array::from(values))
        }
        PayloadKind::Flag => {
            let values: Vec<Option<bool>> = points
                .iter()
                .map(|p| match p.payload.get(name) {
                    Some(PayloadValue::Flag(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        PayloadKind::TextList => {
            let mut builder = ListBuilder::new(StringBuilder::new());
            for point in points {
                match point.payload.get(name) {
                    Some(PayloadValue::TextList(items)) => {
                        for item in items {
                            builder.values().append_value(item);
                        }
                        builder.append(true);
                    }
                    _ => builder.append(false),
                }
            }
            Arc::new(builder.finish())
        }
    }
}

fn parse_search_batch(spec: &CollectionSpec, batch: &RecordBatch) -> Result<Vec<ScoredPoint>> {
    let num_rows = batch.num_rows();
    let mut results = Vec::with_capacity(num_rows);

    let ids = batch
        .column_by_name("id")
        .ok_or_else(|| RecipeError::Store("Missing id column".to_string()))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RecipeError::Store("Invalid id column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    for row in 0..num_rows {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        results.push(ScoredPoint {
            id: ids.value(row).to_string(),
            score: spec.metric.similarity_from_distance(distance),
            payload: parse_payload_row(spec, batch, row)?,
        });
    }

    Ok(results)
}

fn parse_payload_row(spec: &CollectionSpec, batch: &RecordBatch, row: usize) -> Result<Payload> {
    let mut payload = Payload::new();

    for field in &spec.payload_fields {
        let column = batch.column_by_name(&field.name).ok_or_else(|| {
            RecipeError::Store(format!("Missing payload column '{}'", field.name))
        })?;

        if column.is_null(row) {
            continue;
        }

        let value = match field.kind {
            PayloadKind::Text => {
                let values = column
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| invalid_column(&field.name))?;
                PayloadValue::Text(values.value(row).to_string())
            }
            PayloadKind::Number => {
                let values = column
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| invalid_column(&field.name))?;
                PayloadValue::Number(values.value(row))
            }
            PayloadKind::Flag => {
                let values = column
                    .as_any()
                    .downcast_ref::<BooleanArray>()
                    .ok_or_else(|| invalid_column(&field.name))?;
                PayloadValue::Flag(values.value(row))
            }
            PayloadKind::TextList => {
                let values = column
                    .as_any()
                    .downcast_ref::<ListArray>()
                    .ok_or_else(|| invalid_column(&field.name))?;
                let items = values.value(row);
                let items = items
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| invalid_column(&field.name))?;
                PayloadValue::TextList(
                    (0..items.len()).map(|i| items.value(i).to_string()).collect(),
                )
            }
        };

        payload.insert(field.name.clone(), value);
    }

    Ok(payload)
}

fn invalid_column(name: &str) -> RecipeError {
    RecipeError::Store(format!("Invalid payload column type for '{}'", name))
}
