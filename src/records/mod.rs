// Recipe record loading
// Parses JSON Lines input into validated records ready for ingestion


use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::store::{CollectionSpec, Payload, PayloadValue};
use crate::{RecipeError, Result};

/// A single recipe to be ingested: a unique id, the text that gets embedded,
/// and payload metadata carried alongside
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRecord {
    pub id: String,
    pub text: String,
    pub payload: Payload,
}

impl RecipeRecord {
    /// Construct a record, enforcing the required fields.
    #[inline]
    pub fn new(id: impl Into<String>, text: impl Into<String>, payload: Payload) -> Result<Self> {
        let id = id.into();
        let text = text.into();

        if id.trim().is_empty() {
            return Err(RecipeError::InvalidInput(
                "record id must not be empty".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(RecipeError::InvalidInput(format!(
                "record '{}' has no text to embed",
                id
            )));
        }

        Ok(Self { id, text, payload })
    }
}

/// Load records from a JSON Lines file, one recipe object per line.
///
/// Each object must carry `id` and `text`; every other key is payload and is
/// validated against the collection's declared fields. Duplicate ids within
/// one file are rejected so the resulting upserts are unambiguous.
#[inline]
pub fn load_records(path: &Path, spec: &CollectionSpec) -> Result<Vec<RecipeRecord>> {
    debug!("Loading records from {:?}", path);

    let file = File::open(path).map_err(|e| {
        RecipeError::InvalidInput(format!("cannot open {}: {}", path.display(), e))
    })?;

    parse_records(BufReader::new(file), spec)
}

/// Parse JSON Lines from any reader; see [`load_records`].
#[inline]
pub fn parse_records(reader: impl BufRead, spec: &CollectionSpec) -> Result<Vec<RecipeRecord>> {
    let mut records = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_line(&line, spec)
            .map_err(|e| RecipeError::InvalidInput(format!("line {}: {}", line_number, e)))?;

        if !seen_ids.insert(record.id.clone()) {
            return Err(RecipeError::InvalidInput(format!(
                "line {}: duplicate record id '{}'",
                line_number, record.id
            )));
        }

        records.push(record);
    }

    debug!("Loaded {} records", records.len());
    Ok(records)
}

fn parse_line(line: &str, spec: &CollectionSpec) -> Result<RecipeRecord> {
    let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| RecipeError::InvalidInput(format!("invalid JSON: {}", e)))?;

    let object = value.as_object().ok_or_else(|| {
        RecipeError::InvalidInput("each line must be a JSON object".to_string())
    })?;

    let id = match object.get("id") {
        Some(serde_json::Value::String(s)) => s.clone(),
        // Numeric ids are common in exported recipe data; normalize them.
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(RecipeError::InvalidInput(format!(
                "id must be a string or number, got: {}",
                other
            )));
        }
        None => {
            return Err(RecipeError::InvalidInput(
                "missing required field 'id'".to_string(),
            ));
        }
    };

    let text = match object.get("text") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(RecipeError::InvalidInput(format!(
                "text must be a string, got: {}",
                other
            )));
        }
        None => {
            return Err(RecipeError::InvalidInput(
                "missing required field 'text'".to_string(),
            ));
        }
    };

    let mut payload = Payload::new();
    for (key, raw) in object {
        if key == "id" || key == "text" {
            continue;
        }
        let value = PayloadValue::from_json(raw)
            .map_err(|e| RecipeError::InvalidInput(format!("payload field '{}': {}", key, e)))?;
        payload.insert(key.clone(), value);
    }

    spec.validate_payload(&payload)?;

    RecipeRecord::new(id, text, payload)
}
