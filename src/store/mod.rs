// Vector store module
// Handles vector storage and filtered similarity search for recipe embeddings


pub mod filter;
pub mod vector_store;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{RecipeError, Result};

pub use filter::{Condition, Filter};
pub use vector_store::VectorStore;

/// Column names reserved for the core schema; payload fields may not use them.
pub const RESERVED_COLUMNS: &[&str] = &["id", "vector", "created_at", "_distance"];

/// Distance metric used by a collection for similarity search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    Dot,
}

impl DistanceMetric {
    /// Convert a raw distance reported by the store into a similarity score
    /// where higher is better.
    #[inline]
    pub fn similarity_from_distance(self, distance: f32) -> f32 {
        match self {
            Self::Cosine => 1.0 - distance,
            Self::L2 | Self::Dot => -distance,
        }
    }
}

impl fmt::Display for DistanceMetric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::L2 => write!(f, "l2"),
            Self::Dot => write!(f, "dot"),
        }
    }
}

/// Value kinds allowed in a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Text,
    Number,
    Flag,
    TextList,
}

impl fmt::Display for PayloadKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Flag => write!(f, "flag"),
            Self::TextList => write!(f, "text_list"),
        }
    }
}

/// A single payload value, restricted to a closed set of kinds
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Text(String),
    Number(f64),
    Flag(bool),
    TextList(Vec<String>),
}

impl PayloadValue {
    #[inline]
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Text(_) => PayloadKind::Text,
            Self::Number(_) => PayloadKind::Number,
            Self::Flag(_) => PayloadKind::Flag,
            Self::TextList(_) => PayloadKind::TextList,
        }
    }

    /// Convert a JSON value into a payload value, rejecting shapes outside
    /// the closed kind set (objects, nested arrays, nulls).
    #[inline]
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                RecipeError::InvalidInput(format!("unrepresentable number: {}", n))
            }),
            serde_json::Value::Bool(b) => Ok(Self::Flag(*b)),
            serde_json::Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(s) => list.push(s.clone()),
                        other => {
                            return Err(RecipeError::InvalidInput(format!(
                                "list payload values must be strings, got: {}",
                                other
                            )));
                        }
                    }
                }
                Ok(Self::TextList(list))
            }
            other => Err(RecipeError::InvalidInput(format!(
                "unsupported payload value: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PayloadValue {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Flag(b) => write!(f, "{}", b),
            Self::TextList(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Payload metadata carried alongside a vector, keyed by declared field name
pub type Payload = BTreeMap<String, PayloadValue>;

/// A declared payload field of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadField {
    pub name: String,
    pub kind: PayloadKind,
}

/// Schema of a named collection: vector dimension, distance metric, and the
/// payload fields stored alongside each vector
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub payload_fields: Vec<PayloadField>,
}

impl CollectionSpec {
    /// Look up a declared payload field by name.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&PayloadField> {
        self.payload_fields.iter().find(|f| f.name == name)
    }

    /// Validate a payload against the declared fields. Every key must name a
    /// declared field and carry a value of the declared kind; missing fields
    /// are allowed and stored as null.
    #[inline]
    pub fn validate_payload(&self, payload: &Payload) -> Result<()> {
        for (key, value) in payload {
            let field = self.field(key).ok_or_else(|| {
                RecipeError::InvalidInput(format!("undeclared payload field '{}'", key))
            })?;
            if value.kind() != field.kind {
                return Err(RecipeError::InvalidInput(format!(
                    "payload field '{}' expects {}, got {}",
                    key,
                    field.kind,
                    value.kind()
                )));
            }
        }
        Ok(())
    }
}

/// A point to be upserted: (id, vector, payload)
#[derive(Debug, Clone, PartialEq)]
pub struct RecipePoint {
    /// Unique identifier; upserting the same id replaces the stored entry
    pub id: String,
    /// The embedding vector; length must equal the collection dimension
    pub vector: Vec<f32>,
    /// Payload metadata carried alongside but not embedded
    pub payload: Payload,
}

/// A single similarity search result
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    /// Similarity score, higher is better; results are ordered descending
    pub score: f32,
    pub payload: Payload,
}
