//! # Document Store Port
//!
//! Defines the port interface for the hosted document database that owns
//! packages, destinations, favorites and notifications. Documents are
//! schemaless JSON objects addressed by `$id`; callers normalize them into
//! typed records at the boundary (see [`crate::models`]).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Debug;

/// A stored document: its identifier plus arbitrary JSON fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    #[serde(rename = "$id")]
    pub id: String,
    /// Remaining document fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document from an id and a field map
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a JSON object carrying a `$id` key
    pub fn from_value(value: Value) -> StoreResult<Self> {
        serde_json::from_value(value).map_err(|e| StoreError::InvalidDocument(e.to_string()))
    }

    /// Look up a single field
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        if attribute == "$id" {
            return None;
        }
        self.fields.get(attribute)
    }

    /// Deserialize the whole document (including `$id`) into a typed record
    pub fn parse<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut object = self.fields.clone();
        object.insert("$id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(object)).map_err(|e| {
            StoreError::InvalidDocument(format!("document {}: {e}", self.id))
        })
    }
}

/// Query DSL understood by every document store implementation
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentQuery {
    /// Attribute equals any of the values (for arrays: contains any of them)
    Equal { attribute: String, values: Vec<Value> },
    /// Full-text style search on a string attribute
    Search { attribute: String, text: String },
    /// Array attribute holds the value (directly or as an embedded `$id`),
    /// or string attribute contains it
    Contains { attribute: String, value: String },
    /// Maximum number of documents to return
    Limit(usize),
    /// Number of documents to skip
    Offset(usize),
    /// Ascending order on an attribute
    OrderAsc(String),
    /// Descending order on an attribute
    OrderDesc(String),
}

impl DocumentQuery {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn search(attribute: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Search {
            attribute: attribute.into(),
            text: text.into(),
        }
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Encode the query the way the hosted backend's REST API expects it
    pub fn to_wire(&self) -> String {
        let value = match self {
            Self::Equal { attribute, values } => {
                json!({ "method": "equal", "attribute": attribute, "values": values })
            }
            Self::Search { attribute, text } => {
                json!({ "method": "search", "attribute": attribute, "values": [text] })
            }
            Self::Contains { attribute, value } => {
                json!({ "method": "contains", "attribute": attribute, "values": [value] })
            }
            Self::Limit(limit) => json!({ "method": "limit", "values": [limit] }),
            Self::Offset(offset) => json!({ "method": "offset", "values": [offset] }),
            Self::OrderAsc(attribute) => json!({ "method": "orderAsc", "attribute": attribute }),
            Self::OrderDesc(attribute) => {
                json!({ "method": "orderDesc", "attribute": attribute })
            }
        };
        value.to_string()
    }
}

/// Errors reported by document store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    Conflict { collection: String, id: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Port interface for the backing document store
///
/// Collections are addressed by name. `list` returns documents in store
/// order after applying the query DSL; nothing else is promised about
/// ordering.
#[async_trait]
pub trait DocumentStorePort: Send + Sync + Debug {
    /// Name of the implementation for logging
    fn name(&self) -> &'static str;

    /// List documents of a collection matching all queries
    async fn list(&self, collection: &str, queries: &[DocumentQuery]) -> StoreResult<Vec<Document>>;

    /// Fetch a single document by id
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Create a document; a fresh id is generated when `id` is `None`
    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
    ) -> StoreResult<Document>;

    /// Shallow-merge `patch` into an existing document
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> StoreResult<Document>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Check that the store is reachable
    async fn health_check(&self) -> StoreResult<bool>;
}
