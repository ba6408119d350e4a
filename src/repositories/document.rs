//! # In-Memory Document Store
//!
//! Insertion-ordered collections of JSON documents implementing
//! [`DocumentStorePort`]. Query semantics mirror the hosted backend closely
//! enough for the services in this crate: filters first, then ordering,
//! offset and limit.

use super::{Repository, RepositoryStats};
use crate::ports::{Document, DocumentQuery, DocumentStorePort, StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// In-memory implementation of [`DocumentStorePort`]
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    /// Documents per collection, in insertion order
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
    /// Repository statistics
    stats: Arc<RwLock<RepositoryStats>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON fixture file of the form
    /// `{ "<collection>": [ { "$id": "...", ... }, ... ] }`
    pub async fn from_fixture_file(path: &Path) -> StoreResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            StoreError::Unavailable(format!("cannot read fixtures {}: {e}", path.display()))
        })?;
        let fixtures: HashMap<String, Vec<Value>> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;

        let store = Self::new();
        let mut total = 0;
        for (collection, documents) in fixtures {
            total += store.seed(&collection, documents).await?;
        }

        info!("Loaded {} fixture documents from {}", total, path.display());
        Ok(store)
    }

    /// Append raw documents to a collection, keeping their order
    pub async fn seed(&self, collection: &str, documents: Vec<Value>) -> StoreResult<usize> {
        let parsed = documents
            .into_iter()
            .map(Document::from_value)
            .collect::<StoreResult<Vec<_>>>()?;
        let count = parsed.len();

        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();

        // Reject the whole batch before touching the collection
        let mut seen = HashSet::new();
        for document in &parsed {
            if !seen.insert(document.id.as_str()) || entries.iter().any(|d| d.id == document.id) {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    id: document.id.clone(),
                });
            }
        }
        entries.extend(parsed);

        debug!("Seeded {} documents into {}", count, collection);
        Ok(count)
    }

    /// Record operation timing and update stats
    async fn record_operation(&self, start_time: Instant, success: bool) {
        let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        let mut stats = self.stats.write().await;
        if success {
            stats.record_success(duration_ms);
        } else {
            stats.record_failure(duration_ms);
        }
    }

    async fn finish<T>(&self, start_time: Instant, result: StoreResult<T>) -> StoreResult<T> {
        self.record_operation(start_time, result.is_ok()).await;
        result
    }
}

/// Id of a reference element: the string itself or an embedded `$id`
fn reference_id(value: &Value) -> Option<&str> {
    match value {
        Value::String(id) => Some(id),
        Value::Object(object) => object.get("$id").and_then(Value::as_str),
        _ => None,
    }
}

fn attribute<'a>(document: &'a Document, name: &str) -> Option<&'a Value> {
    document.get(name)
}

fn id_value(document: &Document) -> Value {
    Value::String(document.id.clone())
}

fn matches_query(document: &Document, query: &DocumentQuery) -> bool {
    match query {
        DocumentQuery::Equal { attribute: name, values } => {
            if name == "$id" {
                return values.contains(&id_value(document));
            }
            match attribute(document, name) {
                Some(Value::Array(items)) => items.iter().any(|item| {
                    values.contains(item)
                        || reference_id(item)
                            .is_some_and(|id| values.iter().any(|v| v.as_str() == Some(id)))
                }),
                Some(field) => values.contains(field),
                None => false,
            }
        }
        DocumentQuery::Search { attribute: name, text } => {
            let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
            if terms.is_empty() {
                return true;
            }
            attribute(document, name)
                .and_then(Value::as_str)
                .is_some_and(|field| {
                    let field = field.to_lowercase();
                    terms.iter().any(|term| field.contains(term.as_str()))
                })
        }
        DocumentQuery::Contains { attribute: name, value } => match attribute(document, name) {
            Some(Value::Array(items)) => items.iter().any(|item| reference_id(item) == Some(value.as_str())),
            Some(Value::String(field)) => field.contains(value.as_str()),
            _ => false,
        },
        DocumentQuery::Limit(_)
        | DocumentQuery::Offset(_)
        | DocumentQuery::OrderAsc(_)
        | DocumentQuery::OrderDesc(_) => true,
    }
}

/// Ordering between two attribute values; missing values sort last
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn apply_queries(documents: &[Document], queries: &[DocumentQuery]) -> Vec<Document> {
    let mut results: Vec<Document> = documents
        .iter()
        .filter(|doc| queries.iter().all(|q| matches_query(doc, q)))
        .cloned()
        .collect();

    let orders: Vec<(&str, bool)> = queries
        .iter()
        .filter_map(|q| match q {
            DocumentQuery::OrderAsc(name) => Some((name.as_str(), false)),
            DocumentQuery::OrderDesc(name) => Some((name.as_str(), true)),
            _ => None,
        })
        .collect();

    if !orders.is_empty() {
        results.sort_by(|a, b| {
            orders.iter().fold(Ordering::Equal, |acc, (name, descending)| {
                acc.then_with(|| {
                    let ordering = compare_values(attribute(a, name), attribute(b, name));
                    if *descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
            })
        });
    }

    let offset = queries.iter().rev().find_map(|q| match q {
        DocumentQuery::Offset(n) => Some(*n),
        _ => None,
    });
    let limit = queries.iter().rev().find_map(|q| match q {
        DocumentQuery::Limit(n) => Some(*n),
        _ => None,
    });

    if let Some(offset) = offset {
        if offset < results.len() {
            results.drain(0..offset);
        } else {
            return Vec::new();
        }
    }

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    results
}

#[async_trait]
impl Repository for InMemoryDocumentStore {
    async fn clear(&self) -> StoreResult<()> {
        self.collections.write().await.clear();
        *self.stats.write().await = RepositoryStats::new();
        info!("Cleared all collections from in-memory store");
        Ok(())
    }

    async fn stats(&self) -> StoreResult<RepositoryStats> {
        let collections = self.collections.read().await;
        let mut stats = self.stats.read().await.clone();

        stats.total_entities = collections.values().map(|docs| docs.len() as u64).sum();
        stats.collections = collections.values().filter(|docs| !docs.is_empty()).count() as u64;

        Ok(stats)
    }
}

#[async_trait]
impl DocumentStorePort for InMemoryDocumentStore {
    fn name(&self) -> &'static str {
        "InMemoryDocumentStore"
    }

    async fn list(&self, collection: &str, queries: &[DocumentQuery]) -> StoreResult<Vec<Document>> {
        let start_time = Instant::now();

        let results = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .map(|docs| apply_queries(docs, queries))
                .unwrap_or_default()
        };

        debug!("List on {} returned {} documents", collection, results.len());
        self.finish(start_time, Ok(results)).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let start_time = Instant::now();

        let result = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
        };

        self.finish(start_time, Ok(result)).await
    }

    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        mut data: Map<String, Value>,
    ) -> StoreResult<Document> {
        let start_time = Instant::now();

        let id = match id {
            Some(id) if id.trim().is_empty() => {
                let result = Err(StoreError::InvalidDocument(
                    "document id cannot be empty".to_string(),
                ));
                return self.finish(start_time, result).await;
            }
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        data.remove("$id");

        let result = {
            let mut collections = self.collections.write().await;
            let entries = collections.entry(collection.to_string()).or_default();

            if entries.iter().any(|d| d.id == id) {
                Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    id,
                })
            } else {
                let document = Document::new(id, data);
                entries.push(document.clone());
                Ok(document)
            }
        };

        if let Ok(document) = &result {
            debug!("Created document {}/{}", collection, document.id);
        }
        self.finish(start_time, result).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        mut patch: Map<String, Value>,
    ) -> StoreResult<Document> {
        let start_time = Instant::now();
        patch.remove("$id");

        let result = {
            let mut collections = self.collections.write().await;
            match collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            {
                Some(document) => {
                    document.fields.extend(patch);
                    Ok(document.clone())
                }
                None => Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                }),
            }
        };

        self.finish(start_time, result).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let start_time = Instant::now();

        let removed = {
            let mut collections = self.collections.write().await;
            collections.get_mut(collection).is_some_and(|docs| {
                let before = docs.len();
                docs.retain(|d| d.id != id);
                docs.len() != before
            })
        };

        if removed {
            debug!("Deleted document {}/{}", collection, id);
        }
        self.finish(start_time, Ok(removed)).await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}
