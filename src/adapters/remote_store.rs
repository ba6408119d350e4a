//! # Remote Document Store
//!
//! [`DocumentStorePort`] over the hosted backend's documents REST API.
//! Requests are scoped to one project and database; queries travel as JSON
//! strings in repeated `queries[]` parameters.

use crate::config::StoreConfig;
use crate::ports::{Document, DocumentQuery, DocumentStorePort, StoreError, StoreResult};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
/// Id placeholder that asks the backend to generate one
const UNIQUE_ID: &str = "unique()";

/// Response envelope of the list endpoint
#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    total: u64,
    documents: Vec<Document>,
}

/// HTTP adapter for the hosted document database
#[derive(Clone)]
pub struct RemoteDocumentStore {
    client: Client,
    endpoint: Url,
    database_id: String,
}

impl std::fmt::Debug for RemoteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDocumentStore")
            .field("endpoint", &self.endpoint.as_str())
            .field("database_id", &self.database_id)
            .finish_non_exhaustive()
    }
}

impl RemoteDocumentStore {
    /// Build the adapter from the `[store]` configuration section
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| missing("store.endpoint"))?;
        let project_id = config
            .project_id
            .as_deref()
            .ok_or_else(|| missing("store.project_id"))?;
        let database_id = config
            .database_id
            .clone()
            .ok_or_else(|| missing("store.database_id"))?;

        let endpoint = Url::parse(endpoint).map_err(|e| Error::InvalidInput {
            field: "store.endpoint".to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(PROJECT_HEADER, header_value("store.project_id", project_id)?);
        if let Some(key) = config.api_key.as_deref() {
            headers.insert(KEY_HEADER, header_value("store.api_key", key)?);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("blue-destination/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            database_id,
        })
    }

    fn url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Unavailable(format!("invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn documents_url(&self, collection: &str) -> StoreResult<Url> {
        self.url(&[
            "databases",
            &self.database_id,
            "collections",
            collection,
            "documents",
        ])
    }

    fn document_url(&self, collection: &str, id: &str) -> StoreResult<Url> {
        self.url(&[
            "databases",
            &self.database_id,
            "collections",
            collection,
            "documents",
            id,
        ])
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<Response> {
        request.send().await.map_err(|e| {
            warn!("Document store request failed: {}", e);
            StoreError::Unavailable(e.to_string())
        })
    }

    /// Map a non-success response onto a store error
    async fn error_for(response: Response, collection: &str, id: &str) -> StoreError {
        let status = response.status();
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            },
            StatusCode::CONFLICT => StoreError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
            StatusCode::BAD_REQUEST => StoreError::InvalidDocument(message),
            _ => StoreError::Backend {
                status: status.as_u16(),
                message,
            },
        }
    }

    async fn read_document(response: Response) -> StoreResult<Document> {
        response
            .json::<Document>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl DocumentStorePort for RemoteDocumentStore {
    fn name(&self) -> &'static str {
        "RemoteDocumentStore"
    }

    #[instrument(skip(self, queries), fields(queries = queries.len()))]
    async fn list(&self, collection: &str, queries: &[DocumentQuery]) -> StoreResult<Vec<Document>> {
        let start_time = Instant::now();
        let mut url = self.documents_url(collection)?;
        {
            let mut pairs = url.query_pairs_mut();
            for query in queries {
                pairs.append_pair("queries[]", &query.to_wire());
            }
        }

        let response = self.send(self.client.get(url)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, collection, "").await);
        }

        let list: DocumentList = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        debug!(
            "Listed {} of {} documents from {} in {}ms",
            list.documents.len(),
            list.total,
            collection,
            start_time.elapsed().as_millis()
        );
        Ok(list.documents)
    }

    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let url = self.document_url(collection, id)?;
        let response = self.send(self.client.get(url)).await?;

        match response.status() {
            status if status.is_success() => Self::read_document(response).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::error_for(response, collection, id).await),
        }
    }

    #[instrument(skip(self, data))]
    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        mut data: Map<String, Value>,
    ) -> StoreResult<Document> {
        data.remove("$id");
        let document_id = id.unwrap_or(UNIQUE_ID);
        let body = json!({ "documentId": document_id, "data": data });

        let url = self.documents_url(collection)?;
        let response = self.send(self.client.post(url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, collection, document_id).await);
        }

        Self::read_document(response).await
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        mut patch: Map<String, Value>,
    ) -> StoreResult<Document> {
        patch.remove("$id");
        let url = self.document_url(collection, id)?;
        let response = self
            .send(self.client.patch(url).json(&json!({ "data": patch })))
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, collection, id).await);
        }

        Self::read_document(response).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let url = self.document_url(collection, id)?;
        let response = self.send(self.client.delete(url)).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::error_for(response, collection, id).await),
        }
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let url = self.url(&["health"])?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response.status().is_success())
    }
}

fn missing(field: &str) -> Error {
    Error::InvalidInput {
        field: field.to_string(),
        reason: "Required for the remote store backend".to_string(),
    }
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidInput {
        field: field.to_string(),
        reason: e.to_string(),
    })
}
