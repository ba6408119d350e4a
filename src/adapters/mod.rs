//! # Adapters Module
//!
//! Concrete implementations of the outbound ports that talk to systems
//! outside the process. The in-process store lives in
//! [`crate::repositories`]; [`document_store_from_config`] picks between the
//! two according to `[store] backend`.

pub mod remote_store;

pub use remote_store::RemoteDocumentStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::ports::DocumentStorePort;
use crate::repositories::InMemoryDocumentStore;
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Build the document store selected by the configuration
pub async fn document_store_from_config(config: &StoreConfig) -> Result<Arc<dyn DocumentStorePort>> {
    let store: Arc<dyn DocumentStorePort> = match config.backend {
        StoreBackend::Memory => match &config.fixtures {
            Some(path) => Arc::new(InMemoryDocumentStore::from_fixture_file(path).await?),
            None => Arc::new(InMemoryDocumentStore::new()),
        },
        StoreBackend::Remote => Arc::new(RemoteDocumentStore::new(config)?),
    };

    info!("Using document store: {}", store.name());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_by_default() {
        let store = document_store_from_config(&StoreConfig::default()).await.unwrap();
        assert_eq!(store.name(), "InMemoryDocumentStore");
    }

    #[tokio::test]
    async fn test_missing_fixture_file_fails() {
        let config = StoreConfig {
            fixtures: Some("/no/such/fixtures.json".into()),
            ..StoreConfig::default()
        };
        assert!(document_store_from_config(&config).await.is_err());
    }
}
