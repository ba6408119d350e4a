use crate::config::Config;
use crate::models::{Destination, Package};
use crate::ports::{Document, DocumentQuery, DocumentStorePort, StoreError};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Read-only lookups over packages and destinations
#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStorePort>,
    packages: String,
    destinations: String,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStorePort>, config: &Config) -> Self {
        Self {
            store,
            packages: config.collections.packages.clone(),
            destinations: config.collections.destinations.clone(),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_package(&self, id: &str) -> Result<Package> {
        let document = self
            .store
            .get(&self.packages, id)
            .await?
            .ok_or_else(|| Error::not_found("Package", id))?;
        Ok(Package::try_from(&document)?)
    }

    /// Packages flagged as featured, in store order
    #[instrument(skip(self))]
    pub async fn featured_packages(&self, limit: usize) -> Result<Vec<Package>> {
        let documents = self
            .store
            .list(
                &self.packages,
                &[DocumentQuery::equal("featured", true), DocumentQuery::Limit(limit)],
            )
            .await?;
        Ok(normalize(&documents))
    }

    #[instrument(skip(self))]
    pub async fn list_destinations(&self) -> Result<Vec<Destination>> {
        let documents = self.store.list(&self.destinations, &[]).await?;
        debug!("Fetched {} destinations", documents.len());
        Ok(normalize(&documents))
    }

    #[instrument(skip(self))]
    pub async fn get_destination(&self, id: &str) -> Result<Destination> {
        let document = self
            .store
            .get(&self.destinations, id)
            .await?
            .ok_or_else(|| Error::not_found("Destination", id))?;
        Ok(Destination::try_from(&document)?)
    }

    /// Whether a package with this id exists
    pub async fn package_exists(&self, id: &str) -> Result<bool> {
        Ok(self.store.get(&self.packages, id).await?.is_some())
    }
}

/// Convert documents into records, dropping those that do not fit the shape
pub(crate) fn normalize<T>(documents: &[Document]) -> Vec<T>
where
    T: for<'a> TryFrom<&'a Document, Error = StoreError>,
{
    documents
        .iter()
        .filter_map(|doc| {
            T::try_from(doc)
                .map_err(|e| warn!("Skipping malformed document {}: {}", doc.id, e))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryDocumentStore;
    use serde_json::json;

    async fn catalog() -> CatalogService {
        let store = InMemoryDocumentStore::new();
        store
            .seed(
                "packages",
                vec![
                    json!({ "$id": "p1", "name": "Bali", "price": 1.0, "duration": 5, "featured": true }),
                    json!({ "$id": "p2", "name": "Kyoto", "price": 2.0, "duration": 6 }),
                    json!({ "$id": "p3", "name": "Lisbon", "price": 3.0, "duration": 3, "featured": true }),
                ],
            )
            .await
            .unwrap();
        store
            .seed(
                "destinations",
                vec![
                    json!({ "$id": "d1", "name": "Bali", "region": "Asia" }),
                    json!({ "$id": "d2", "name": "Lisbon", "region": "Europe" }),
                ],
            )
            .await
            .unwrap();
        CatalogService::new(Arc::new(store), &Config::default())
    }

    #[tokio::test]
    async fn test_get_package() {
        let catalog = catalog().await;
        assert_eq!(catalog.get_package("p2").await.unwrap().name, "Kyoto");
        assert!(matches!(
            catalog.get_package("nope").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_featured_packages() {
        let catalog = catalog().await;
        let featured = catalog.featured_packages(10).await.unwrap();
        let ids: Vec<&str> = featured.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);

        assert_eq!(catalog.featured_packages(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_destinations() {
        let catalog = catalog().await;
        assert_eq!(catalog.list_destinations().await.unwrap().len(), 2);
        assert_eq!(
            catalog.get_destination("d2").await.unwrap().region.as_deref(),
            Some("Europe")
        );
        assert!(catalog.get_destination("d9").await.is_err());
    }
}
