use super::catalog::{normalize, CatalogService};
use crate::config::Config;
use crate::models::{Favorite, Package, Session};
use crate::ports::{DocumentQuery, DocumentStorePort};
use crate::{Error, Result};
use serde_json::{json, Map};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Packages saved by each user, persisted in the favorites collection
#[derive(Debug, Clone)]
pub struct FavoritesService {
    store: Arc<dyn DocumentStorePort>,
    catalog: CatalogService,
    collection: String,
}

impl FavoritesService {
    pub fn new(store: Arc<dyn DocumentStorePort>, catalog: CatalogService, config: &Config) -> Self {
        Self {
            store,
            catalog,
            collection: config.collections.favorites.clone(),
        }
    }

    async fn find(&self, user_id: &str, package_id: Option<&str>) -> Result<Vec<Favorite>> {
        let mut queries = vec![DocumentQuery::equal("userId", user_id)];
        if let Some(package_id) = package_id {
            queries.push(DocumentQuery::equal("packageId", package_id));
        }
        let documents = self.store.list(&self.collection, &queries).await?;
        Ok(normalize(&documents))
    }

    /// Save a package for the session user; saving twice is a no-op
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn add(&self, session: &Session, package_id: &str) -> Result<Favorite> {
        if !self.catalog.package_exists(package_id).await? {
            return Err(Error::not_found("Package", package_id));
        }

        if let Some(existing) = self
            .find(&session.user_id, Some(package_id))
            .await?
            .into_iter()
            .next()
        {
            debug!("Package {} already a favorite", package_id);
            return Ok(existing);
        }

        let mut data = Map::new();
        data.insert("userId".to_string(), json!(session.user_id));
        data.insert("packageId".to_string(), json!(package_id));
        data.insert("createdAt".to_string(), json!(chrono::Utc::now()));

        let document = self.store.create(&self.collection, None, data).await?;
        info!("Added package {} to favorites", package_id);
        Ok(Favorite::try_from(&document)?)
    }

    /// Forget a saved package; returns whether it was saved
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn remove(&self, session: &Session, package_id: &str) -> Result<bool> {
        let mut removed = false;
        for favorite in self.find(&session.user_id, Some(package_id)).await? {
            removed |= self.store.delete(&self.collection, &favorite.id).await?;
        }
        Ok(removed)
    }

    pub async fn is_favorite(&self, session: &Session, package_id: &str) -> Result<bool> {
        Ok(!self.find(&session.user_id, Some(package_id)).await?.is_empty())
    }

    /// Saved packages in the order they were saved; packages that no longer
    /// exist are skipped
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn list(&self, session: &Session) -> Result<Vec<Package>> {
        let mut packages = Vec::new();
        for favorite in self.find(&session.user_id, None).await? {
            match self.catalog.get_package(&favorite.package_id).await {
                Ok(package) => packages.push(package),
                Err(Error::NotFound { .. }) => {
                    debug!("Favorite {} points at a missing package", favorite.id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(packages)
    }
}
