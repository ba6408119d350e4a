use super::health::HealthCheck;
use crate::adapters::document_store_from_config;
use crate::config::Config;
use crate::ports::{DocumentStorePort, SearchServicePort};
use crate::tools::{CatalogService, FavoritesService, NotificationService, PackageSearchService};
use crate::Result;
use std::sync::Arc;

/// Services shared by every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub search: Arc<dyn SearchServicePort>,
    pub catalog: CatalogService,
    pub favorites: FavoritesService,
    pub notifications: NotificationService,
    pub health: HealthCheck,
}

impl AppState {
    /// Wire every service on top of one document store
    pub fn with_store(store: Arc<dyn DocumentStorePort>, config: &Config) -> Self {
        let catalog = CatalogService::new(store.clone(), config);

        Self {
            search: Arc::new(PackageSearchService::new(store.clone(), config)),
            favorites: FavoritesService::new(store.clone(), catalog.clone(), config),
            notifications: NotificationService::new(store, config),
            catalog,
            health: HealthCheck::new(),
        }
    }

    /// Build the store selected by the configuration and wire services on it
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = document_store_from_config(&config.store).await?;
        Ok(Self::with_store(store, config))
    }
}
