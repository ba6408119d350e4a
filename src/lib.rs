pub mod adapters;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod ports;
pub mod repositories;
pub mod server;
pub mod tools;

pub use crate::config::{Config, ConfigOverrides};
pub use adapters::{document_store_from_config, RemoteDocumentStore};
pub use error::{Error, Result};
pub use models::{Destination, Package, SearchFilters, Session, SortKey};
pub use ports::{DocumentStorePort, SearchServicePort};
pub use repositories::InMemoryDocumentStore;
pub use server::{AppState, Server};
pub use tools::{CatalogService, FavoritesService, NotificationService, PackageSearchService};
