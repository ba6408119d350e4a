//! # Search Service Port
//!
//! Defines the port interface for package search. HTTP handlers and the CLI
//! depend on this trait rather than on [`crate::tools::PackageSearchService`]
//! directly, so tests can substitute a canned implementation.

use crate::models::{Package, SearchFilters};
use crate::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Port interface for package search services
#[async_trait]
pub trait SearchServicePort: Send + Sync + Debug {
    /// Return one page of packages matching `filters`
    ///
    /// # Errors
    ///
    /// Only failures of the backing store are reported; out-of-range pages
    /// produce an empty page rather than an error.
    async fn search_packages(&self, filters: &SearchFilters) -> Result<Vec<Package>>;

    /// Check the health of the search service and its store
    async fn health_check(&self) -> Result<ServiceHealth>;
}

/// Health status of the search service
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServiceHealth {
    /// Overall service status
    pub status: HealthStatus,
    /// Name of the backing store implementation
    pub store: String,
    /// Last health check timestamp
    pub checked_at: chrono::DateTime<chrono::Utc>,
    /// Error message if unhealthy
    pub error_message: Option<String>,
}

/// Health status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Service is fully operational
    Healthy,
    /// Service is not operational
    Unhealthy,
}
