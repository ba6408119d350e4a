//! # Repository Pattern Implementation
//!
//! Local implementations of the storage ports. The hosted backend is reached
//! through [`crate::adapters::RemoteDocumentStore`]; everything here runs in
//! process and is used for tests, local development and fixture-driven demos.
//!
//! ## Usage Example
//!
//! ```no_run
//! use blue_destination::ports::{DocumentQuery, DocumentStorePort};
//! use blue_destination::repositories::InMemoryDocumentStore;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryDocumentStore::new();
//! store
//!     .seed("packages", vec![json!({ "$id": "pkg-1", "name": "Bali Escape" })])
//!     .await?;
//!
//! let hits = store
//!     .list("packages", &[DocumentQuery::search("name", "bali")])
//!     .await?;
//! assert_eq!(hits.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod document;

pub use document::InMemoryDocumentStore;

use crate::ports::StoreResult;
use async_trait::async_trait;
use std::fmt::Debug;

/// Housekeeping shared by local repositories
#[async_trait]
pub trait Repository: Send + Sync + Debug {
    /// Clears all data from the repository (primarily for testing)
    async fn clear(&self) -> StoreResult<()>;

    /// Returns statistics about the repository
    async fn stats(&self) -> StoreResult<RepositoryStats>;
}

/// Statistics about repository usage and performance
#[derive(Debug, Clone, Default)]
pub struct RepositoryStats {
    /// Total number of documents stored
    pub total_entities: u64,
    /// Number of collections holding at least one document
    pub collections: u64,
    /// Number of successful operations
    pub successful_operations: u64,
    /// Number of failed operations
    pub failed_operations: u64,
    /// Average operation time in milliseconds
    pub avg_operation_time_ms: f64,
}

impl RepositoryStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful operation with timing
    pub fn record_success(&mut self, duration_ms: f64) {
        self.successful_operations += 1;
        self.update_avg_time(duration_ms);
    }

    /// Record a failed operation with timing
    pub fn record_failure(&mut self, duration_ms: f64) {
        self.failed_operations += 1;
        self.update_avg_time(duration_ms);
    }

    /// Update average operation time using exponential moving average
    fn update_avg_time(&mut self, new_time_ms: f64) {
        let total_ops = self.successful_operations + self.failed_operations;
        if total_ops == 1 {
            self.avg_operation_time_ms = new_time_ms;
        } else {
            let alpha = 0.1;
            self.avg_operation_time_ms =
                alpha * new_time_ms + (1.0 - alpha) * self.avg_operation_time_ms;
        }
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.successful_operations + self.failed_operations;
        if total == 0 {
            0.0
        } else {
            (self.successful_operations as f64 / total as f64) * 100.0
        }
    }
}
