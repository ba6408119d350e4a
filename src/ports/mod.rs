//! # Ports Module
//!
//! Port interfaces between the application core and the outside world.
//!
//! - [`DocumentStorePort`] is the outbound port to the hosted document
//!   database. [`crate::repositories::InMemoryDocumentStore`] and
//!   [`crate::adapters::RemoteDocumentStore`] implement it.
//! - [`SearchServicePort`] is the inbound port the HTTP API and the CLI use
//!   to run package searches.
//!
//! ## Example Usage
//!
//! ```no_run
//! use blue_destination::models::SearchFilters;
//! use blue_destination::ports::SearchServicePort;
//! use std::sync::Arc;
//!
//! async fn first_page(
//!     search: Arc<dyn SearchServicePort>,
//! ) -> blue_destination::Result<usize> {
//!     let packages = search.search_packages(&SearchFilters::default()).await?;
//!     Ok(packages.len())
//! }
//! ```

pub mod document_store;
pub mod search_service;

pub use document_store::{Document, DocumentQuery, DocumentStorePort, StoreError, StoreResult};
pub use search_service::SearchServicePort;
