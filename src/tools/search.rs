use crate::config::Config;
use crate::models::{Package, SearchFilters};
use crate::ports::search_service::{HealthStatus, ServiceHealth};
use crate::ports::{DocumentQuery, DocumentStorePort, SearchServicePort};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Package search: store-level text/destination match, then optional
/// sorting and page slicing in memory
#[derive(Clone)]
pub struct PackageSearchService {
    store: Arc<dyn DocumentStorePort>,
    collection: String,
    candidate_limit: usize,
}

impl std::fmt::Debug for PackageSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageSearchService")
            .field("store", &self.store.name())
            .field("collection", &self.collection)
            .field("candidate_limit", &self.candidate_limit)
            .finish()
    }
}

impl PackageSearchService {
    pub fn new(store: Arc<dyn DocumentStorePort>, config: &Config) -> Self {
        info!("Initializing package search service");
        Self {
            store,
            collection: config.collections.packages.clone(),
            candidate_limit: config.search.candidate_limit,
        }
    }

    /// Run a search and return one page of packages
    #[instrument(skip(self, filters), fields(query = ?filters.query, destination = ?filters.destination_id, sort = ?filters.sort_by))]
    pub async fn search(&self, filters: &SearchFilters) -> Result<Vec<Package>> {
        let start_time = Instant::now();

        let documents = self
            .store
            .list(&self.collection, &self.store_queries(filters))
            .await?;

        let mut candidates: Vec<Package> = documents
            .iter()
            .filter_map(|doc| match Package::try_from(doc) {
                Ok(package) => Some(package),
                Err(e) => {
                    warn!("Skipping malformed package document: {}", e);
                    None
                }
            })
            .collect();

        if let Some(key) = filters.sort_key() {
            debug!("Sorting {} candidates by {}", candidates.len(), key.as_str());
            candidates.sort_by(|a, b| key.compare(a, b));
        }

        let total = candidates.len();
        let page = paginate(candidates, filters.window());

        info!(
            "Search completed in {}ms, returning {} of {} candidates",
            start_time.elapsed().as_millis(),
            page.len(),
            total
        );
        Ok(page)
    }

    /// Only the text query and destination reach the store
    fn store_queries(&self, filters: &SearchFilters) -> Vec<DocumentQuery> {
        let mut queries = Vec::new();

        if let Some(query) = filters.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            queries.push(DocumentQuery::search("name", query));
        }

        if let Some(destination) = filters.destination_id.as_deref().filter(|d| !d.is_empty()) {
            queries.push(DocumentQuery::contains("destinations", destination));
        }

        queries.push(DocumentQuery::Limit(self.candidate_limit));
        queries
    }
}

/// Slice `[start, end)` out of `items`, clamped to its length
fn paginate<T>(mut items: Vec<T>, window: Option<(usize, usize)>) -> Vec<T> {
    let Some((start, end)) = window else {
        return Vec::new();
    };

    let start = start.min(items.len());
    let end = end.min(items.len());
    items.truncate(end);
    items.drain(..start);
    items
}

#[async_trait]
impl SearchServicePort for PackageSearchService {
    async fn search_packages(&self, filters: &SearchFilters) -> Result<Vec<Package>> {
        self.search(filters).await
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let (status, error_message) = match self.store.health_check().await {
            Ok(true) => (HealthStatus::Healthy, None),
            Ok(false) => (
                HealthStatus::Unhealthy,
                Some("document store reported unhealthy".to_string()),
            ),
            Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
        };

        Ok(ServiceHealth {
            status,
            store: self.store.name().to_string(),
            checked_at: chrono::Utc::now(),
            error_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{Document, StoreError, StoreResult};
    use crate::repositories::InMemoryDocumentStore;
    use serde_json::{json, Map, Value};
    use tokio::sync::Mutex;

    async fn service_with(packages: Vec<Value>) -> PackageSearchService {
        let store = InMemoryDocumentStore::new();
        store.seed("packages", packages).await.unwrap();
        PackageSearchService::new(Arc::new(store), &Config::default())
    }

    fn package(id: &str, name: &str, price: f64, duration: u32) -> Value {
        json!({
            "$id": id,
            "name": name,
            "price": price,
            "duration": duration,
            "destinations": [],
            "tags": []
        })
    }

    fn numbered(n: usize) -> Vec<Value> {
        (1..=n)
            .map(|i| package(&format!("p{i}"), &format!("Package {i}"), 100.0 * i as f64, 3))
            .collect()
    }

    fn ids(packages: &[Package]) -> Vec<&str> {
        packages.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_default_page_is_first_nine_in_store_order() {
        let service = service_with(numbered(12)).await;
        let page = service.search(&SearchFilters::default()).await.unwrap();
        assert_eq!(ids(&page), vec!["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9"]);
    }

    #[tokio::test]
    async fn test_second_page() {
        let service = service_with(numbered(12)).await;
        let page = service
            .search(&SearchFilters::new().page(2))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["p10", "p11", "p12"]);
    }

    #[tokio::test]
    async fn test_price_sorting() {
        let service = service_with(vec![
            package("a", "A", 300.0, 1),
            package("b", "B", 100.0, 1),
            package("c", "C", 200.0, 1),
        ])
        .await;

        let asc = service
            .search(&SearchFilters::new().sort_by("price-asc"))
            .await
            .unwrap();
        let prices: Vec<f64> = asc.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![100.0, 200.0, 300.0]);

        let desc = service
            .search(&SearchFilters::new().sort_by("price-desc"))
            .await
            .unwrap();
        let prices: Vec<f64> = desc.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![300.0, 200.0, 100.0]);
    }

    #[tokio::test]
    async fn test_duration_sorting_is_stable() {
        let service = service_with(vec![
            package("a", "A", 1.0, 7),
            package("b", "B", 1.0, 3),
            package("c", "C", 1.0, 7),
            package("d", "D", 1.0, 10),
        ])
        .await;

        let asc = service
            .search(&SearchFilters::new().sort_by("duration-asc"))
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec!["b", "a", "c", "d"]);

        let desc = service
            .search(&SearchFilters::new().sort_by("duration-desc"))
            .await
            .unwrap();
        assert_eq!(ids(&desc), vec!["d", "a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_name_sorting() {
        let service = service_with(vec![
            package("z", "Zebra Tour", 1.0, 1),
            package("a", "Alpha Trip", 1.0, 1),
        ])
        .await;

        let asc = service
            .search(&SearchFilters::new().sort_by("name-asc"))
            .await
            .unwrap();
        let names: Vec<&str> = asc.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha Trip", "Zebra Tour"]);

        let desc = service
            .search(&SearchFilters::new().sort_by("name-desc"))
            .await
            .unwrap();
        let names: Vec<&str> = desc.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Zebra Tour", "Alpha Trip"]);

        let accented = service_with(vec![
            package("z", "Zanzibar Escape", 1.0, 1),
            package("i", "Île Maurice", 1.0, 1),
            package("e", "Éze Riviera", 1.0, 1),
            package("f", "Fiji Islands", 1.0, 1),
        ])
        .await;
        let asc = accented
            .search(&SearchFilters::new().sort_by("name-asc"))
            .await
            .unwrap();
        let names: Vec<&str> = asc.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Éze Riviera", "Fiji Islands", "Île Maurice", "Zanzibar Escape"]
        );
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_empty() {
        let service = service_with(numbered(5)).await;
        let page = service
            .search(&SearchFilters::new().page(100).limit(9))
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_zero_limit_and_zero_page_are_empty() {
        let service = service_with(numbered(5)).await;
        assert!(service
            .search(&SearchFilters::new().limit(0))
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .search(&SearchFilters::new().page(0))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sort_keeps_store_order() {
        let service = service_with(vec![
            package("c", "C", 300.0, 1),
            package("a", "A", 100.0, 1),
            package("b", "B", 200.0, 1),
        ])
        .await;

        let page = service
            .search(&SearchFilters::new().sort_by("bogus"))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_price_and_tag_filters_are_not_applied() {
        let service = service_with(numbered(3)).await;
        let filters = SearchFilters {
            min_price: Some(1_000_000.0),
            max_duration: Some(1),
            tags: Some(vec!["luxury".to_string()]),
            ratings: Some(vec![5.0]),
            travelers: Some(4),
            ..SearchFilters::default()
        };

        let page = service.search(&filters).await.unwrap();
        assert_eq!(page.len(), 3);
    }

    #[tokio::test]
    async fn test_query_and_destination_filter_at_store() {
        let service = service_with(vec![
            json!({ "$id": "bali", "name": "Bali Escape", "price": 1.0, "duration": 1, "destinations": ["dest-bali"] }),
            json!({ "$id": "kyoto", "name": "Kyoto Escape", "price": 1.0, "duration": 1, "destinations": [{ "$id": "dest-kyoto" }] }),
            json!({ "$id": "lisbon", "name": "Lisbon Weekend", "price": 1.0, "duration": 1, "destinations": ["dest-lisbon"] }),
        ])
        .await;

        let page = service
            .search(&SearchFilters::new().with_query("escape"))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["bali", "kyoto"]);

        let page = service
            .search(&SearchFilters::new().with_query("escape").with_destination("dest-kyoto"))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["kyoto"]);
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let service = service_with(vec![
            package("ok", "Fine", 1.0, 1),
            json!({ "$id": "broken", "name": "No price" }),
        ])
        .await;

        let page = service.search(&SearchFilters::default()).await.unwrap();
        assert_eq!(ids(&page), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_null_attributes_keep_packages_in_results() {
        let service = service_with(vec![
            package("a", "Alpha", 1.0, 1),
            json!({
                "$id": "b", "name": "Bravo", "price": 2.0, "duration": 2,
                "destinations": [], "featured": null, "discount": null
            }),
            json!({
                "$id": "c", "name": "Charlie", "price": 3.0, "duration": 3,
                "destinations": null, "tags": null
            }),
        ])
        .await;

        let page = service.search(&SearchFilters::default()).await.unwrap();
        assert_eq!(ids(&page), vec!["a", "b", "c"]);

        let second = service
            .search(&SearchFilters::new().page(2).limit(2))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["c"]);
    }

    /// Store that records queries and can be told to fail
    #[derive(Debug, Default)]
    struct RecordingStore {
        queries: Mutex<Vec<DocumentQuery>>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentStorePort for RecordingStore {
        fn name(&self) -> &'static str {
            "RecordingStore"
        }

        async fn list(&self, _collection: &str, queries: &[DocumentQuery]) -> StoreResult<Vec<Document>> {
            if self.fail {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.queries.lock().await.extend_from_slice(queries);
            Ok(Vec::new())
        }

        async fn get(&self, _collection: &str, _id: &str) -> StoreResult<Option<Document>> {
            Ok(None)
        }

        async fn create(
            &self,
            _collection: &str,
            _id: Option<&str>,
            _data: Map<String, Value>,
        ) -> StoreResult<Document> {
            Err(StoreError::Unavailable("read only".to_string()))
        }

        async fn update(
            &self,
            _collection: &str,
            _id: &str,
            _patch: Map<String, Value>,
        ) -> StoreResult<Document> {
            Err(StoreError::Unavailable("read only".to_string()))
        }

        async fn delete(&self, _collection: &str, _id: &str) -> StoreResult<bool> {
            Ok(false)
        }

        async fn health_check(&self) -> StoreResult<bool> {
            Ok(!self.fail)
        }
    }

    #[tokio::test]
    async fn test_only_query_destination_and_limit_reach_store() {
        let store = Arc::new(RecordingStore::default());
        let service = PackageSearchService::new(store.clone(), &Config::default());

        let filters = SearchFilters {
            query: Some("  bali  ".to_string()),
            destination_id: Some("dest-bali".to_string()),
            min_price: Some(10.0),
            sort_by: Some("price-asc".to_string()),
            ..SearchFilters::default()
        };
        service.search(&filters).await.unwrap();

        let recorded = store.queries.lock().await.clone();
        assert_eq!(
            recorded,
            vec![
                DocumentQuery::search("name", "bali"),
                DocumentQuery::contains("destinations", "dest-bali"),
                DocumentQuery::Limit(5000),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_query_is_not_sent() {
        let store = Arc::new(RecordingStore::default());
        let service = PackageSearchService::new(store.clone(), &Config::default());

        service
            .search(&SearchFilters::new().with_query("   "))
            .await
            .unwrap();
        assert_eq!(*store.queries.lock().await, vec![DocumentQuery::Limit(5000)]);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        let service = PackageSearchService::new(store, &Config::default());

        let result = service.search(&SearchFilters::default()).await;
        assert!(matches!(result, Err(crate::Error::StoreUnavailable(_))));

        let health = service.health_check().await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_paginate_clamps() {
        assert_eq!(paginate(vec![1, 2, 3], Some((1, 10))), vec![2, 3]);
        assert_eq!(paginate(vec![1, 2, 3], Some((5, 10))), Vec::<i32>::new());
        assert_eq!(paginate(vec![1, 2, 3], None), Vec::<i32>::new());
    }
}
