use super::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChecks {
    /// Listener bound and accepting requests
    pub server: bool,
    /// Document store reachable
    pub store: bool,
}

impl Default for HealthChecks {
    fn default() -> Self {
        Self {
            server: false,
            store: true,
        }
    }
}

/// Health check types
#[derive(Debug, Clone, Copy)]
pub enum HealthCheckType {
    Server,
    Store,
}

/// Shared health state updated by the server and the probes
#[derive(Debug, Clone)]
pub struct HealthCheck {
    status: Arc<RwLock<HealthStatus>>,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthCheck {
    pub fn new() -> Self {
        let status = HealthStatus {
            healthy: false,
            message: "Service is starting".to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks::default(),
        };

        Self {
            status: Arc::new(RwLock::new(status)),
        }
    }

    /// Get current health status
    pub async fn get_status(&self) -> HealthStatus {
        self.status.read().await.clone()
    }

    /// Set service as unhealthy
    pub async fn set_unhealthy(&self, reason: &str) {
        let mut status = self.status.write().await;
        status.healthy = false;
        status.message = reason.to_string();
        status.timestamp = Utc::now();
    }

    /// Update individual health check
    pub async fn update_check(&self, check: HealthCheckType, healthy: bool) {
        let mut status = self.status.write().await;

        match check {
            HealthCheckType::Server => status.checks.server = healthy,
            HealthCheckType::Store => status.checks.store = healthy,
        }

        status.healthy = status.checks.server && status.checks.store;
        status.timestamp = Utc::now();
        status.message = if status.healthy {
            "Service is healthy".to_string()
        } else {
            "One or more health checks failed".to_string()
        };
    }
}

/// Ask the store whether it is reachable and record the answer
async fn probe_store(state: &AppState) -> bool {
    let store_healthy = match state.search.health_check().await {
        Ok(report) => report.error_message.is_none(),
        Err(e) => {
            warn!("Store health check failed: {}", e);
            false
        }
    };
    state
        .health
        .update_check(HealthCheckType::Store, store_healthy)
        .await;
    store_healthy
}

/// Main health handler; probes the store before answering
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    probe_store(&state).await;

    let health = state.health.get_status().await;
    let status_code = if health.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Liveness probe handler (is the service alive?)
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe handler; ready once the listener is up and the store
/// answers
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    probe_store(&state).await;
    let health = state.health.get_status().await;

    if health.healthy && health.checks.server {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ports::{Document, DocumentQuery, DocumentStorePort, StoreResult};
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Store whose reachability can be switched off
    #[derive(Debug)]
    struct SwitchableStore {
        up: AtomicBool,
    }

    #[async_trait]
    impl DocumentStorePort for SwitchableStore {
        fn name(&self) -> &'static str {
            "SwitchableStore"
        }

        async fn list(&self, _collection: &str, _queries: &[DocumentQuery]) -> StoreResult<Vec<Document>> {
            Ok(Vec::new())
        }

        async fn get(&self, _collection: &str, _id: &str) -> StoreResult<Option<Document>> {
            Ok(None)
        }

        async fn create(
            &self,
            _collection: &str,
            id: Option<&str>,
            data: Map<String, Value>,
        ) -> StoreResult<Document> {
            Ok(Document::new(id.unwrap_or("new"), data))
        }

        async fn update(
            &self,
            _collection: &str,
            id: &str,
            patch: Map<String, Value>,
        ) -> StoreResult<Document> {
            Ok(Document::new(id, patch))
        }

        async fn delete(&self, _collection: &str, _id: &str) -> StoreResult<bool> {
            Ok(false)
        }

        async fn health_check(&self) -> StoreResult<bool> {
            Ok(self.up.load(Ordering::SeqCst))
        }
    }

    #[tokio::test]
    async fn test_readiness_checks_the_store() {
        let store = Arc::new(SwitchableStore {
            up: AtomicBool::new(true),
        });
        let state = AppState::with_store(store.clone(), &Config::default());
        state.health.update_check(HealthCheckType::Server, true).await;

        assert_eq!(readiness_handler(State(state.clone())).await, StatusCode::OK);

        // No /health call in between; readiness must notice on its own
        store.up.store(false, Ordering::SeqCst);
        assert_eq!(
            readiness_handler(State(state.clone())).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(!state.health.get_status().await.checks.store);

        store.up.store(true, Ordering::SeqCst);
        assert_eq!(readiness_handler(State(state)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_starts_unready() {
        let health = HealthCheck::new();
        let status = health.get_status().await;
        assert!(!status.healthy);
        assert!(!status.checks.server);
    }

    #[tokio::test]
    async fn test_update_check() {
        let health = HealthCheck::new();
        health.update_check(HealthCheckType::Server, true).await;
        assert!(health.get_status().await.healthy);

        health.update_check(HealthCheckType::Store, false).await;
        let status = health.get_status().await;
        assert!(!status.healthy);
        assert!(!status.checks.store);
        assert_eq!(status.message, "One or more health checks failed");
    }

    #[tokio::test]
    async fn test_set_unhealthy() {
        let health = HealthCheck::new();
        health.update_check(HealthCheckType::Server, true).await;
        health.set_unhealthy("shutting down").await;

        let status = health.get_status().await;
        assert!(!status.healthy);
        assert_eq!(status.message, "shutting down");
    }
}
