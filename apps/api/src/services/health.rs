//! Health check service for verifying dependencies
//!
//! Checks the two things Quill needs to serve requests:
//! - the data store
//! - the image upload directory

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::repositories::DynUserRepository;

const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Status of an individual dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

/// Result of a single dependency check
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub name: &'static str,
    pub status: ServiceStatus,
    /// Response time in milliseconds (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    pub fn healthy(name: &'static str, response_time: Duration) -> Self {
        Self {
            name,
            status: ServiceStatus::Healthy,
            response_time_ms: Some(response_time.as_millis() as u64),
            error: None,
        }
    }

    pub fn unhealthy(name: &'static str, error: impl Into<String>) -> Self {
        Self {
            name,
            status: ServiceStatus::Unhealthy,
            response_time_ms: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregated health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResponse {
    /// Healthy only if every dependency is healthy
    pub status: ServiceStatus,
    pub services: Vec<ServiceHealth>,
    pub total_time_ms: u64,
    pub version: &'static str,
}

impl HealthCheckResponse {
    pub fn new(services: Vec<ServiceHealth>, total_time: Duration) -> Self {
        let status = if services.iter().all(|s| s.status == ServiceStatus::Healthy) {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        };

        Self {
            status,
            services,
            total_time_ms: total_time.as_millis() as u64,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

/// Runs the readiness checks
#[derive(Clone)]
pub struct HealthService {
    users: DynUserRepository,
    upload_dir: PathBuf,
}

impl HealthService {
    pub fn new(users: DynUserRepository, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            users,
            upload_dir: upload_dir.into(),
        }
    }

    /// Check data store connectivity
    pub async fn check_store(&self) -> ServiceHealth {
        let start = Instant::now();
        match tokio::time::timeout(STORE_TIMEOUT, self.users.ping()).await {
            Ok(Ok(())) => ServiceHealth::healthy("database", start.elapsed()),
            Ok(Err(e)) => ServiceHealth::unhealthy("database", format!("Query failed: {}", e)),
            Err(_) => ServiceHealth::unhealthy("database", "Timed out"),
        }
    }

    /// Check that the upload directory exists
    pub async fn check_storage(&self) -> ServiceHealth {
        let start = Instant::now();
        match tokio::fs::metadata(&self.upload_dir).await {
            Ok(meta) if meta.is_dir() => ServiceHealth::healthy("storage", start.elapsed()),
            Ok(_) => ServiceHealth::unhealthy("storage", "Upload path is not a directory"),
            Err(e) => ServiceHealth::unhealthy("storage", format!("Upload directory: {}", e)),
        }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let start = Instant::now();
        let (store, storage) = tokio::join!(self.check_store(), self.check_storage());
        HealthCheckResponse::new(vec![store, storage], start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_response_unhealthy_if_any_service_is() {
        let response = HealthCheckResponse::new(
            vec![
                ServiceHealth::healthy("database", Duration::from_millis(3)),
                ServiceHealth::unhealthy("storage", "missing"),
            ],
            Duration::from_millis(4),
        );
        assert!(!response.is_healthy());
    }

    #[tokio::test]
    async fn test_check_all_with_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        let health = HealthService::new(Arc::new(MemoryStore::new()), dir.path());
        assert!(health.check_all().await.is_healthy());

        let missing = HealthService::new(Arc::new(MemoryStore::new()), dir.path().join("nope"));
        let response = missing.check_all().await;
        assert!(!response.is_healthy());
        assert_eq!(response.services[1].status, ServiceStatus::Unhealthy);
    }
}
