//! Device profile storage
//!
//! [`DeviceProfileRepository`] is the only boundary the matching service
//! talks to. Backends:
//!
//! - `memory`: in-process `DashMap`, default and used by tests
//! - `redis`: hash per device plus OS and fingerprint index sets

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::domain::{DeviceProfile, UserAgent};
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{MemoryRepository, RedisRepository};

#[async_trait]
pub trait DeviceProfileRepository: Send + Sync {
    async fn find_by_id(&self, device_id: &str) -> Result<Option<DeviceProfile>>;

    /// Profiles whose fingerprint equals `user_agent`'s. At most one.
    async fn find_by_user_agent(&self, user_agent: &UserAgent) -> Result<Vec<DeviceProfile>>;

    /// Profiles with exactly this (lower-case) OS name, capped at
    /// `storage.max_records`.
    async fn find_by_os_name(&self, os_name: &str) -> Result<Vec<DeviceProfile>>;

    /// Upsert by device id.
    async fn persist(&self, profile: &DeviceProfile) -> Result<()>;

    /// Idempotent: deleting an absent id succeeds.
    async fn delete_by_id(&self, device_id: &str) -> Result<()>;

    /// Atomically add one to the stored hit count and return the new value.
    /// An absent id is a `NotFound` error.
    async fn increment_hit_count(&self, device_id: &str) -> Result<u64>;

    fn backend_name(&self) -> &'static str;

    /// Liveness probe for `/health`.
    async fn ping(&self) -> Result<()>;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn DeviceProfileRepository>> {
        let repository: Arc<dyn DeviceProfileRepository> = match config.backend {
            StorageBackend::Memory => Arc::new(MemoryRepository::new(config.max_records)),
            StorageBackend::Redis => {
                let repository = RedisRepository::new(
                    &config.redis,
                    Duration::from_millis(config.timeout_ms),
                    config.max_records,
                )?;
                repository.ping().await?;
                Arc::new(repository)
            }
        };

        info!(
            "Storage backend initialized: {} (max_records={}, timeout_ms={})",
            repository.backend_name(),
            config.max_records,
            config.timeout_ms
        );
        Ok(repository)
    }
}
