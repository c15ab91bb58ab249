use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use crate::domain::{DeviceProfile, UserAgent};
use crate::errors::{DeviceMatcherError, Result};
use crate::storage::DeviceProfileRepository;

/// In-process repository keyed by device id.
///
/// Increments go through the `DashMap` shard guard, so concurrent
/// increments of one id never lose an update. `by_fingerprint` mirrors the
/// Redis `fp:` index and always points at the most recently persisted id.
pub struct MemoryRepository {
    devices: DashMap<String, DeviceProfile>,
    by_fingerprint: DashMap<String, String>,
    max_records: usize,
}

impl MemoryRepository {
    pub fn new(max_records: usize) -> Self {
        Self {
            devices: DashMap::new(),
            by_fingerprint: DashMap::new(),
            max_records,
        }
    }

    /// 移除指向 `device_id` 的指纹索引项
    fn unindex(&self, profile: &DeviceProfile) {
        self.by_fingerprint
            .remove_if(&profile.user_agent().fingerprint(), |_, id| {
                id == profile.device_id()
            });
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl DeviceProfileRepository for MemoryRepository {
    async fn find_by_id(&self, device_id: &str) -> Result<Option<DeviceProfile>> {
        Ok(self.devices.get(device_id).map(|entry| entry.value().clone()))
    }

    async fn find_by_user_agent(&self, user_agent: &UserAgent) -> Result<Vec<DeviceProfile>> {
        let fingerprint = user_agent.fingerprint();
        let device_id = self
            .by_fingerprint
            .get(&fingerprint)
            .map(|entry| entry.value().clone());

        let found = device_id
            .and_then(|id| self.devices.get(&id).map(|entry| entry.value().clone()))
            .filter(|profile| profile.matches(user_agent));
        trace!(
            "find_by_user_agent fingerprint={} hit={}",
            fingerprint,
            found.is_some()
        );
        Ok(found.into_iter().collect())
    }

    async fn find_by_os_name(&self, os_name: &str) -> Result<Vec<DeviceProfile>> {
        let mut profiles: Vec<DeviceProfile> = self
            .devices
            .iter()
            .filter(|entry| entry.value().user_agent().os_name() == os_name)
            .map(|entry| entry.value().clone())
            .collect();
        profiles.sort_by(|a, b| a.device_id().cmp(b.device_id()));
        profiles.truncate(self.max_records);
        Ok(profiles)
    }

    async fn persist(&self, profile: &DeviceProfile) -> Result<()> {
        let previous = self
            .devices
            .insert(profile.device_id().to_string(), profile.clone());
        if let Some(old) = previous
            && !old.matches(profile.user_agent())
        {
            self.unindex(&old);
        }
        self.by_fingerprint.insert(
            profile.user_agent().fingerprint(),
            profile.device_id().to_string(),
        );
        Ok(())
    }

    async fn delete_by_id(&self, device_id: &str) -> Result<()> {
        if let Some((_, removed)) = self.devices.remove(device_id) {
            self.unindex(&removed);
        }
        Ok(())
    }

    async fn increment_hit_count(&self, device_id: &str) -> Result<u64> {
        let Some(mut entry) = self.devices.get_mut(device_id) else {
            return Err(DeviceMatcherError::not_found(format!(
                "Device not found: {}",
                device_id
            )));
        };

        let next = entry.hit_count().checked_add(1).ok_or_else(|| {
            DeviceMatcherError::storage(format!("Hit count overflow for device {}", device_id))
        })?;
        let updated = entry.with_hit_count(next);
        *entry = updated;
        Ok(next)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
