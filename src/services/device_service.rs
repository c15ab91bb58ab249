//! Device matching service
//!
//! Parse → find-or-create → atomic increment. The find-or-create step is not
//! locked: two first sightings of one fingerprint that race may both miss
//! and create two profiles. Increments on an existing profile are atomic at
//! the store.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::domain::{DeviceIdGenerator, DeviceProfile, canonical_name};
use crate::errors::{DeviceMatcherError, Result};
use crate::parser::UserAgentParser;
use crate::storage::DeviceProfileRepository;

pub struct DeviceMatchingService {
    parser: Arc<dyn UserAgentParser>,
    repository: Arc<dyn DeviceProfileRepository>,
    id_generator: Arc<dyn DeviceIdGenerator>,
}

impl DeviceMatchingService {
    pub fn new(
        parser: Arc<dyn UserAgentParser>,
        repository: Arc<dyn DeviceProfileRepository>,
        id_generator: Arc<dyn DeviceIdGenerator>,
    ) -> Self {
        Self {
            parser,
            repository,
            id_generator,
        }
    }

    pub fn parser_name(&self) -> &'static str {
        self.parser.name()
    }

    pub fn backend_name(&self) -> &'static str {
        self.repository.backend_name()
    }

    /// Liveness of the underlying store.
    pub async fn ping(&self) -> Result<()> {
        self.repository.ping().await
    }

    /// Resolve a raw `User-Agent` to its device profile, creating one on
    /// first sight, and count the hit.
    ///
    /// The returned profile carries the post-increment count. A blank input
    /// is rejected before the store is touched; every later failure comes
    /// back as `DeviceMatch` wrapping the cause.
    pub async fn match_device(&self, user_agent: Option<&str>) -> Result<DeviceProfile> {
        let raw = require("User-Agent", user_agent)?;
        info!("Matching device | userAgent={}", raw);

        self.find_or_create_and_count(raw).await.map_err(|e| {
            error!("Device match failed | userAgent={} error={}", raw, e);
            DeviceMatcherError::device_match(
                format!("Error matching device for user agent '{}'", raw),
                e,
            )
        })
    }

    async fn find_or_create_and_count(&self, raw: &str) -> Result<DeviceProfile> {
        let user_agent = self.parser.parse(raw)?;

        let existing = self
            .repository
            .find_by_user_agent(&user_agent)
            .await?
            .into_iter()
            .next();

        let anchor = match existing {
            Some(profile) => {
                debug!("Existing device {} for {}", profile.device_id(), user_agent);
                profile
            }
            None => {
                let generator = &self.id_generator;
                let profile =
                    DeviceProfile::from(|| generator.new_id(&user_agent), user_agent.clone())?;
                self.repository.persist(&profile).await?;
                info!(
                    "Created device {} | osName={} browserName={}",
                    profile.device_id(),
                    user_agent.os_name(),
                    user_agent.browser_name()
                );
                profile
            }
        };

        let hit_count = match self.repository.increment_hit_count(anchor.device_id()).await {
            Ok(count) => count,
            // 匹配与计数之间被并发删除
            Err(DeviceMatcherError::NotFound(_)) => {
                return Err(DeviceMatcherError::storage(format!(
                    "Device {} was removed before its hit could be counted",
                    anchor.device_id()
                )));
            }
            Err(e) => return Err(e),
        };

        Ok(anchor.with_hit_count(hit_count))
    }

    pub async fn get_device_by_id(&self, device_id: Option<&str>) -> Result<Option<DeviceProfile>> {
        let device_id = require("Device ID", device_id)?;
        info!("Fetching device | deviceId={}", device_id);

        self.repository
            .find_by_id(device_id)
            .await
            .map_err(|e| e.with_context(format!("get_device_by_id({})", device_id)))
            .inspect_err(|e| {
                error!("Failed to fetch device | deviceId={} error={}", device_id, e)
            })
    }

    pub async fn get_devices_by_os(&self, os_name: Option<&str>) -> Result<Vec<DeviceProfile>> {
        let os_name = canonical_name(require("OS name", os_name)?);
        info!("Fetching devices | osName={}", os_name);

        let devices = self
            .repository
            .find_by_os_name(&os_name)
            .await
            .map_err(|e| e.with_context(format!("get_devices_by_os({})", os_name)))
            .inspect_err(|e| error!("Failed to fetch devices | osName={} error={}", os_name, e))?;
        debug!("Found {} devices for osName={}", devices.len(), os_name);
        Ok(devices)
    }

    pub async fn delete_device_by_id(&self, device_id: Option<&str>) -> Result<()> {
        let device_id = require("Device ID", device_id)?;
        info!("Deleting device | deviceId={}", device_id);

        self.repository
            .delete_by_id(device_id)
            .await
            .map_err(|e| e.with_context(format!("delete_device_by_id({})", device_id)))
            .inspect_err(|e| {
                error!("Failed to delete device | deviceId={} error={}", device_id, e)
            })
    }
}

/// Reject absent or whitespace-only input.
fn require<'a>(what: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DeviceMatcherError::validation(format!(
            "{} cannot be null or empty",
            what
        ))),
    }
}
