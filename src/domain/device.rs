use std::fmt;
use std::hash::{Hash, Hasher};

use super::user_agent::UserAgent;
use crate::errors::{DeviceMatcherError, Result};

/// Persisted identity for one fingerprint.
///
/// Identity is the device id alone: equality and hashing ignore the hit
/// count and the user agent snapshot. A profile is never mutated; a new hit
/// count produces a new value via [`DeviceProfile::with_hit_count`].
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    device_id: String,
    hit_count: u64,
    user_agent: UserAgent,
}

impl DeviceProfile {
    pub fn new(
        device_id: impl Into<String>,
        hit_count: u64,
        user_agent: UserAgent,
    ) -> Result<Self> {
        let device_id = device_id.into();
        if device_id.trim().is_empty() {
            return Err(DeviceMatcherError::validation("Device ID cannot be blank"));
        }
        Ok(Self {
            device_id,
            hit_count,
            user_agent,
        })
    }

    /// First sighting of a fingerprint: fresh id, zero hits.
    pub fn from<F>(id_supplier: F, user_agent: UserAgent) -> Result<Self>
    where
        F: FnOnce() -> String,
    {
        Self::new(id_supplier(), 0, user_agent)
    }

    pub fn with_hit_count(&self, hit_count: u64) -> Self {
        Self {
            device_id: self.device_id.clone(),
            hit_count,
            user_agent: self.user_agent.clone(),
        }
    }

    /// Dedup predicate: case-insensitive comparison of the four fingerprint
    /// fields.
    pub fn matches(&self, user_agent: &UserAgent) -> bool {
        let own = &self.user_agent;
        own.os_name().eq_ignore_ascii_case(user_agent.os_name())
            && own.browser_name().eq_ignore_ascii_case(user_agent.browser_name())
            && own
                .os_version()
                .to_string()
                .eq_ignore_ascii_case(&user_agent.os_version().to_string())
            && own
                .browser_version()
                .to_string()
                .eq_ignore_ascii_case(&user_agent.browser_version().to_string())
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub fn user_agent(&self) -> &UserAgent {
        &self.user_agent
    }
}

impl PartialEq for DeviceProfile {
    fn eq(&self, other: &Self) -> bool {
        self.device_id == other.device_id
    }
}

impl Eq for DeviceProfile {}

impl Hash for DeviceProfile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.device_id.hash(state);
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeviceProfile{{device_id='{}', hit_count={}, user_agent={}}}",
            self.device_id, self.hit_count, self.user_agent
        )
    }
}
