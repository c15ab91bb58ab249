//! Flat field representation of a [`DeviceProfile`]
//!
//! The Redis backend stores one hash per device with these camelCase field
//! names.

use std::collections::HashMap;

use crate::domain::{DeviceProfile, UserAgent, Version};
use crate::errors::{DeviceMatcherError, Result};

pub const DEVICE_ID: &str = "deviceId";
pub const HIT_COUNT: &str = "hitCount";
pub const OS_NAME: &str = "osName";
pub const OS_VERSION: &str = "osVersion";
pub const BROWSER_NAME: &str = "browserName";
pub const BROWSER_VERSION: &str = "browserVersion";

pub fn to_fields(profile: &DeviceProfile) -> Vec<(&'static str, String)> {
    let ua = profile.user_agent();
    vec![
        (DEVICE_ID, profile.device_id().to_string()),
        (HIT_COUNT, profile.hit_count().to_string()),
        (OS_NAME, ua.os_name().to_string()),
        (OS_VERSION, ua.os_version().to_string()),
        (BROWSER_NAME, ua.browser_name().to_string()),
        (BROWSER_VERSION, ua.browser_version().to_string()),
    ]
}

/// Rebuild a profile from a stored hash. An empty hash (missing key) is
/// `None`; a hash with missing or malformed fields is a storage error.
pub fn from_fields(fields: &HashMap<String, String>) -> Result<Option<DeviceProfile>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let get = |name: &str| -> Result<&str> {
        fields.get(name).map(String::as_str).ok_or_else(|| {
            DeviceMatcherError::storage(format!("Corrupt device record: missing field '{}'", name))
        })
    };

    let hit_count = get(HIT_COUNT)?.parse::<u64>().map_err(|e| {
        DeviceMatcherError::storage(format!("Corrupt device record: bad hitCount: {}", e))
    })?;

    let user_agent = UserAgent::new(
        get(OS_NAME)?,
        Version::from_stored(get(OS_VERSION)?),
        get(BROWSER_NAME)?,
        Version::from_stored(get(BROWSER_VERSION)?),
    )
    .map_err(|e| DeviceMatcherError::storage(format!("Corrupt device record: {}", e.message())))?;

    DeviceProfile::new(get(DEVICE_ID)?, hit_count, user_agent)
        .map(Some)
        .map_err(|e| DeviceMatcherError::storage(format!("Corrupt device record: {}", e.message())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SemVersion;

    fn as_map(fields: Vec<(&'static str, String)>) -> HashMap<String, String> {
        fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_fields_rebuild_profile() {
        let ua = UserAgent::new(
            "windows 10",
            SemVersion::new(10, 0, 0),
            "chrome",
            Version::Raw("120.0.0.0".into()),
        )
        .unwrap();
        let profile = DeviceProfile::new("windows10-1", 7, ua).unwrap();

        let rebuilt = from_fields(&as_map(to_fields(&profile))).unwrap().unwrap();

        assert_eq!(rebuilt.device_id(), "windows10-1");
        assert_eq!(rebuilt.hit_count(), 7);
        assert_eq!(rebuilt.user_agent(), profile.user_agent());
        assert_eq!(
            rebuilt.user_agent().os_version().as_sem(),
            Some(&SemVersion::new(10, 0, 0))
        );
    }

    #[test]
    fn test_empty_hash_is_missing() {
        assert!(from_fields(&HashMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_hash_is_storage_error() {
        let mut map = HashMap::new();
        map.insert(DEVICE_ID.to_string(), "x".to_string());
        map.insert(HIT_COUNT.to_string(), "not-a-number".to_string());

        let err = from_fields(&map).unwrap_err();
        assert!(matches!(err, DeviceMatcherError::Storage(_)));
    }
}
