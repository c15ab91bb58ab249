//! API 类型定义

use serde::{Deserialize, Serialize};

use crate::domain::DeviceProfile;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfileResponse {
    pub device_id: String,
    pub hit_count: u64,
    pub os_name: String,
    pub os_version: String,
    pub browser_name: String,
    pub browser_version: String,
}

impl From<&DeviceProfile> for DeviceProfileResponse {
    fn from(profile: &DeviceProfile) -> Self {
        let ua = profile.user_agent();
        Self {
            device_id: profile.device_id().to_string(),
            hit_count: profile.hit_count(),
            os_name: ua.os_name().to_string(),
            os_version: ua.os_version().to_string(),
            browser_name: ua.browser_name().to_string(),
            browser_version: ua.browser_version().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeviceProfilesResponse {
    pub devices: Vec<DeviceProfileResponse>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub parser: String,
    pub timestamp: String,
    /// 运行秒数
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
