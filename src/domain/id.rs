//! Device id generation
//!
//! Generators are stateless: every id comes from a fresh UUID v4, so there is
//! no shared counter to coordinate between concurrent requests.

use uuid::Uuid;

use super::user_agent::UserAgent;

pub trait DeviceIdGenerator: Send + Sync {
    fn new_id(&self, user_agent: &UserAgent) -> String;
}

/// `<os-name>-<uuid>`, with the OS name reduced to lower-case ASCII
/// alphanumerics. The prefix is diagnostic only.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAgentIdGenerator;

impl DeviceIdGenerator for UserAgentIdGenerator {
    fn new_id(&self, user_agent: &UserAgent) -> String {
        let prefix: String = user_agent
            .os_name()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        format!("{}-{}", prefix, Uuid::new_v4())
    }
}

/// Bare UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl DeviceIdGenerator for UuidIdGenerator {
    fn new_id(&self, _user_agent: &UserAgent) -> String {
        Uuid::new_v4().to_string()
    }
}
