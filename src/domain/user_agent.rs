use std::fmt;

use super::version::Version;
use crate::errors::{DeviceMatcherError, Result};

/// Sentinel for OS / browser families the parser could not resolve.
pub const UNKNOWN: &str = "unknown";

/// Parsed User-Agent fingerprint.
///
/// Names are lower-cased on construction and never blank. Instances are
/// created once per parse and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserAgent {
    os_name: String,
    os_version: Version,
    browser_name: String,
    browser_version: Version,
}

impl UserAgent {
    /// Build a canonical user agent, rejecting blank OS or browser names.
    pub fn new(
        os_name: impl AsRef<str>,
        os_version: impl Into<Version>,
        browser_name: impl AsRef<str>,
        browser_version: impl Into<Version>,
    ) -> Result<Self> {
        let os_name = canonical_name(os_name.as_ref());
        let browser_name = canonical_name(browser_name.as_ref());

        if os_name.is_empty() {
            return Err(DeviceMatcherError::validation("OS name cannot be blank"));
        }
        if browser_name.is_empty() {
            return Err(DeviceMatcherError::validation(
                "Browser name cannot be blank",
            ));
        }

        Ok(Self {
            os_name,
            os_version: os_version.into(),
            browser_name,
            browser_version: browser_version.into(),
        })
    }

    pub fn os_name(&self) -> &str {
        &self.os_name
    }

    pub fn os_version(&self) -> &Version {
        &self.os_version
    }

    pub fn browser_name(&self) -> &str {
        &self.browser_name
    }

    pub fn browser_version(&self) -> &Version {
        &self.browser_version
    }

    /// `os_name|os_version|browser_name|browser_version`, lower-cased.
    ///
    /// Two user agents that [`DeviceProfile::matches`](super::DeviceProfile::matches)
    /// considers equal always produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.os_name,
            self.os_version.to_string().to_ascii_lowercase(),
            self.browser_name,
            self.browser_version.to_string().to_ascii_lowercase()
        )
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UserAgent{{os_name='{}', os_version='{}', browser_name='{}', browser_version='{}'}}",
            self.os_name, self.os_version, self.browser_name, self.browser_version
        )
    }
}

/// Trim and lower-case a family name.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}
