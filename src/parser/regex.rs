//! Self-contained `Mozilla/…` grammar
//!
//! ```text
//! Mozilla/<d>.<d> (<platform>[; <detail>][; …]) <…> <product>/<version>
//!     [ Mobile/<build>][ [Mobile ]Safari/<version>]
//! ```
//!
//! platform → OS name, first detail → OS version, the last `product/version`
//! before the optional iOS build token and terminal Safari token → browser.
//! Versions stay raw.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};

use super::{UserAgentParser, ensure_not_blank};
use crate::domain::{UserAgent, Version};
use crate::errors::{DeviceMatcherError, Result};

static UA_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^Mozilla/\d\.\d \(",
        r"([^;)]+)",
        r"(?:;\s*([^;)]+))?",
        r"(?:;[^)]*)?",
        r"\) (?:.*? )?",
        r"([^\s/()]+)/([\d.]+)",
        // iOS 在 Safari 之前插入 `Mobile/15E148` 这样的构建号
        r"(?: Mobile/\S+)?",
        r"(?: (?:Mobile )?Safari/[\d.]+)?$",
    ))
    .expect("User-Agent grammar is valid")
});

/// Safari reports its marketing version as `Version/x.y` in front of the
/// WebKit build token.
const SAFARI_VERSION_PRODUCT: &str = "version";

#[derive(Debug, Default)]
pub struct RegexParser;

impl RegexParser {
    pub fn new() -> Self {
        Self
    }
}

impl UserAgentParser for RegexParser {
    fn parse(&self, raw: &str) -> Result<UserAgent> {
        trace!("Parsing User-Agent with regex grammar | userAgent={}", raw);
        ensure_not_blank(raw)?;

        let Some(caps) = UA_GRAMMAR.captures(raw) else {
            warn!("User-Agent does not match grammar | userAgent={}", raw);
            return Err(DeviceMatcherError::parsing(
                "Error parsing user agent",
                raw,
                format!("illegal argument: Invalid User-Agent: {}", raw),
            ));
        };

        let group = |idx: usize| caps.get(idx).map_or("", |m| m.as_str());

        let os_name = group(1);
        let os_version = Version::Raw(group(2).trim().to_string());
        let mut browser_name = group(3);
        let browser_version = Version::Raw(group(4).to_string());

        if browser_name.eq_ignore_ascii_case(SAFARI_VERSION_PRODUCT) {
            browser_name = "safari";
        }

        UserAgent::new(os_name, os_version, browser_name, browser_version)
            .map_err(|e| DeviceMatcherError::parsing("Error parsing user agent", raw, e))
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}
