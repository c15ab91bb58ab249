//! Library-assisted parsing backed by `woothee`
//!
//! woothee reports unresolved families as `"UNKNOWN"`; those, along with
//! empty values and the `"Other"` placeholder, collapse to the `"unknown"`
//! sentinel. Versions are reduced to a `SemVersion` from the leading numeric
//! run of the classifier output.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use woothee::parser::Parser;

use super::{UserAgentParser, ensure_not_blank};
use crate::domain::{SemVersion, UNKNOWN, UserAgent};
use crate::errors::{DeviceMatcherError, Result};

const WOOTHEE_UNKNOWN: &str = "UNKNOWN";
const OTHER: &str = "Other";

static VERSION_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:[._](\d+))?(?:[._](\d+))?").expect("version regex is valid")
});

#[derive(Debug, Default)]
pub struct WootheeParser;

impl WootheeParser {
    pub fn new() -> Self {
        Self
    }
}

impl UserAgentParser for WootheeParser {
    fn parse(&self, raw: &str) -> Result<UserAgent> {
        trace!("Parsing User-Agent with woothee | userAgent={}", raw);
        ensure_not_blank(raw)?;

        let wrap = |cause: &dyn std::fmt::Display| {
            DeviceMatcherError::parsing("Error parsing user agent", raw, cause)
        };

        let parser = Parser::new();
        let (os, os_version, name, version) = match parser.parse(raw) {
            Some(result) => (
                result.os.to_string(),
                result.os_version.to_string(),
                result.name.to_string(),
                result.version.to_string(),
            ),
            None => {
                debug!("woothee could not classify User-Agent | userAgent={}", raw);
                (String::new(), String::new(), String::new(), String::new())
            }
        };

        let os_version = version_triple(&os_version).map_err(|e| wrap(&e))?;
        let browser_version = version_triple(&version).map_err(|e| wrap(&e))?;

        UserAgent::new(
            family_or_unknown(&os),
            os_version,
            family_or_unknown(&name),
            browser_version,
        )
        .map_err(|e| wrap(&e))
    }

    fn name(&self) -> &'static str {
        "woothee"
    }
}

/// Substitute the `"unknown"` sentinel for unresolved families.
fn family_or_unknown(family: &str) -> &str {
    let family = family.trim();
    if family.is_empty()
        || family.eq_ignore_ascii_case(WOOTHEE_UNKNOWN)
        || family.eq_ignore_ascii_case(OTHER)
    {
        UNKNOWN
    } else {
        family
    }
}

/// Leading `major[.minor[.patch]]` run of a classifier version, missing parts
/// defaulting to 0. `"NT 10.0"` → `10.0.0`, `"17_1"` → `17.1.0`,
/// `"UNKNOWN"` → `0.0.0`.
fn version_triple(text: &str) -> std::result::Result<SemVersion, String> {
    let Some(caps) = VERSION_RUN.captures(text) else {
        return Ok(SemVersion::default());
    };

    let component = |idx: usize| -> std::result::Result<u64, String> {
        match caps.get(idx) {
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .map_err(|e| format!("version component '{}' out of range: {}", m.as_str(), e)),
            None => Ok(0),
        }
    };

    Ok(SemVersion::new(component(1)?, component(2)?, component(3)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_parse_chrome_on_windows() {
        let ua = WootheeParser::new().parse(CHROME_WINDOWS).unwrap();

        assert_eq!(ua.browser_name(), "chrome");
        assert_eq!(ua.browser_version().as_sem().map(|v| v.major()), Some(120));
        assert_eq!(ua.os_name(), "windows 10");
        assert!(ua.os_version().as_sem().is_some());
    }

    #[test]
    fn test_parse_safari_on_iphone() {
        let ua = WootheeParser::new().parse(SAFARI_IPHONE).unwrap();

        assert_eq!(ua.browser_name(), "safari");
        assert_eq!(ua.os_name(), "iphone");
    }

    #[test]
    fn test_unclassified_input_maps_to_unknown() {
        let ua = WootheeParser::new().parse("zzzz").unwrap();

        assert_eq!(ua.os_name(), UNKNOWN);
        assert_eq!(ua.browser_name(), UNKNOWN);
        assert_eq!(ua.os_version().as_sem(), Some(&SemVersion::default()));
        assert_eq!(ua.browser_version().as_sem(), Some(&SemVersion::default()));
    }

    #[test]
    fn test_names_are_lower_case() {
        for raw in [CHROME_WINDOWS, SAFARI_IPHONE, "zzzz"] {
            let ua = WootheeParser::new().parse(raw).unwrap();
            assert_eq!(ua.os_name(), ua.os_name().to_lowercase());
            assert_eq!(ua.browser_name(), ua.browser_name().to_lowercase());
        }
    }

    #[test]
    fn test_family_or_unknown() {
        assert_eq!(family_or_unknown(""), UNKNOWN);
        assert_eq!(family_or_unknown("UNKNOWN"), UNKNOWN);
        assert_eq!(family_or_unknown("Other"), UNKNOWN);
        assert_eq!(family_or_unknown("other"), UNKNOWN);
        assert_eq!(family_or_unknown("Firefox"), "Firefox");
    }

    #[test]
    fn test_version_triple() {
        assert_eq!(version_triple("120.0.6099.109").unwrap(), SemVersion::new(120, 0, 6099));
        assert_eq!(version_triple("NT 10.0").unwrap(), SemVersion::new(10, 0, 0));
        assert_eq!(version_triple("17_1").unwrap(), SemVersion::new(17, 1, 0));
        assert_eq!(version_triple("UNKNOWN").unwrap(), SemVersion::default());
        assert_eq!(version_triple("").unwrap(), SemVersion::default());
        assert!(version_triple("99999999999999999999999").is_err());
    }
}
