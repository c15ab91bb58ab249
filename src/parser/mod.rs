//! User-Agent parsing strategies
//!
//! Both strategies implement [`UserAgentParser`] and share one contract:
//! a blank input or any internal failure comes back as
//! [`DeviceMatcherError::Parsing`] carrying the original string, never a
//! partially filled [`UserAgent`].
//!
//! - [`WootheeParser`]: token classification by the `woothee` database
//! - [`RegexParser`]: self-contained `Mozilla/…` grammar

mod regex;
mod woothee;

use std::sync::Arc;

use crate::config::ParserStrategy;
use crate::domain::UserAgent;
use crate::errors::{DeviceMatcherError, Result};

pub use self::regex::RegexParser;
pub use self::woothee::WootheeParser;

pub trait UserAgentParser: Send + Sync {
    /// Decompose a raw `User-Agent` header into a canonical [`UserAgent`].
    fn parse(&self, raw: &str) -> Result<UserAgent>;

    /// Strategy name, used in logs and the health endpoint.
    fn name(&self) -> &'static str;
}

/// Build the parser selected by configuration.
pub fn build_parser(strategy: ParserStrategy) -> Arc<dyn UserAgentParser> {
    match strategy {
        ParserStrategy::Woothee => Arc::new(WootheeParser::new()),
        ParserStrategy::Regex => Arc::new(RegexParser::new()),
    }
}

/// Pre-flight check shared by every strategy.
pub(crate) fn ensure_not_blank(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(DeviceMatcherError::parsing(
            "Error parsing user agent",
            raw,
            "illegal argument: User-Agent string is blank",
        ));
    }
    Ok(())
}
