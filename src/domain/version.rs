//! Version values for operating systems and browsers
//!
//! [`SemVersion`] is the structured `major.minor.patch` form produced by the
//! library-assisted parser. [`Version`] also admits a raw dotted string, which
//! is what the regex grammar captures.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reason a version string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionParseErrorKind {
    /// Input was empty or whitespace only
    Blank,
    /// First component was empty (e.g. `".1.2"`)
    MissingMajor,
    /// A present component was not an unsigned integer
    InvalidComponent {
        component: &'static str,
        value: String,
    },
}

/// Error returned by [`SemVersion::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError {
    pub input: String,
    pub kind: VersionParseErrorKind,
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version '{}': ", self.input)?;
        match &self.kind {
            VersionParseErrorKind::Blank => write!(f, "version string is blank"),
            VersionParseErrorKind::MissingMajor => write!(f, "major version is mandatory"),
            VersionParseErrorKind::InvalidComponent { component, value } => {
                write!(f, "{} version must be a valid number, got '{}'", component, value)
            }
        }
    }
}

impl std::error::Error for VersionParseError {}

/// Ordered `major.minor.patch` triple.
///
/// Field order matters: the derived `Ord` compares major, then minor, then
/// patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVersion {
    major: u64,
    minor: u64,
    patch: u64,
}

impl SemVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Lenient parse of `major[.minor[.patch]]`.
    ///
    /// Missing or blank minor/patch default to 0. Components after the third
    /// are ignored.
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        let fail = |kind| VersionParseError {
            input: text.to_string(),
            kind,
        };

        if text.trim().is_empty() {
            return Err(fail(VersionParseErrorKind::Blank));
        }

        let mut parts = text.split('.');
        let major = match parts.next() {
            Some(p) if !p.trim().is_empty() => p,
            _ => return Err(fail(VersionParseErrorKind::MissingMajor)),
        };
        let major = parse_component(major, "major").map_err(fail)?;
        let minor = parse_optional_component(parts.next(), "minor").map_err(fail)?;
        let patch = parse_optional_component(parts.next(), "patch").map_err(fail)?;

        Ok(Self::new(major, minor, patch))
    }
}

fn parse_component(
    value: &str,
    component: &'static str,
) -> Result<u64, VersionParseErrorKind> {
    value
        .parse::<u64>()
        .map_err(|_| VersionParseErrorKind::InvalidComponent {
            component,
            value: value.to_string(),
        })
}

fn parse_optional_component(
    value: Option<&str>,
    component: &'static str,
) -> Result<u64, VersionParseErrorKind> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_component(v, component),
        _ => Ok(0),
    }
}

impl fmt::Display for SemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SemVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SemVersion::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// OS or browser version: structured when the parser could resolve all three
/// components, otherwise the raw captured text.
///
/// Equality and hashing use the string form, so `Sem(1.2.3)` equals
/// `Raw("1.2.3")`.
#[derive(Debug, Clone)]
pub enum Version {
    Sem(SemVersion),
    Raw(String),
}

impl Version {
    /// Rebuild a version from its stored string form.
    ///
    /// Text that is exactly the canonical `a.b.c` form of a `SemVersion`
    /// comes back as `Sem`, anything else (including `10.05.1`) as `Raw`, so
    /// `Version::from_stored(&v.to_string()) == v` for every `v`.
    pub fn from_stored(text: &str) -> Self {
        if let Ok(v) = SemVersion::parse(text)
            && v.to_string() == text
        {
            return Version::Sem(v);
        }
        Version::Raw(text.to_string())
    }

    pub fn as_sem(&self) -> Option<&SemVersion> {
        match self {
            Version::Sem(v) => Some(v),
            Version::Raw(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Version::Raw(s) if s.is_empty())
    }

    fn text(&self) -> Cow<'_, str> {
        match self {
            Version::Sem(v) => Cow::Owned(v.to_string()),
            Version::Raw(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::Raw(String::new())
    }
}

impl From<SemVersion> for Version {
    fn from(v: SemVersion) -> Self {
        Version::Sem(v)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Sem(v) => write!(f, "{}", v),
            Version::Raw(s) => f.write_str(s),
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Version::Sem(a), Version::Sem(b)) => a == b,
            _ => self.text() == other.text(),
        }
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text().hash(state);
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Version::from_stored(&s))
    }
}
