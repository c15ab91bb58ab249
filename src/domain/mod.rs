//! Device-matching domain model
//!
//! - `version`: `SemVersion` and the structured-or-raw `Version`
//! - `user_agent`: canonical parsed fingerprint
//! - `device`: the persisted `DeviceProfile` entity
//! - `id`: stateless device id generators

mod device;
mod id;
mod user_agent;
mod version;

pub use device::DeviceProfile;
pub use id::{DeviceIdGenerator, UserAgentIdGenerator, UuidIdGenerator};
pub use user_agent::{UNKNOWN, UserAgent, canonical_name};
pub use version::{SemVersion, Version, VersionParseError, VersionParseErrorKind};
