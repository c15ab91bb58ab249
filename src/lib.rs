//! devicematcher - User-Agent based device identification
//!
//! Parses raw `User-Agent` headers into a canonical fingerprint and maps each
//! fingerprint to a stable device profile with an atomically incremented hit
//! counter.
//!
//! # Architecture
//! - `domain`: versions, user agents, device profiles, id generation
//! - `parser`: woothee-backed and regex-grammar User-Agent parsers
//! - `storage`: repository trait with memory and Redis backends
//! - `services`: the device matching service
//! - `api`: HTTP services and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod parser;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
