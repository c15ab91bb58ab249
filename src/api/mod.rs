//! HTTP surface
//!
//! - `/v1/devices`: device matching and lookup
//! - `/health`: storage liveness

pub mod middleware;
pub mod services;
