//! Service layer for business logic
//!
//! The HTTP handlers and the CLI share the same matching service.

mod device_service;

pub use device_service::*;
