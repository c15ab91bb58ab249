//! Mode routing
//!
//! - Server mode (HTTP server)
//! - Parse mode (offline User-Agent parsing)

pub mod parse;
pub mod server;

pub use parse::run_parse;
pub use server::run_server;
