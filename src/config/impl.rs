use std::path::Path;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to defaults when
/// [`init_config`] has not run.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads `path` (or the optional `config.toml` in the current directory)
/// plus `DM__*` environment overrides. A second call replaces the stored
/// configuration.
pub fn init_config(path: Option<&Path>) -> Result<Arc<StaticConfig>> {
    let loaded = Arc::new(StaticConfig::load(path)?);
    CONFIG
        .get_or_init(|| ArcSwap::new(loaded.clone()))
        .store(loaded.clone());
    Ok(loaded)
}
