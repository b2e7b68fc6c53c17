//! Re-exports the persisted engine preferences and resolves the active config.

pub use carryover_config::{Config, ConfigError, ConfigManager, DATA_ROOT_ENV};

use crate::errors::Result;

/// Manager rooted at the default data directory (`$CARRYOVER_HOME` or `~/.carryover`).
pub fn default_manager() -> Result<ConfigManager> {
    let base = Config::default().resolve_data_root();
    Ok(ConfigManager::with_base_dir(base)?)
}

/// Loads the saved config, or the defaults when nothing was saved yet.
pub fn load_or_default(manager: &ConfigManager) -> Result<Config> {
    let config = manager.load()?;
    tracing::debug!(path = %manager.config_path().display(), "configuration loaded");
    Ok(config)
}
