//! Config directory resolution.

use crate::error::DraftError;
use directories::BaseDirs;
use std::path::PathBuf;

pub const APP_DIR: &str = "dailydraft";

/// `$XDG_CONFIG_HOME` when set, otherwise the platform config directory.
pub fn config_home() -> Result<PathBuf, DraftError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| DraftError::ConfigError("Could not determine config directory".to_string()))
}

/// `<config home>/dailydraft/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    config_home()
        .ok()
        .map(|home| home.join(APP_DIR).join("config.toml"))
}
