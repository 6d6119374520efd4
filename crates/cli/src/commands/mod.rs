pub mod config_cmd;
pub mod gateway;
pub mod task;
pub mod tools;

use std::path::{Path, PathBuf};
use vidscout_config::AppConfig;

/// The config file in use: `--config` when given, the default location otherwise.
pub fn config_file(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load the config file plus environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_file(explicit);
    let config = AppConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}
