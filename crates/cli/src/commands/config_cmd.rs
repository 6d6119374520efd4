//! `vidscout config`: configuration management commands.

use std::path::Path;
use vidscout_config::AppConfig;

const REDACTED: &str = "***";

/// A copy of `config` safe to print.
fn redacted(config: &AppConfig) -> AppConfig {
    let mut shown = config.clone();
    for key in [
        &mut shown.api_key,
        &mut shown.search.api_key,
        &mut shown.video.api_key,
    ] {
        if key.is_some() {
            *key = Some(REDACTED.into());
        }
    }
    shown
}

pub fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&redacted(&config))?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(config_path: Option<&Path>) {
    println!("{}", super::config_file(config_path).display());
}

/// Write the default config to `path` unless a file is already there.
fn write_starter(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(())
}

pub fn init(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_file(config_path);
    write_starter(&path, force)?;

    println!("Wrote {}", path.display());
    println!("Set VIDSCOUT_API_KEY (or api_key in the file) before running `vidscout ask`.");
    Ok(())
}
