pub mod ask;
pub mod config_cmd;
pub mod daemon;
pub mod select;
pub mod status;

use aria_config::AppConfig;
use std::path::Path;

/// Load the configuration from `path`, or from `~/.aria/config.toml`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}
