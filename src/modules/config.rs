use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const DATA_DIR: &str = ".pedido_bridge";
const CONFIG_FILE: &str = "bridge_config.json";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "PEDIDO_BRIDGE_CONFIG";

/// Get data directory path, creating it if needed
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Path of the config file: `$PEDIDO_BRIDGE_CONFIG` or the data directory default
pub fn config_path() -> AppResult<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(get_data_dir()?.join(CONFIG_FILE)),
    }
}

/// Load application config
pub fn load_app_config() -> AppResult<AppConfig> {
    load_app_config_from(&config_path()?)
}

/// Load config from an explicit path; a missing file yields the defaults
pub fn load_app_config_from(path: &Path) -> AppResult<AppConfig> {
    if !path.exists() {
        tracing::info!("No config file at {:?}, using defaults", path);
        return Ok(AppConfig::new());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;
    config.relay.validate()?;

    Ok(config)
}

/// Save application config
pub fn save_app_config(config: &AppConfig) -> AppResult<()> {
    save_app_config_to(config, &config_path()?)
}

pub fn save_app_config_to(config: &AppConfig, path: &Path) -> AppResult<()> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
