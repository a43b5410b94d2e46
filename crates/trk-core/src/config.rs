use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Directory the platform reads intent firewall rules from.
pub const DEFAULT_IFW_DIR: &str = "/data/system/ifw";

/// Application configuration loaded from ~/.config/trk/config.toml.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub firewall: FirewallConfig,
}

/// Settings for writing intent firewall rules.
#[derive(Debug, Default, Deserialize)]
pub struct FirewallConfig {
    /// Rules directory (defaults to the platform's ifw directory).
    pub dir: Option<PathBuf>,

    /// Ask the platform to log every blocked intent.
    #[serde(default)]
    pub log: bool,
}

/// Get the config file path.
pub fn config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
            .join(".config")
            .join("trk")
            .join("config.toml")
    } else if let Ok(appdata) = std::env::var("APPDATA") {
        PathBuf::from(appdata).join("trk").join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

/// Load the application config from the default path.
pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Load config from `path`. A missing or unreadable file yields defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config at {}: {e}", path.display());
            AppConfig::default()
        }),
        Err(e) => {
            log::warn!("Failed to read config at {}: {e}", path.display());
            AppConfig::default()
        }
    }
}

/// Resolve the rules directory: `TRK_IFW_DIR`, then config, then the platform default.
pub fn ifw_dir(config: &AppConfig) -> PathBuf {
    if let Ok(dir) = std::env::var("TRK_IFW_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    config
        .firewall
        .dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_IFW_DIR))
}
