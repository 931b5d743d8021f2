//! Application configuration: the default reading speed for freshly opened
//! books. Saved progress carries its own wpm per book, so this only seeds
//! sessions that have nothing to resume.

use crate::engine::DEFAULT_WPM;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub wpm: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { wpm: DEFAULT_WPM }
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            debug!(path = %path.display(), "Using default config: {err}");
            return AppConfig::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(cfg) => {
            debug!(path = %path.display(), "Loaded config");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

/// Best-effort write; a config that fails to save only costs the next run
/// its remembered speed.
pub fn save_config(path: &Path, config: &AppConfig) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match toml::to_string(config) {
        Ok(contents) => {
            if let Err(err) = fs::write(path, contents) {
                warn!(path = %path.display(), "Failed to save config: {err}");
            }
        }
        Err(err) => warn!("Failed to serialize config: {err}"),
    }
}
