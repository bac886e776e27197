//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::m3u_parser::FetchOptions;

const APP_DIR: &str = "iptv_player";

fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_playlists_dir")]
    pub playlists_dir: PathBuf,
    #[serde(default = "default_url_history_file")]
    pub url_history_file: PathBuf,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_external_player")]
    pub external_player: String,
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_playlists_dir() -> PathBuf { app_dir().join("playlists") }
fn default_url_history_file() -> PathBuf { app_dir().join("playlist_urls.json") }
fn default_user_agent() -> String { FetchOptions::default().user_agent }
fn default_request_timeout() -> u64 { 60 }
fn default_connect_timeout() -> u64 { 30 }
fn default_external_player() -> String { "ffplay".to_string() }
fn default_volume() -> u8 { 100 }
fn default_log_level() -> String { "info".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playlists_dir: default_playlists_dir(),
            url_history_file: default_url_history_file(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            external_player: default_external_player(),
            volume: default_volume(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        app_dir().join("config.json")
    }

    /// Load from the default location. Never fails: missing or unreadable
    /// settings fall back to defaults.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let mut config: Self = fs::read_to_string(path.as_ref())
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        config.volume = config.volume.min(100);
        config
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path())
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::file(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| Error::file(path, e))
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("config.json"));
        assert_eq!(config, AppConfig::default());
        assert!(config.playlists_dir.ends_with("playlists"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"external_player": "mpv", "volume": 250}"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.external_player, "mpv");
        assert_eq!(config.volume, 100);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.user_agent = "VLC/3.0.20".to_string();
        config.volume = 40;
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path), config);
        assert_eq!(config.fetch_options().user_agent, "VLC/3.0.20");
    }
}
