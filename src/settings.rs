//! Export, import and reset of all user data as a single JSON bundle

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::Playlist;
use crate::playlist_store::{file_stem, PlaylistStore, PLAYLIST_EXTENSION};
use crate::url_history::UrlHistory;

/// On-disk layout of an exported bundle
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SettingsBundle {
    #[serde(rename = "playlist_urls.json", default)]
    pub urls: Vec<String>,
    /// Playlist documents keyed by their file name
    #[serde(default)]
    pub playlists: BTreeMap<String, Playlist>,
}

pub fn collect(config: &AppConfig) -> Result<SettingsBundle> {
    let history = UrlHistory::load(&config.url_history_file);
    let store = PlaylistStore::open(&config.playlists_dir)?;
    Ok(SettingsBundle {
        urls: history.urls().to_vec(),
        playlists: store
            .iter()
            .map(|p| (format!("{}.{}", file_stem(&p.name), PLAYLIST_EXTENSION), p.clone()))
            .collect(),
    })
}

pub fn export(config: &AppConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bundle = collect(config)?;
    let content = serde_json::to_string_pretty(&bundle)?;
    fs::write(path, content).map_err(|e| Error::file(path, e))?;
    info!(
        path = %path.display(),
        playlists = bundle.playlists.len(),
        urls = bundle.urls.len(),
        "exported settings"
    );
    Ok(())
}

/// Write a bundle's contents into the configured locations.
///
/// Playlists are stored under their own names; the bundle's file-name keys
/// are never used as paths. Existing playlists with the same name are
/// replaced. Returns the number of playlists imported.
pub fn import(config: &AppConfig, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
    let bundle: SettingsBundle = serde_json::from_str(&content)?;

    let mut history = UrlHistory::load(&config.url_history_file);
    history.replace(bundle.urls)?;

    let mut store = PlaylistStore::open(&config.playlists_dir)?;
    let count = bundle.playlists.len();
    for playlist in bundle.playlists.into_values() {
        store.import(playlist)?;
    }
    info!(path = %path.display(), playlists = count, "imported settings");
    Ok(count)
}

/// Delete the URL history and every saved playlist.
pub fn reset(config: &AppConfig) -> Result<()> {
    match fs::remove_file(&config.url_history_file) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::file(&config.url_history_file, e)),
    }
    match fs::remove_dir_all(&config.playlists_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::file(&config.playlists_dir, e)),
    }
    info!("reset user data");
    Ok(())
}
