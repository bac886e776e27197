//! Named user playlists persisted as one JSON document each
//!
//! The in-memory map is a write-through cache of the save directory: every
//! mutation writes the changed playlist first and only updates the map once
//! the write succeeded.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{Channel, Playlist, PlaylistSummary};

pub const PLAYLIST_EXTENSION: &str = "json";

/// File stem for a playlist name.
///
/// Spaces become `_`; `_`, `%` and characters that are unsafe in file names
/// are percent-escaped, so distinct names never share a file. The empty
/// name maps to a lone `%`, which no escaped name can produce.
pub fn file_stem(name: &str) -> String {
    if name.is_empty() {
        return "%".to_string();
    }
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            ' ' => stem.push('_'),
            '_' | '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => {
                stem.push_str(&format!("%{:02X}", c as u32))
            }
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    stem.push_str(&format!("%{:02X}", byte));
                }
            }
            c => stem.push(c),
        }
    }
    stem
}

#[derive(Debug)]
pub struct PlaylistStore {
    save_dir: PathBuf,
    playlists: HashMap<String, Playlist>,
}

impl PlaylistStore {
    /// Load every playlist document found in `save_dir`.
    ///
    /// The directory is created on first write, so a missing one is simply
    /// an empty store. Unreadable documents are logged and skipped.
    pub fn open(save_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            save_dir: save_dir.into(),
            playlists: HashMap::new(),
        };
        store.load_all()?;
        Ok(store)
    }

    fn load_all(&mut self) -> Result<()> {
        let entries = match fs::read_dir(&self.save_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %self.save_dir.display(), "playlist directory not created yet");
                return Ok(());
            }
            Err(e) => return Err(Error::file(&self.save_dir, e)),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(PLAYLIST_EXTENSION)
            })
            .collect();
        paths.sort();

        for path in paths {
            match read_playlist(&path) {
                Ok(playlist) => self.adopt(playlist, &path),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable playlist"),
            }
        }

        info!(
            dir = %self.save_dir.display(),
            count = self.playlists.len(),
            "loaded playlists"
        );
        Ok(())
    }

    /// Register a playlist read from `path`, moving it to its canonical file
    /// name when it was written under another one.
    fn adopt(&mut self, mut playlist: Playlist, path: &Path) {
        if self.playlists.contains_key(&playlist.name) {
            warn!(
                path = %path.display(),
                name = %playlist.name,
                "duplicate playlist name, keeping the first one"
            );
            return;
        }

        let dropped = playlist.dedup_channels();
        let canonical = self.path_for(&playlist.name);
        if canonical != path || dropped > 0 {
            match self.write(&playlist) {
                Ok(_) if canonical != path => {
                    if let Err(e) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %e, "could not remove legacy playlist file");
                    }
                    info!(from = %path.display(), to = %canonical.display(), "migrated playlist file");
                }
                Ok(_) => {}
                Err(e) => warn!(name = %playlist.name, error = %e, "could not rewrite playlist"),
            }
        }

        self.playlists.insert(playlist.name.clone(), playlist);
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Backing file of the playlist called `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.save_dir
            .join(format!("{}.{}", file_stem(name), PLAYLIST_EXTENSION))
    }

    pub fn get(&self, name: &str) -> Option<&Playlist> {
        self.playlists.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.playlists.contains_key(name)
    }

    /// Playlist names in lexical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.playlists.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.values()
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    fn write(&self, playlist: &Playlist) -> Result<PathBuf> {
        fs::create_dir_all(&self.save_dir).map_err(|e| Error::file(&self.save_dir, e))?;
        let path = self.path_for(&playlist.name);
        let content = serde_json::to_string_pretty(playlist)?;
        fs::write(&path, content).map_err(|e| Error::file(&path, e))?;
        debug!(path = %path.display(), channels = playlist.len(), "saved playlist");
        Ok(path)
    }

    /// Persist `playlist`, then make it the in-memory copy.
    fn commit(&mut self, playlist: Playlist) -> Result<()> {
        self.write(&playlist)?;
        self.playlists.insert(playlist.name.clone(), playlist);
        Ok(())
    }

    fn require(&self, name: &str) -> Result<&Playlist> {
        self.playlists
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Create an empty playlist. An existing playlist of the same name is
    /// returned untouched.
    pub fn create(&mut self, name: &str) -> Result<&Playlist> {
        if !self.playlists.contains_key(name) {
            self.commit(Playlist::new(name))?;
            info!(name, "created playlist");
        }
        self.require(name)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.require(name)?;
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::file(&path, e)),
        }
        self.playlists.remove(name);
        info!(name, "deleted playlist");
        Ok(())
    }

    /// Rename without overwriting: fails if `new_name` is already taken.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let original = self.require(old_name)?.clone();
        if self.playlists.contains_key(new_name) {
            return Err(Error::DuplicateName(new_name.to_string()));
        }

        let mut renamed = original.clone();
        renamed.name = new_name.to_string();

        // Old file goes first: on case-insensitive file systems both names
        // can map to the same file.
        let old_path = self.path_for(old_name);
        match fs::remove_file(&old_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::file(&old_path, e)),
        }

        if let Err(e) = self.write(&renamed) {
            if let Err(restore) = self.write(&original) {
                warn!(name = old_name, error = %restore, "could not restore playlist after failed rename");
            }
            return Err(e);
        }

        self.playlists.remove(old_name);
        self.playlists.insert(renamed.name.clone(), renamed);
        info!(from = old_name, to = new_name, "renamed playlist");
        Ok(())
    }

    /// Add `channel` to a playlist. `Ok(false)` means its URL was already
    /// there and nothing was written.
    pub fn add_channel(&mut self, playlist_name: &str, channel: Channel) -> Result<bool> {
        let mut playlist = self.require(playlist_name)?.clone();
        if !playlist.add_channel(channel) {
            return Ok(false);
        }
        self.commit(playlist)?;
        Ok(true)
    }

    /// Remove the channel sharing `channel`'s URL. `Ok(false)` means it was
    /// not in the playlist.
    pub fn remove_channel(&mut self, playlist_name: &str, channel: &Channel) -> Result<bool> {
        let mut playlist = self.require(playlist_name)?.clone();
        if !playlist.remove_channel(channel) {
            return Ok(false);
        }
        self.commit(playlist)?;
        Ok(true)
    }

    /// Store a playlist built elsewhere (settings import), replacing any
    /// playlist of the same name.
    pub fn import(&mut self, mut playlist: Playlist) -> Result<()> {
        playlist.dedup_channels();
        self.commit(playlist)
    }

    /// Summaries, most recently modified first.
    pub fn history(&self) -> Vec<PlaylistSummary> {
        let mut history: Vec<PlaylistSummary> =
            self.playlists.values().map(Playlist::summary).collect();
        history.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        history
    }

    /// Write a playlist as an M3U file at `path`.
    pub fn export_m3u(&self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let playlist = self.require(name)?;
        fs::write(path, playlist.to_m3u()).map_err(|e| Error::file(path, e))?;
        info!(name, path = %path.display(), "exported playlist");
        Ok(())
    }
}

fn read_playlist(path: &Path) -> Result<Playlist> {
    let content = fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
