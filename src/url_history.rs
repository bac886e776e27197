//! Recently opened playlist URLs, most recent first

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const MAX_URLS: usize = 20;

#[derive(Debug)]
pub struct UrlHistory {
    path: PathBuf,
    urls: Vec<String>,
}

impl UrlHistory {
    /// Load the history file. A missing or unparsable file is an empty history.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let urls = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(urls) => urls,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unparsable URL history");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read URL history");
                Vec::new()
            }
        };
        Self { path, urls }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Move `url` to the front, keeping at most [`MAX_URLS`] entries.
    pub fn add(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(());
        }

        let mut urls = Vec::with_capacity(MAX_URLS);
        urls.push(url.to_string());
        urls.extend(self.urls.iter().filter(|u| u.as_str() != url).cloned());
        urls.truncate(MAX_URLS);

        self.save(&urls)?;
        self.urls = urls;
        Ok(())
    }

    /// Replace the whole history, keeping the first occurrence of each URL.
    pub fn replace(&mut self, urls: Vec<String>) -> Result<()> {
        let mut kept: Vec<String> = Vec::with_capacity(MAX_URLS);
        for url in urls {
            if !url.trim().is_empty() && !kept.contains(&url) {
                kept.push(url);
            }
        }
        kept.truncate(MAX_URLS);

        self.save(&kept)?;
        self.urls = kept;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.save(&[])?;
        self.urls.clear();
        Ok(())
    }

    fn save(&self, urls: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::file(parent, e))?;
        }
        let content = serde_json::to_string_pretty(urls)?;
        fs::write(&self.path, content).map_err(|e| Error::file(&self.path, e))?;
        debug!(path = %self.path.display(), count = urls.len(), "saved URL history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_in(dir: &tempfile::TempDir) -> UrlHistory {
        UrlHistory::load(dir.path().join("playlist_urls.json"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(history_in(&dir).is_empty());
    }

    #[test]
    fn test_unparsable_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("playlist_urls.json"), "{\"not\": \"a list\"}").unwrap();
        assert!(history_in(&dir).is_empty());
    }

    #[test]
    fn test_keeps_twenty_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir);
        for i in 0..21 {
            history.add(&format!("http://host/{}.m3u", i)).unwrap();
        }

        assert_eq!(history.len(), MAX_URLS);
        assert_eq!(history.urls()[0], "http://host/20.m3u");
        assert_eq!(history.urls()[19], "http://host/1.m3u");
        assert!(!history.urls().contains(&"http://host/0.m3u".to_string()));
    }

    #[test]
    fn test_readd_moves_to_front() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir);
        history.add("http://a").unwrap();
        history.add("http://b").unwrap();
        history.add("http://c").unwrap();

        history.add("http://a").unwrap();
        assert_eq!(history.urls(), ["http://a", "http://c", "http://b"]);
    }

    #[test]
    fn test_blank_url_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir);
        history.add("   ").unwrap();
        assert!(history.is_empty());
        assert!(!history.path().exists());
    }

    #[test]
    fn test_replace_dedups_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir);
        let mut urls: Vec<String> = (0..30).map(|i| format!("http://h/{}", i)).collect();
        urls.insert(1, "http://h/0".to_string());
        urls.insert(2, String::new());

        history.replace(urls).unwrap();
        assert_eq!(history.len(), MAX_URLS);
        assert_eq!(history.urls()[1], "http://h/1");
    }

    #[test]
    fn test_persisted_and_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir);
        history.add("http://a").unwrap();
        history.add("http://b").unwrap();

        let reloaded = history_in(&dir);
        assert_eq!(reloaded.urls(), ["http://b", "http://a"]);

        history.clear().unwrap();
        assert!(history.is_empty());
        assert!(history_in(&dir).is_empty());
    }
}
