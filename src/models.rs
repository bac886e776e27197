//! Data models for the IPTV player core

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Group assigned to channels whose EXTINF carries no `group-title`.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// One playlist entry.
///
/// Two channels are the same channel when their URLs are equal; the other
/// fields are display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub tvg_id: String,
}

fn default_group() -> String {
    UNKNOWN_GROUP.to_string()
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            logo: String::new(),
            group: default_group(),
            quality: String::new(),
            tvg_id: String::new(),
        }
    }
}

impl Channel {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Playlist membership identity
    pub fn same_as(&self, other: &Channel) -> bool {
        self.url == other.url
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.group)
    }
}

/// Current local time, the clock used for playlist timestamps.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A named, user-managed collection of channels (persisted as JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub created: NaiveDateTime,
    pub last_updated: NaiveDateTime,
    #[serde(default)]
    channels: Vec<Channel>,
}

impl Playlist {
    /// Empty playlist stamped with the current time.
    pub fn new(name: &str) -> Self {
        let created = now();
        Self {
            name: name.to_string(),
            created,
            last_updated: created,
            channels: Vec::new(),
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.channels.iter().any(|ch| ch.url == url)
    }

    /// Append `channel` unless its URL is already present.
    /// Returns whether the playlist changed.
    pub fn add_channel(&mut self, channel: Channel) -> bool {
        if self.contains(&channel.url) {
            return false;
        }
        self.channels.push(channel);
        self.last_updated = now();
        true
    }

    /// Remove the entry sharing `channel`'s URL.
    /// Returns whether the playlist changed.
    pub fn remove_channel(&mut self, channel: &Channel) -> bool {
        match self.channels.iter().position(|ch| ch.same_as(channel)) {
            Some(index) => {
                self.channels.remove(index);
                self.last_updated = now();
                true
            }
            None => false,
        }
    }

    /// Drop entries with a URL seen earlier in the list.
    /// Documents written by hand or by older versions may carry duplicates.
    pub(crate) fn dedup_channels(&mut self) -> usize {
        let before = self.channels.len();
        let mut seen = std::collections::HashSet::new();
        self.channels.retain(|ch| seen.insert(ch.url.clone()));
        before - self.channels.len()
    }

    pub fn summary(&self) -> PlaylistSummary {
        PlaylistSummary {
            name: self.name.clone(),
            created: self.created,
            last_updated: self.last_updated,
            channel_count: self.channels.len(),
        }
    }

    /// Render as M3U text that [`crate::M3uParser`] reads back.
    pub fn to_m3u(&self) -> String {
        let mut out = String::from("#EXTM3U\n");
        for ch in &self.channels {
            out.push_str("#EXTINF:-1");
            if !ch.tvg_id.is_empty() {
                out.push_str(&format!(" tvg-id=\"{}\"", ch.tvg_id));
            }
            if !ch.logo.is_empty() {
                out.push_str(&format!(" tvg-logo=\"{}\"", ch.logo));
            }
            out.push_str(&format!(" group-title=\"{}\",{}\n", ch.group, ch.name));
            out.push_str(&ch.url);
            out.push('\n');
        }
        out
    }
}

/// Row of the playlist history view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistSummary {
    pub name: String,
    pub created: NaiveDateTime,
    pub last_updated: NaiveDateTime,
    pub channel_count: usize,
}
