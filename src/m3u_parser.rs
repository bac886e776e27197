//! M3U playlist parser with HTTPS download support

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, trace};

use crate::encoding::decode_bytes;
use crate::error::{Error, Result};
use crate::models::{Channel, UNKNOWN_GROUP};

const HEADER: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";
const UNKNOWN_NAME: &str = "Unknown";

/// Largest response body accepted from a playlist URL
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

// duration, attributes, optional ",name"
static EXTINF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#EXTINF:(-?\d+)\s*(.*?)(?:,(.*))?$").unwrap());
static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"group-title="(.*?)""#).unwrap());
static LOGO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"tvg-logo="(.*?)""#).unwrap());
static TVG_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"tvg-id="(.*?)""#).unwrap());

/// HTTP settings for [`M3uParser::load_from_url`]
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of one successful parse. Replaced wholesale on the next one.
#[derive(Debug, Clone, Default)]
pub struct ParsedPlaylist {
    pub channels: Vec<Channel>,
    pub groups: BTreeSet<String>,
    /// From `x-tvg-url` / `url-tvg` on the header line
    pub epg_url: Option<String>,
}

/// Holds the channels of the most recently loaded playlist.
#[derive(Debug, Default)]
pub struct M3uParser {
    current: ParsedPlaylist,
}

impl M3uParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.current.channels
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.current.groups
    }

    pub fn epg_url(&self) -> Option<&str> {
        self.current.epg_url.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.channels.is_empty()
    }

    /// Read a local playlist file. Gzip and legacy charsets are handled.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::file(path, e))?;
        let count = self.load_from_bytes(&bytes)?;
        info!(path = %path.display(), channels = count, "loaded playlist file");
        Ok(count)
    }

    pub fn load_from_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let content = decode_bytes(bytes)?;
        self.parse_content(&content)
    }

    /// Fetch a remote playlist with a single GET, no retries.
    pub fn load_from_url(&mut self, url: &str, options: &FetchOptions) -> Result<usize> {
        let bytes = fetch(url, options)?;
        let count = self.load_from_bytes(&bytes)?;
        info!(url, channels = count, "loaded playlist from URL");
        Ok(count)
    }

    /// Parse M3U text, replacing the current channels only on success.
    pub fn parse_content(&mut self, content: &str) -> Result<usize> {
        let parsed = parse_m3u(content)?;
        let count = parsed.channels.len();
        self.current = parsed;
        Ok(count)
    }

    /// Channels whose group equals `group` exactly, in playlist order.
    pub fn channels_by_group(&self, group: &str) -> Vec<&Channel> {
        self.current
            .channels
            .iter()
            .filter(|ch| ch.group == group)
            .collect()
    }

    /// Case-insensitive substring search over channel names, in playlist order.
    pub fn search_channels(&self, query: &str) -> Vec<&Channel> {
        let query = query.to_lowercase();
        self.current
            .channels
            .iter()
            .filter(|ch| ch.name.to_lowercase().contains(&query))
            .collect()
    }
}

/// Download a playlist body (supports HTTP and HTTPS)
pub fn fetch(url: &str, options: &FetchOptions) -> Result<Vec<u8>> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(options.timeout))
        .timeout_connect(Some(options.connect_timeout))
        .build()
        .new_agent();

    let mut response = agent
        .get(url)
        .header("User-Agent", options.user_agent.as_str())
        .call()
        .map_err(|e| Error::Fetch(format!("Request failed: {}", e)))?;

    if response.status() != 200 {
        return Err(Error::Fetch(format!("HTTP error: {}", response.status())));
    }

    response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()
        .map_err(|e| Error::Fetch(format!("Read failed: {}", e)))
}

/// Pending EXTINF data waiting for its URL line
#[derive(Debug)]
struct PendingChannel {
    name: String,
    group: String,
    logo: String,
    tvg_id: String,
}

impl PendingChannel {
    fn into_channel(self, url: &str) -> Channel {
        Channel {
            name: self.name,
            url: url.to_string(),
            logo: self.logo,
            group: self.group,
            quality: String::new(),
            tvg_id: self.tvg_id,
        }
    }
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn parse_extinf(line: &str) -> Option<PendingChannel> {
    let caps = EXTINF_RE.captures(line)?;
    let attrs = caps.get(2).map_or("", |m| m.as_str());
    let name = caps
        .get(3)
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_NAME);

    Some(PendingChannel {
        name: name.to_string(),
        group: capture(&GROUP_RE, attrs)
            .filter(|group| !group.is_empty())
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string()),
        logo: capture(&LOGO_RE, attrs).unwrap_or_default(),
        tvg_id: capture(&TVG_ID_RE, attrs).unwrap_or_default(),
    })
}

/// Extract attribute from #EXTM3U header line
fn extract_header_attr(line: &str, attr_name: &str) -> Option<String> {
    let search = format!("{}=\"", attr_name);
    let start = line.to_ascii_lowercase().find(&search)?;
    let rest = &line[start + search.len()..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Parse M3U text into channels and groups.
///
/// Fails only when the first non-blank line is not the `#EXTM3U` header.
/// Malformed EXTINF lines are dropped together with their URL line.
pub fn parse_m3u(content: &str) -> Result<ParsedPlaylist> {
    let mut lines = content
        .lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}'))
        .skip_while(|line| line.is_empty());

    let header = match lines.next() {
        Some(line) if line.starts_with(HEADER) => line,
        Some(_) => return Err(Error::InvalidFormat("missing #EXTM3U header".to_string())),
        None => return Err(Error::InvalidFormat("empty playlist".to_string())),
    };

    let mut playlist = ParsedPlaylist {
        epg_url: extract_header_attr(header, "x-tvg-url")
            .or_else(|| extract_header_attr(header, "url-tvg")),
        ..Default::default()
    };
    let mut pending: Option<PendingChannel> = None;
    let mut skipped = 0usize;

    for line in lines {
        if line.is_empty() {
            continue;
        }

        if line.starts_with(EXTINF) {
            pending = parse_extinf(line);
            match &pending {
                Some(channel) => {
                    playlist.groups.insert(channel.group.clone());
                }
                None => {
                    skipped += 1;
                    trace!(line, "skipping malformed EXTINF");
                }
            }
        } else if !line.starts_with('#') {
            if let Some(channel) = pending.take() {
                playlist.channels.push(channel.into_channel(line));
            }
        }
    }

    debug!(
        channels = playlist.channels.len(),
        groups = playlist.groups.len(),
        skipped,
        "parsed M3U"
    );
    Ok(playlist)
}
