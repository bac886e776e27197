//! IPTV player core
//!
//! M3U/M3U8 parsing, user playlists persisted to disk, the recently opened
//! URL list, and a playback façade over an external media engine.

pub mod config;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod m3u_parser;
pub mod models;
pub mod player;
pub mod playlist_store;
pub mod settings;
pub mod url_history;

mod m3u_parser_tests;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use m3u_parser::{FetchOptions, M3uParser, ParsedPlaylist};
pub use models::{Channel, Playlist, PlaylistSummary};
pub use player::{ExternalPlayer, MediaEngine, Player, PlayerEvent, PlayerState};
pub use playlist_store::PlaylistStore;
pub use url_history::UrlHistory;
