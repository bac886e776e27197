//! Error types for the player core

use std::path::PathBuf;

/// Errors surfaced by parsing, persistence and fetching.
///
/// Per-line anomalies inside an M3U body are never reported here; the parser
/// drops them and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The text is not an M3U playlist (missing `#EXTM3U` header).
    #[error("Invalid M3U format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network fetch failed (transport error or non-success status).
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// No usable character encoding could be resolved for the input bytes.
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Playlist already exists: {0}")]
    DuplicateName(String),

    #[error("Playlist not found: {0}")]
    NotFound(String),

    /// The media engine refused an operation.
    #[error("Player error: {0}")]
    Player(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
