//! Text decoding for playlist bodies
//!
//! Playlists in the wild come in whatever charset the provider's tooling
//! produced (Windows-1256 Arabic lists, Latin-1 European lists, UTF-16 from
//! Windows editors) and are sometimes gzip-compressed. Detection order:
//! gzip magic, BOM, strict UTF-8, chardetng guess, UTF-8 fallback.

use std::io::Read;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Upper bound on an inflated body, matching the download cap
pub const MAX_INFLATED_BYTES: u64 = 64 * 1024 * 1024;

/// Inflate `data` if it carries the gzip magic number.
pub fn maybe_gunzip(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 || data[..2] != GZIP_MAGIC {
        return Ok(data.to_vec());
    }
    let mut out = Vec::with_capacity(data.len() * 4);
    GzDecoder::new(data)
        .take(MAX_INFLATED_BYTES + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::Decode(format!("gzip: {}", e)))?;
    if out.len() as u64 > MAX_INFLATED_BYTES {
        return Err(Error::Decode(format!(
            "gzip: inflated body exceeds {} bytes",
            MAX_INFLATED_BYTES
        )));
    }
    debug!(compressed = data.len(), inflated = out.len(), "inflated gzip playlist");
    Ok(out)
}

fn detect_bom(data: &[u8]) -> Option<(&'static Encoding, usize)> {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some((UTF_8, 3))
    } else if data.starts_with(&[0xFF, 0xFE]) {
        Some((UTF_16LE, 2))
    } else if data.starts_with(&[0xFE, 0xFF]) {
        Some((UTF_16BE, 2))
    } else {
        None
    }
}

fn guess_encoding(data: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    detector.guess(None, true)
}

fn decode_strict(encoding: &'static Encoding, data: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(data)
        .map(|text| text.into_owned())
}

/// Decode raw playlist bytes into text.
pub fn decode_bytes(data: &[u8]) -> Result<String> {
    let data = maybe_gunzip(data)?;

    if let Some((encoding, bom_len)) = detect_bom(&data) {
        debug!(encoding = encoding.name(), "encoding from BOM");
        return decode_strict(encoding, &data[bom_len..]).ok_or_else(|| {
            Error::Decode(format!("invalid {} data after BOM", encoding.name()))
        });
    }

    if let Ok(text) = std::str::from_utf8(&data) {
        return Ok(text.to_string());
    }

    let guessed = guess_encoding(&data);
    debug!(encoding = guessed.name(), "encoding from detector");
    if let Some(text) = decode_strict(guessed, &data) {
        return Ok(text);
    }

    decode_strict(UTF_8, &data).ok_or_else(|| {
        Error::Decode(format!(
            "could not decode as {} or UTF-8",
            guessed.name()
        ))
    })
}
