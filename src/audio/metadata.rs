// ncm-core - NetEase Cloud Music container decoder
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Song metadata decoding
//!
//! # Metadata Block
//! 1. XOR every byte with `0x63` (the result is kept verbatim as `comment`)
//! 2. Drop the 22-byte marker `163 key(Don't modify):`
//! 3. Base64-decode
//! 4. AES-128-ECB with [`MODIFY_KEY`], strip PKCS#7
//! 5. Drop the 6-byte marker `music:`
//! 6. Parse JSON
//!
//! # JSON Fields
//! - `musicId`, `musicName`, `bitrate`, `duration`, `format`
//! - `artist`: array of `[name, id]` pairs
//! - `album`, `albumId`, `albumPic`: grouped into [`Album`]
//!
//! Numeric fields are accepted as JSON numbers or numeric strings.
//!
//! # Failure Policy
//! Bytes of the deobfuscated block that are not valid UTF-8 are dropped
//! from `comment`.
//!
//! Nothing on this path aborts a decode. Steps 2-6 failing yields a
//! [`MetaOutcome::Fallback`] that still carries the deobfuscated comment.
//! An empty block yields [`MetaOutcome::Inferred`], whose format is
//! guessed from the source size.

use crate::crypto::ecb::{decrypt_and_unpad, xor_in_place};
use crate::error::{NcmError, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const META_XOR: u8 = 0x63;

/// AES secret for the metadata block ("#14ljk_!\]&0U<'(")
pub const MODIFY_KEY: [u8; 16] = [
    0x23, 0x31, 0x34, 0x6C, 0x6A, 0x6B, 0x5F, 0x21, 0x5C, 0x5D, 0x26, 0x30, 0x55, 0x3C, 0x27, 0x28,
];

pub const META_MARKER: &str = "163 key(Don't modify):";
pub const MUSIC_MARKER: &str = "music:";

/// Sources below this size are assumed to be MP3 when no metadata exists
pub const FORMAT_SIZE_THRESHOLD: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: u64,
    pub name: String,
    pub cover_url: String,
}

/// Structured song metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub id: u64,
    pub name: String,
    pub album: Option<Album>,
    pub artists: Vec<Artist>,
    pub bit_rate: u64,
    /// Milliseconds
    pub duration: u64,
    /// Lowercase container name, e.g. `mp3` or `flac`; may be empty
    pub format: String,
    /// Deobfuscated metadata block text, empty when the block was empty
    pub comment: String,
}

impl Meta {
    /// Format artists for display: "Artist1, Artist2"
    pub fn format_artists(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn album_name(&self) -> Option<&str> {
        self.album.as_ref().map(|a| a.name.as_str())
    }
}

/// Result of decoding a metadata block
#[derive(Debug)]
pub enum MetaOutcome {
    /// JSON decoded successfully
    Parsed(Meta),
    /// Block was empty; format guessed from source size
    Inferred(Meta),
    /// Block was present but could not be decoded
    Fallback { meta: Meta, reason: NcmError },
}

impl MetaOutcome {
    pub fn meta(&self) -> &Meta {
        match self {
            MetaOutcome::Parsed(meta) | MetaOutcome::Inferred(meta) => meta,
            MetaOutcome::Fallback { meta, .. } => meta,
        }
    }

    pub fn into_meta(self) -> Meta {
        match self {
            MetaOutcome::Parsed(meta) | MetaOutcome::Inferred(meta) => meta,
            MetaOutcome::Fallback { meta, .. } => meta,
        }
    }

    /// Reason the metadata fell back to defaults, if it did
    pub fn fallback_reason(&self) -> Option<&NcmError> {
        match self {
            MetaOutcome::Fallback { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, MetaOutcome::Parsed(_))
    }
}

/// Guess the audio format of a container without metadata
///
/// `cursor` is the read position of the source when the guess is made,
/// which for a fully located container is the source length.
pub fn infer_format(cursor: u64) -> &'static str {
    if cursor < FORMAT_SIZE_THRESHOLD {
        "mp3"
    } else {
        "flac"
    }
}

/// Decode a metadata block
///
/// Never fails; see the module docs for the fallback rules.
pub fn decode_meta(block: &[u8], cursor: u64) -> MetaOutcome {
    if block.is_empty() {
        let format = infer_format(cursor);
        debug!(cursor, format, "no metadata block, inferring format");
        return MetaOutcome::Inferred(Meta {
            format: format.to_string(),
            ..Meta::default()
        });
    }

    let mut text = block.to_vec();
    xor_in_place(&mut text, META_XOR);
    let comment = utf8_dropping_invalid(&text);

    match parse_payload(&text) {
        Ok(meta) => MetaOutcome::Parsed(Meta { comment, ..meta }),
        Err(reason) => {
            warn!(error = %reason, "metadata could not be decoded, using defaults");
            MetaOutcome::Fallback {
                meta: Meta {
                    comment,
                    ..Meta::default()
                },
                reason,
            }
        }
    }
}

/// Steps 2-6 on the XOR-deobfuscated block
fn parse_payload(text: &[u8]) -> Result<Meta> {
    let encoded = strip_marker(text, META_MARKER)?;
    let encrypted = general_purpose::STANDARD.decode(encoded)?;
    let plain = decrypt_and_unpad(&MODIFY_KEY, &encrypted, "meta block")?;
    let json = strip_marker(&plain, MUSIC_MARKER)?;

    let raw: RawMeta = serde_json::from_slice(json)?;
    Ok(raw.into_meta())
}

/// Decode UTF-8, dropping invalid sequences rather than replacing them
fn utf8_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to marks a checked prefix
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => return out,
                }
            }
        }
    }
}

fn strip_marker<'a>(data: &'a [u8], marker: &'static str) -> Result<&'a [u8]> {
    data.get(marker.len()..).ok_or(NcmError::MissingMarker {
        marker,
        len: data.len(),
    })
}

/// Metadata JSON as written by the client
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMeta {
    #[serde(rename = "musicId")]
    music_id: Option<Value>,
    #[serde(rename = "musicName")]
    music_name: Option<String>,
    artist: Option<Vec<Value>>,
    album: Option<String>,
    #[serde(rename = "albumId")]
    album_id: Option<Value>,
    #[serde(rename = "albumPic")]
    album_pic: Option<String>,
    bitrate: Option<Value>,
    duration: Option<Value>,
    format: Option<String>,
}

impl RawMeta {
    fn into_meta(self) -> Meta {
        let album = if self.album.is_some() || self.album_id.is_some() || self.album_pic.is_some() {
            Some(Album {
                id: as_u64(self.album_id.as_ref()),
                name: self.album.unwrap_or_default(),
                cover_url: self.album_pic.unwrap_or_default(),
            })
        } else {
            None
        };

        let artists = self
            .artist
            .unwrap_or_default()
            .iter()
            .filter_map(parse_artist)
            .collect();

        Meta {
            id: as_u64(self.music_id.as_ref()),
            name: self.music_name.unwrap_or_default(),
            album,
            artists,
            bit_rate: as_u64(self.bitrate.as_ref()),
            duration: as_u64(self.duration.as_ref()),
            format: self.format.unwrap_or_default(),
            comment: String::new(),
        }
    }
}

/// `["name", id]` → Artist; entries without a string name are skipped
fn parse_artist(entry: &Value) -> Option<Artist> {
    let pair = entry.as_array()?;
    let name = pair.first()?.as_str()?.to_string();
    Some(Artist {
        name,
        id: as_u64(pair.get(1)),
    })
}

/// Lenient numeric conversion: integers, floats (truncated) and numeric strings
fn as_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}
