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


//! Audio format detection
//!
//! # Supported Formats
//! - MP3: MPEG Audio Layer 3, with or without a leading ID3v2 tag
//! - FLAC: Free Lossless Audio Codec
//!
//! # Detection Strategy
//! 1. Use `Meta.format` when it names a supported format
//! 2. Otherwise read the magic bytes of the decrypted audio

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes of decrypted audio needed by [`AudioFormat::sniff`]
pub const SNIFF_LEN: usize = 4;

/// Audio formats a container can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Flac,
}

impl AudioFormat {
    /// Parse the `format` field of song metadata (case-insensitive)
    pub fn from_meta_format(format: &str) -> Option<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    /// Detect format from the first bytes of decrypted audio
    ///
    /// - `ID3` (ID3v2 tag) → MP3
    /// - `0xFF 0xEx` (MPEG frame sync) → MP3
    /// - `fLaC` → FLAC
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"fLaC") {
            return Some(Self::Flac);
        }
        if header.starts_with(b"ID3") {
            return Some(Self::Mp3);
        }
        match header {
            [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some(Self::Mp3),
            _ => None,
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
        }
    }

    /// Pick the output format: metadata first, then sniffed bytes
    pub fn resolve(meta_format: &str, header: &[u8]) -> Option<Self> {
        Self::from_meta_format(meta_format).or_else(|| Self::sniff(header))
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
