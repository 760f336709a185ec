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


//! Tag-writer capability
//!
//! The decoder never writes tags itself. It hands the decoded metadata and
//! cover image to a [`TagWriter`] for the output format. [`TagPlan`] is the
//! format-independent description of what that writer should set.
//!
//! # Plan Rules
//! - Cover: embedded image when the container has cover bytes, otherwise
//!   the album cover URL (fetching it is up to the writer)
//! - Title, album, artists and comment are only set when non-empty

use super::format::AudioFormat;
use super::metadata::Meta;
use crate::error::Result;
use std::path::Path;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// MIME type of a cover image; anything that is not PNG is treated as JPEG
pub fn cover_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&PNG_SIGNATURE) {
        "image/png"
    } else {
        "image/jpeg"
    }
}

/// Where the cover image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverArt {
    Embedded { mime: &'static str, data: Vec<u8> },
    Url(String),
}

/// Tags to apply to one decoded file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPlan {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artists: Vec<String>,
    pub comment: Option<String>,
    pub cover: Option<CoverArt>,
}

impl TagPlan {
    pub fn new(meta: &Meta, cover: &[u8]) -> Self {
        let cover = if !cover.is_empty() {
            Some(CoverArt::Embedded {
                mime: cover_mime(cover),
                data: cover.to_vec(),
            })
        } else {
            meta.album
                .as_ref()
                .map(|a| a.cover_url.as_str())
                .filter(|url| !url.is_empty())
                .map(|url| CoverArt::Url(url.to_string()))
        };

        Self {
            title: non_empty(&meta.name),
            album: meta.album_name().and_then(non_empty),
            artists: meta
                .artists
                .iter()
                .filter(|a| !a.name.is_empty())
                .map(|a| a.name.clone())
                .collect(),
            comment: non_empty(&meta.comment),
            cover,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Writes tags into an audio file of one format
pub trait TagWriter: Send + Sync {
    fn format(&self) -> AudioFormat;

    fn write(&self, path: &Path, plan: &TagPlan) -> Result<()>;
}

/// Pick the writer registered for `format`
pub fn select_writer<'a>(
    writers: &'a [Box<dyn TagWriter>],
    format: AudioFormat,
) -> Option<&'a dyn TagWriter> {
    writers
        .iter()
        .find(|w| w.format() == format)
        .map(|w| w.as_ref())
}
