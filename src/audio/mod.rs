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


//! Audio-side processing of decoded containers
//!
//! - `metadata`: decodes the song metadata block
//! - `format`: output format selection and header sniffing
//! - `tag`: capability interface for format-specific tag writers

pub mod format;
pub mod metadata;
pub mod tag;

pub use format::AudioFormat;
pub use metadata::{decode_meta, Album, Artist, Meta, MetaOutcome};
pub use tag::{cover_mime, select_writer, CoverArt, TagPlan, TagWriter};
