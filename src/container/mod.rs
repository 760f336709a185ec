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


//! Container parsing
//!
//! # Layout
//! ```text
//! 0x00  u32 LE  magic 0x4E455443 ("CTEN")
//! 0x04  u32 LE  magic 0x4D414446 ("FDAM")
//! 0x08  2 bytes reserved
//! 0x0A  u32 LE  key length, then key block
//!       u32 LE  meta length, then meta block (may be empty)
//!       9 bytes reserved
//!       u32 LE  cover length, then cover image
//!       music payload up to end of source (no length prefix)
//! ```
//!
//! Nothing in the reserved gaps is read. Only the offset arithmetic
//! depends on them.

pub mod reader;

pub use reader::{
    Block, Container, ContainerReader, MusicBlock, MusicReader, check_extension,
    COVER_GAP, KEY_BLOCK_OFFSET, MAGIC_HEADER1, MAGIC_HEADER2, MUSIC_READ_CHUNK,
};
