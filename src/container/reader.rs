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


//! Block reader for the `.ncm` container
//!
//! Key, meta and cover blocks are read eagerly with the same
//! length-prefixed primitive. The music payload is only located here;
//! [`MusicReader`] streams it in bounded chunks afterwards.

use crate::error::{NcmError, Result};
use crate::pipeline::CancelFlag;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

pub const MAGIC_HEADER1: u32 = 0x4E45_5443;
pub const MAGIC_HEADER2: u32 = 0x4D41_4446;

/// 8 magic bytes + 2 reserved bytes
pub const KEY_BLOCK_OFFSET: u64 = 10;

/// Reserved bytes between the end of the meta block and the cover length prefix
pub const COVER_GAP: u64 = 9;

/// Default read size for the music payload
pub const MUSIC_READ_CHUNK: usize = 8 * 1024;

const LENGTH_PREFIX_SIZE: u64 = 4;

/// A length-prefixed byte range inside the container
///
/// `offset` points at the 4-byte little-endian length, not at the content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub offset: u64,
    pub length: u32,
    pub bytes: Vec<u8>,
}

impl Block {
    /// Offset of the first byte after this block's content
    pub fn next_offset(&self) -> u64 {
        self.offset + LENGTH_PREFIX_SIZE + u64::from(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Location of the music payload, which runs to the end of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicBlock {
    pub offset: u64,
    /// Bytes between `offset` and the end of the source when located
    pub remaining: u64,
}

/// All blocks of one container, filled in file order
#[derive(Debug, Clone)]
pub struct Container {
    pub key: Block,
    pub meta: Block,
    pub cover: Block,
    pub music: MusicBlock,
}

impl Container {
    /// Total source length as seen while locating the music block
    pub fn source_len(&self) -> u64 {
        self.music.offset + self.music.remaining
    }
}

/// Check that a path names an `.ncm` file
///
/// # Errors
/// - InvalidExtension if the extension is missing or not `ncm` (any case)
pub fn check_extension(path: &Path) -> Result<()> {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("ncm") => Ok(()),
        _ => Err(NcmError::InvalidExtension(path.display().to_string())),
    }
}

/// Sequential reader over a seekable source
pub struct ContainerReader<R> {
    source: R,
}

impl ContainerReader<File> {
    /// Open an `.ncm` file after checking its extension
    ///
    /// The extension check runs before the file is opened, so a rejected
    /// path never acquires a handle.
    pub fn open_path(path: &Path) -> Result<Self> {
        check_extension(path)?;
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read + Seek> ContainerReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Validate the 8-byte magic header at offset 0
    ///
    /// # Errors
    /// - TruncatedHeader if fewer than 8 bytes are available
    /// - InvalidMagic if either constant does not match
    pub fn validate(&mut self) -> Result<()> {
        self.source.seek(SeekFrom::Start(0))?;

        let mut magic = [0u8; 8];
        let filled = read_up_to(&mut self.source, &mut magic)?;
        if filled < magic.len() {
            return Err(NcmError::TruncatedHeader { len: filled });
        }

        let m1 = u32::from_le_bytes([magic[0], magic[1], magic[2], magic[3]]);
        let m2 = u32::from_le_bytes([magic[4], magic[5], magic[6], magic[7]]);
        if m1 != MAGIC_HEADER1 || m2 != MAGIC_HEADER2 {
            return Err(NcmError::InvalidMagic { found: magic });
        }

        Ok(())
    }

    /// Read a little-endian length prefix at `offset` and that many bytes
    ///
    /// Memory is bounded by what the source actually holds, not by the
    /// declared length.
    ///
    /// # Errors
    /// - Io(UnexpectedEof) if the source ends inside the prefix or the content
    pub fn read_length_prefixed(&mut self, offset: u64) -> Result<Block> {
        self.source.seek(SeekFrom::Start(offset))?;

        let mut prefix = [0u8; 4];
        self.source.read_exact(&mut prefix)?;
        let length = u32::from_le_bytes(prefix);

        let mut bytes = Vec::new();
        (&mut self.source)
            .take(u64::from(length))
            .read_to_end(&mut bytes)?;

        if bytes.len() != length as usize {
            return Err(NcmError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "block at 0x{:X} declares {} bytes but only {} remain",
                    offset,
                    length,
                    bytes.len()
                ),
            )));
        }

        Ok(Block {
            offset,
            length,
            bytes,
        })
    }

    pub fn read_key_block(&mut self) -> Result<Block> {
        self.read_length_prefixed(KEY_BLOCK_OFFSET)
    }

    pub fn read_meta_block(&mut self, key: &Block) -> Result<Block> {
        self.read_length_prefixed(key.next_offset())
    }

    pub fn read_cover_block(&mut self, meta: &Block) -> Result<Block> {
        self.read_length_prefixed(meta.next_offset() + COVER_GAP)
    }

    /// Find where the music payload starts and how much of the source is left
    pub fn locate_music(&mut self, cover: &Block) -> Result<MusicBlock> {
        let offset = cover.next_offset();
        let end = self.source.seek(SeekFrom::End(0))?;
        self.source.seek(SeekFrom::Start(offset))?;

        Ok(MusicBlock {
            offset,
            remaining: end.saturating_sub(offset),
        })
    }

    /// Validate and read every block in file order
    pub fn read_container(&mut self) -> Result<Container> {
        self.validate()?;
        let key = self.read_key_block()?;
        let meta = self.read_meta_block(&key)?;
        let cover = self.read_cover_block(&meta)?;
        let music = self.locate_music(&cover)?;

        debug!(
            key_len = key.length,
            meta_len = meta.length,
            cover_len = cover.length,
            music_offset = music.offset,
            music_len = music.remaining,
            "container layout"
        );

        Ok(Container {
            key,
            meta,
            cover,
            music,
        })
    }

    /// Hand the source over to a chunked music reader positioned at `music`
    pub fn into_music_reader(
        mut self,
        music: &MusicBlock,
        chunk_size: usize,
    ) -> Result<MusicReader<R>> {
        self.source.seek(SeekFrom::Start(music.offset))?;
        Ok(MusicReader {
            source: self.source,
            chunk_size: chunk_size.max(1),
            consumed: 0,
        })
    }
}

/// Bounded sequential reader over the music payload
pub struct MusicReader<R> {
    source: R,
    chunk_size: usize,
    consumed: u64,
}

impl<R: Read> MusicReader<R> {
    /// Read at most one chunk into `buf`, returning 0 at end of source
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let limit = buf.len().min(self.chunk_size);
        loop {
            match self.source.read(&mut buf[..limit]) {
                Ok(n) => {
                    self.consumed += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fill `buf` with consecutive chunks until it is full or the source ends
    ///
    /// `cancel` is checked before every chunk, so a raised flag stops the
    /// fill with `Cancelled` and whatever was read into `buf` is dropped.
    pub fn fill(&mut self, buf: &mut [u8], cancel: &CancelFlag) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            cancel.check()?;
            let n = self.read_chunk(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Music bytes read so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}

/// Read until `buf` is full or the source ends
fn read_up_to<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
