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


//! Position-indexed audio transform
//!
//! For the byte at global position `i`:
//!
//! ```text
//! j   = (i + 1) & 0xFF
//! idx = (box[j] + box[(box[j] + j) & 0xFF]) & 0xFF
//! out = in ^ box[idx]
//! ```
//!
//! The mask only depends on `j`, so the 256 masks are computed once from
//! the key box. The global position survives across calls, which makes
//! the output independent of how the stream is chunked.

use crate::crypto::key_box::KeyBox;

/// Default buffer size for one cipher pass
pub const CIPHER_BUFFER_SIZE: usize = 0x8000;

pub struct StreamCipher {
    masks: [u8; 256],
    position: u64,
}

impl StreamCipher {
    /// Take ownership of a file's key box
    pub fn new(key_box: KeyBox) -> Self {
        let mut masks = [0u8; 256];
        for (j, mask) in masks.iter_mut().enumerate() {
            let j = j as u8;
            let a = key_box.get(j);
            let idx = a.wrapping_add(key_box.get(a.wrapping_add(j)));
            *mask = key_box.get(idx);
        }

        Self { masks, position: 0 }
    }

    /// Number of bytes transformed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Mask applied to the byte at a global position
    pub fn mask_at(&self, position: u64) -> u8 {
        self.masks[(position.wrapping_add(1) & 0xFF) as usize]
    }

    /// Transform `buf` in place and advance the global position
    pub fn apply(&mut self, buf: &mut [u8]) {
        let mut j = (self.position.wrapping_add(1) & 0xFF) as u8;
        for byte in buf.iter_mut() {
            *byte ^= self.masks[usize::from(j)];
            j = j.wrapping_add(1);
        }
        self.position += buf.len() as u64;
    }
}

impl std::fmt::Debug for StreamCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCipher")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
