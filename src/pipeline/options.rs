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


//! Decode configuration and cancellation

use crate::container::MUSIC_READ_CHUNK;
use crate::crypto::CIPHER_BUFFER_SIZE;
use crate::error::{NcmError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Buffer sizes for one decode
///
/// Neither size affects the decoded bytes, only memory use and the
/// granularity of cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Largest single read from the music block
    pub read_chunk_size: usize,

    /// Bytes decrypted per cipher pass
    pub cipher_buffer_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            read_chunk_size: MUSIC_READ_CHUNK,
            cipher_buffer_size: CIPHER_BUFFER_SIZE,
        }
    }
}

impl DecodeOptions {
    /// Copy with zero sizes raised to 1
    pub fn normalized(self) -> Self {
        Self {
            read_chunk_size: self.read_chunk_size.max(1),
            cipher_buffer_size: self.cipher_buffer_size.max(1),
        }
    }
}

/// Music progress after one cipher pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeProgress {
    /// Music bytes decrypted and written so far
    pub decoded: u64,
    /// Music bytes in the container
    pub total: u64,
}

/// Callback type for progress updates
pub type ProgressCallback = Arc<dyn Fn(DecodeProgress) + Send + Sync>;

/// Shared cancellation signal, checked before every music chunk
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Err(Cancelled) once the flag is raised
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(NcmError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = DecodeOptions::default();
        assert_eq!(options.read_chunk_size, 8 * 1024);
        assert_eq!(options.cipher_buffer_size, 32 * 1024);
    }

    #[test]
    fn test_zero_sizes_are_clamped() {
        let options = DecodeOptions {
            read_chunk_size: 0,
            cipher_buffer_size: 0,
        }
        .normalized();
        assert_eq!(options.read_chunk_size, 1);
        assert_eq!(options.cipher_buffer_size, 1);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: DecodeOptions = serde_json::from_str(r#"{"read_chunk_size": 512}"#).unwrap();
        assert_eq!(options.read_chunk_size, 512);
        assert_eq!(options.cipher_buffer_size, CIPHER_BUFFER_SIZE);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(flag.check().is_ok());

        clone.cancel();
        assert!(flag.is_cancelled());
        assert!(matches!(flag.check(), Err(NcmError::Cancelled)));
    }
}
