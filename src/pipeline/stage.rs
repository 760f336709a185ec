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


//! Whole-file decode stages
//!
//! ```text
//! Unopened → Validated → KeyBlockRead → MetaBlockRead → CoverBlockRead
//!   → MusicBlockLocated → KeyUnlocked → KeyBoxBuilt → MusicDecrypted → Done
//! ```
//!
//! A format error stops the machine at `Unopened`, a key-path crypto error
//! stops it before `KeyUnlocked` or `KeyBoxBuilt`. Metadata errors never
//! stop it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DecodeStage {
    Unopened,
    Validated,
    KeyBlockRead,
    MetaBlockRead,
    CoverBlockRead,
    MusicBlockLocated,
    KeyUnlocked,
    KeyBoxBuilt,
    MusicDecrypted,
    Done,
}

impl DecodeStage {
    /// The only legal successor, or None at `Done`
    pub fn next(self) -> Option<Self> {
        use DecodeStage::*;
        match self {
            Unopened => Some(Validated),
            Validated => Some(KeyBlockRead),
            KeyBlockRead => Some(MetaBlockRead),
            MetaBlockRead => Some(CoverBlockRead),
            CoverBlockRead => Some(MusicBlockLocated),
            MusicBlockLocated => Some(KeyUnlocked),
            KeyUnlocked => Some(KeyBoxBuilt),
            KeyBoxBuilt => Some(MusicDecrypted),
            MusicDecrypted => Some(Done),
            Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Validated => "validated",
            Self::KeyBlockRead => "key_block_read",
            Self::MetaBlockRead => "meta_block_read",
            Self::CoverBlockRead => "cover_block_read",
            Self::MusicBlockLocated => "music_block_located",
            Self::KeyUnlocked => "key_unlocked",
            Self::KeyBoxBuilt => "key_box_built",
            Self::MusicDecrypted => "music_decrypted",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current stage of one decode, advanced strictly in order
#[derive(Debug)]
pub(crate) struct StageTracker {
    stage: DecodeStage,
}

impl StageTracker {
    pub(crate) fn new() -> Self {
        Self {
            stage: DecodeStage::Unopened,
        }
    }

    pub(crate) fn stage(&self) -> DecodeStage {
        self.stage
    }

    pub(crate) fn advance(&mut self, to: DecodeStage) {
        debug_assert_eq!(self.stage.next(), Some(to), "out-of-order decode stage");
        debug!(from = %self.stage, to = %to, "decode stage");
        self.stage = to;
    }
}
