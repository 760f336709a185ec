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


//! Decoder for the NetEase Cloud Music `.ncm` container
//!
//! # Modules
//! - `container`: block layout and the chunked music reader
//! - `crypto`: key unlocking, key scheduling and the audio stream cipher
//! - `audio`: song metadata, output format and the tag-writer interface
//! - `pipeline`: whole-file decode with cancellation
//!
//! # Example
//! ```no_run
//! use ncm_core::{DecodeOptions, Decoder};
//! use std::path::Path;
//!
//! let decoder = Decoder::new(DecodeOptions::default());
//! let decoded = decoder.decode_file(Path::new("song.ncm"), None)?;
//! println!("{} -> {}", decoded.track.meta().name, decoded.output.display());
//! # Ok::<(), ncm_core::NcmError>(())
//! ```

pub mod audio;
pub mod container;
pub mod crypto;
pub mod error;
pub mod pipeline;

#[cfg(test)]
mod test_support;

pub use audio::{AudioFormat, Meta, MetaOutcome, TagPlan, TagWriter};
pub use container::{Container, ContainerReader};
pub use error::{NcmError, Result};
pub use pipeline::{
    CancelFlag, DecodeOptions, DecodeProgress, DecodeStage, DecodedFile, DecodedTrack, Decoder,
    ProgressCallback,
};
