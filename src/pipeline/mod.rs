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


//! Whole-file decode pipeline
//!
//! Ties the container reader, key unlocking, key scheduling, stream cipher
//! and metadata decoder together. See [`stage`] for the state machine.

pub mod decoder;
pub mod options;
pub mod stage;

pub use decoder::{DecodedFile, DecodedTrack, Decoder};
pub use options::{CancelFlag, DecodeOptions, DecodeProgress, ProgressCallback};
pub use stage::DecodeStage;
