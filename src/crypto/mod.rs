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


//! Layered decryption for the `.ncm` container
//!
//! # Pipeline
//! - **Key path**: XOR `0x64` → AES-128-ECB (core secret) → PKCS#7 →
//!   drop the 17-byte `neteasecloudmusic` prefix → key box
//! - **Audio path**: key box drives a position-indexed XOR over the
//!   whole music payload
//! - **Metadata path**: lives in `audio::metadata`, reusing [`ecb`]
//!
//! Every structure here is local to one file's decode. Nothing is cached
//! or shared between files.

pub mod ecb;
pub mod key;
pub mod key_box;
pub mod stream;

pub use ecb::{aes128_ecb_decrypt, decrypt_and_unpad, strip_pkcs7, xor_in_place, AES_BLOCK_SIZE};
pub use key::{unlock_key, RawKeyMaterial, CORE_KEY, KEY_PREFIX, KEY_XOR};
pub use key_box::KeyBox;
pub use stream::{StreamCipher, CIPHER_BUFFER_SIZE};
