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


//! Key block unlocking
//!
//! # Steps
//! 1. XOR every byte with `0x64`
//! 2. Truncate to whole 16-byte blocks
//! 3. AES-128-ECB with [`CORE_KEY`]
//! 4. Strip PKCS#7
//!
//! The plaintext starts with the 17-byte literal `neteasecloudmusic`.
//! Only the bytes after it feed the key scheduler.

use crate::crypto::ecb::{decrypt_and_unpad, xor_in_place};
use crate::error::Result;
use tracing::warn;

pub const KEY_XOR: u8 = 0x64;

/// AES secret for the key block ("hzHRAmso5kInbaxW")
pub const CORE_KEY: [u8; 16] = [
    0x68, 0x7A, 0x48, 0x52, 0x41, 0x6D, 0x73, 0x6F, 0x35, 0x6B, 0x49, 0x6E, 0x62, 0x61, 0x78, 0x57,
];

pub const KEY_PREFIX: &[u8; 17] = b"neteasecloudmusic";

/// Decrypted, depadded key block
///
/// Keeps the literal prefix so callers can inspect the full plaintext;
/// [`RawKeyMaterial::key_bytes`] is what the scheduler consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyMaterial(Vec<u8>);

impl RawKeyMaterial {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Full plaintext, prefix included
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key bytes after the 17-byte literal prefix (empty if too short)
    pub fn key_bytes(&self) -> &[u8] {
        self.0.get(KEY_PREFIX.len()..).unwrap_or(&[])
    }

    pub fn has_expected_prefix(&self) -> bool {
        self.0.starts_with(KEY_PREFIX)
    }
}

/// Deobfuscate and decrypt the key block
///
/// # Errors
/// - InvalidPadding if the decrypted trailer is not valid PKCS#7,
///   which includes an empty key block
pub fn unlock_key(block: &[u8]) -> Result<RawKeyMaterial> {
    let mut data = block.to_vec();
    xor_in_place(&mut data, KEY_XOR);

    let plain = decrypt_and_unpad(&CORE_KEY, &data, "key block")?;
    let material = RawKeyMaterial::new(plain);

    if !material.has_expected_prefix() {
        warn!(
            len = material.as_bytes().len(),
            "key material does not start with the expected literal prefix"
        );
    }

    Ok(material)
}
