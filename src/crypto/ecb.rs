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


//! AES-128-ECB helpers shared by the key and metadata paths
//!
//! Both blocks are encrypted with a fixed 16-byte secret, no IV, and
//! PKCS#7 padding. Trailing bytes that do not fill a whole cipher block
//! are dropped before decryption; the upstream encoder never produces
//! them, and older decoders ignore them too.

use crate::error::{NcmError, Result};
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, KeyInit};
use aes::Aes128;

pub const AES_BLOCK_SIZE: usize = 16;

/// XOR every byte with a single-byte mask
pub fn xor_in_place(data: &mut [u8], mask: u8) {
    for byte in data.iter_mut() {
        *byte ^= mask;
    }
}

/// Decrypt whole 16-byte blocks with AES-128 in ECB mode
///
/// A trailing partial block is silently discarded.
pub fn aes128_ecb_decrypt(key: &[u8; 16], data: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let whole = data.len() - data.len() % AES_BLOCK_SIZE;
    let mut out = data[..whole].to_vec();

    for chunk in out.chunks_exact_mut(AES_BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }

    out
}

/// Remove a PKCS#7 trailer in place
///
/// Only the final byte is inspected, matching the upstream decoder.
///
/// # Errors
/// - InvalidPadding if the pad byte is 0, greater than 16, or longer
///   than the buffer (an empty buffer is always rejected)
pub fn strip_pkcs7(buf: &mut Vec<u8>, context: &'static str) -> Result<()> {
    let pad = buf.last().copied().unwrap_or(0);
    let len = buf.len();

    if pad == 0 || usize::from(pad) > AES_BLOCK_SIZE || usize::from(pad) > len {
        return Err(NcmError::InvalidPadding { context, pad, len });
    }

    buf.truncate(len - usize::from(pad));
    Ok(())
}

/// ECB-decrypt then strip padding
pub fn decrypt_and_unpad(key: &[u8; 16], data: &[u8], context: &'static str) -> Result<Vec<u8>> {
    let mut plain = aes128_ecb_decrypt(key, data);
    strip_pkcs7(&mut plain, context)?;
    Ok(plain)
}
