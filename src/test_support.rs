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


//! Forward transforms used by unit tests to build encrypted blocks

use crate::crypto::ecb::{xor_in_place, AES_BLOCK_SIZE};
use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use base64::{engine::general_purpose, Engine as _};

pub(crate) fn aes128_ecb_encrypt(key: &[u8; 16], plain: &[u8]) -> Vec<u8> {
    let pad = AES_BLOCK_SIZE - plain.len() % AES_BLOCK_SIZE;
    let mut buf = plain.to_vec();
    buf.extend(std::iter::repeat(pad as u8).take(pad));

    let cipher = Aes128::new(GenericArray::from_slice(key));
    for chunk in buf.chunks_exact_mut(AES_BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }
    buf
}

/// Inverse of `unlock_key`
pub(crate) fn lock_key(plain: &[u8]) -> Vec<u8> {
    let mut block = aes128_ecb_encrypt(&crate::crypto::CORE_KEY, plain);
    xor_in_place(&mut block, crate::crypto::KEY_XOR);
    block
}

/// Inverse of the metadata decoder for a JSON document
pub(crate) fn lock_meta(json: &str) -> Vec<u8> {
    use crate::audio::metadata::{META_MARKER, META_XOR, MODIFY_KEY, MUSIC_MARKER};

    let inner = format!("{MUSIC_MARKER}{json}");
    let encrypted = aes128_ecb_encrypt(&MODIFY_KEY, inner.as_bytes());
    let outer = format!("{META_MARKER}{}", general_purpose::STANDARD.encode(encrypted));

    let mut block = outer.into_bytes();
    xor_in_place(&mut block, META_XOR);
    block
}
