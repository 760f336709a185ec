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


//! Key box scheduling
//!
//! A variant of the RC4 key-scheduling pass. Instead of accumulating
//! `j += box[i] + key[i % len]`, the previous swap target is carried
//! forward as the additive term:
//!
//! ```text
//! target = (box[i] + last_target + key[k]) & 0xFF
//! swap(box[i], box[target]); last_target = target
//! ```
//!
//! The two forms diverge after the first swap, so the canonical KSA
//! cannot be substituted.

use crate::error::{NcmError, Result};

/// 256-entry permutation driving the audio transform
///
/// Built once per file and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyBox([u8; 256]);

impl KeyBox {
    /// Schedule a key box from key bytes (the material after its prefix)
    ///
    /// # Errors
    /// - EmptyKey if `key` is empty
    pub fn schedule(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(NcmError::EmptyKey);
        }

        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut last_target = 0u8;
        let mut key_index = 0usize;

        for i in 0..256 {
            let target = table[i]
                .wrapping_add(last_target)
                .wrapping_add(key[key_index]);

            key_index += 1;
            if key_index >= key.len() {
                key_index = 0;
            }

            table.swap(i, usize::from(target));
            last_target = target;
        }

        Ok(Self(table))
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }

    #[inline]
    pub(crate) fn get(&self, index: u8) -> u8 {
        self.0[usize::from(index)]
    }
}

impl std::fmt::Debug for KeyBox {
    // Key-derived state stays out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBox").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLDEN_KEY: &[u8] = b"ncm-core golden key 0123456789";

    const GOLDEN_BOX: [u8; 256] = [
        0x6E, 0x99, 0x41, 0x71, 0xD8, 0x32, 0xC4, 0x30, 0xBC, 0xC8, 0x02, 0xB8,
        0x00, 0x55, 0x25, 0x45, 0x2B, 0x1B, 0xC1, 0x53, 0x38, 0x7E, 0xAB, 0x39,
        0x54, 0x69, 0x93, 0x4A, 0x98, 0xEE, 0x50, 0xFC, 0xA8, 0x3D, 0x7F, 0x49,
        0x52, 0x16, 0x18, 0x8A, 0x6A, 0x1A, 0x86, 0x73, 0xBD, 0xF7, 0x90, 0x4E,
        0xA4, 0x8D, 0xA3, 0xEC, 0xD7, 0x20, 0xAF, 0x37, 0x3F, 0x01, 0xE1, 0x1C,
        0x3B, 0x29, 0x15, 0x24, 0xDD, 0x26, 0x17, 0xB0, 0xEB, 0x61, 0x4B, 0x7D,
        0x5E, 0x9B, 0x40, 0x06, 0x03, 0x68, 0x70, 0x6C, 0x92, 0xA0, 0xB3, 0x2C,
        0xE8, 0x95, 0x0C, 0xED, 0xC6, 0xD5, 0xD2, 0x12, 0x51, 0xF3, 0x75, 0x6D,
        0x8F, 0x84, 0xDE, 0x07, 0x9E, 0x89, 0x97, 0x3C, 0xB9, 0xA1, 0x1F, 0x0D,
        0x2A, 0xDC, 0x28, 0xAC, 0x5B, 0x47, 0x9A, 0xB5, 0xF0, 0xDF, 0x8C, 0xF8,
        0x5C, 0x56, 0x8B, 0xF5, 0xCB, 0xB7, 0xCC, 0x78, 0xFA, 0x4C, 0xF6, 0x19,
        0xB6, 0xCE, 0x80, 0xD9, 0xCA, 0x1E, 0xCF, 0x35, 0x65, 0x82, 0x4F, 0x0A,
        0x6F, 0x1D, 0xD6, 0xF2, 0xBA, 0xB4, 0x8E, 0xB1, 0x21, 0x31, 0x11, 0xE7,
        0x9F, 0x05, 0x0B, 0x94, 0x0F, 0xC5, 0x9C, 0x23, 0x7C, 0x5D, 0x08, 0xD0,
        0xC7, 0x0E, 0xF4, 0xEF, 0xA9, 0x22, 0x2F, 0x43, 0x85, 0xB2, 0xEA, 0x79,
        0x72, 0xC0, 0x60, 0xC9, 0xDB, 0x81, 0xE6, 0xAA, 0x42, 0x33, 0xC2, 0xE3,
        0xE4, 0x66, 0x2D, 0xDA, 0xBE, 0xA2, 0xA7, 0x76, 0x13, 0xD1, 0xCD, 0x3A,
        0xFD, 0x91, 0xA5, 0xE9, 0xF1, 0x14, 0xFF, 0x5F, 0x67, 0x09, 0x7A, 0x77,
        0x88, 0xFE, 0x6B, 0x44, 0x2E, 0x96, 0x7B, 0x62, 0x10, 0x83, 0x4D, 0xAD,
        0xA6, 0x63, 0xE5, 0xFB, 0xC3, 0xE2, 0xBF, 0x36, 0xBB, 0xD4, 0x57, 0xD3,
        0x46, 0x59, 0x34, 0x87, 0xF9, 0x5A, 0x48, 0x74, 0x27, 0x58, 0x64, 0x04,
        0x9D, 0x3E, 0xAE, 0xE0,
    ];

    #[test]
    fn test_golden_box() {
        let key_box = KeyBox::schedule(GOLDEN_KEY).unwrap();
        assert_eq!(key_box.as_bytes(), &GOLDEN_BOX);
    }

    #[test]
    fn test_single_zero_key_prefix() {
        let key_box = KeyBox::schedule(&[0x00]).unwrap();
        assert_eq!(
            &key_box.as_bytes()[..16],
            &[0, 35, 3, 43, 9, 11, 65, 229, 32, 36, 134, 98, 59, 34, 173, 153]
        );
    }

    #[test]
    fn test_box_is_permutation() {
        let key_box = KeyBox::schedule(b"any key at all").unwrap();
        let mut seen = [false; 256];
        for &value in key_box.as_bytes() {
            assert!(!seen[usize::from(value)], "duplicate value {value}");
            seen[usize::from(value)] = true;
        }
    }

    #[test]
    fn test_empty_key() {
        assert!(matches!(KeyBox::schedule(&[]), Err(NcmError::EmptyKey)));
    }

    #[test]
    fn test_debug_hides_contents() {
        let key_box = KeyBox::schedule(GOLDEN_KEY).unwrap();
        assert_eq!(format!("{key_box:?}"), "KeyBox { .. }");
    }
}
