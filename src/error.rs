//! Error types for ncm-core
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are grouped by the decode stage that raises them, and the stage
//! decides how fatal they are.
//!
//! ## Error Classes
//!
//! ### Format (fatal, raised before any block is read)
//! - Wrong file extension → `InvalidExtension`
//! - First 8 bytes are not the container magic → `InvalidMagic`
//! - Source shorter than the magic header → `TruncatedHeader`
//!
//! ### Crypto (fatal on the key path, recovered on the metadata path)
//! - Bad PKCS#7 trailer after AES-ECB → `InvalidPadding`
//! - No key bytes left after the literal prefix → `EmptyKey`
//!
//! ### Parse (always recovered, metadata path only)
//! - Malformed base64 → `InvalidBase64`
//! - Malformed JSON → `InvalidJson`
//! - Block too short for its literal marker → `MissingMarker`
//!
//! ### I/O
//! - Truncated or unreadable source while streaming → `Io`
//! - Cancellation between music chunks → `Cancelled`

use thiserror::Error;

/// Result type alias using our NcmError type
pub type Result<T> = std::result::Result<T, NcmError>;

/// Main error type for ncm-core
#[derive(Error, Debug)]
pub enum NcmError {
    // ===== Format Errors =====

    /// Input identifier is not an `.ncm` file
    #[error("Unrecognized input file: {0} (expected a .ncm extension)")]
    InvalidExtension(String),

    /// Magic header mismatch
    #[error("Invalid magic header: {}", hex::encode(.found))]
    InvalidMagic { found: [u8; 8] },

    /// Source ends before the 8-byte magic header is complete
    #[error("Source too short for magic header: {len} bytes")]
    TruncatedHeader { len: usize },

    // ===== Crypto Errors =====

    /// PKCS#7 trailer is zero, larger than a block, or larger than the buffer
    #[error("Invalid padding in {context}: pad byte {pad} with {len} decrypted bytes")]
    InvalidPadding {
        context: &'static str,
        pad: u8,
        len: usize,
    },

    /// Key material is empty once the literal prefix is removed
    #[error("Key material is empty, cannot build key box")]
    EmptyKey,

    // ===== Metadata Parse Errors =====

    /// Metadata payload is not valid base64
    #[error("Metadata base64 is malformed: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Metadata JSON is malformed
    #[error("Metadata JSON is malformed: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Metadata block is shorter than its literal marker
    #[error("Metadata marker {marker:?} missing: only {len} bytes available")]
    MissingMarker { marker: &'static str, len: usize },

    // ===== General Errors =====

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation was cancelled between chunks
    #[error("Operation cancelled")]
    Cancelled,
}

impl NcmError {
    /// Check if error is a container format error
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            NcmError::InvalidExtension(_)
                | NcmError::InvalidMagic { .. }
                | NcmError::TruncatedHeader { .. }
        )
    }

    /// Check if error is related to decryption
    pub fn is_crypto_error(&self) -> bool {
        matches!(self, NcmError::InvalidPadding { .. } | NcmError::EmptyKey)
    }

    /// Check if error comes from decoding the metadata payload
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            NcmError::InvalidBase64(_) | NcmError::InvalidJson(_) | NcmError::MissingMarker { .. }
        )
    }

    /// Whether the error aborts a whole-file decode
    ///
    /// Parse errors never do. Crypto errors from the metadata block are
    /// recovered into `MetaOutcome::Fallback` and never reach the caller.
    pub fn is_fatal(&self) -> bool {
        !self.is_parse_error()
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            NcmError::InvalidExtension(path) => {
                format!("'{}' is not an .ncm file.", path)
            }
            NcmError::InvalidMagic { .. } | NcmError::TruncatedHeader { .. } => {
                "The file is not a NetEase Cloud Music container.".to_string()
            }
            NcmError::InvalidPadding { .. } | NcmError::EmptyKey => {
                "The file's key block is corrupt; the audio cannot be decrypted.".to_string()
            }
            NcmError::Cancelled => "Decoding was cancelled.".to_string(),
            _ => self.to_string(),
        }
    }
}
