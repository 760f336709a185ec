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


//! Whole-file decoder
//!
//! Drives one container through every [`DecodeStage`] and streams the
//! decrypted audio into a caller-supplied sink.
//!
//! # Output
//! - Song metadata as a [`MetaOutcome`] (never fatal)
//! - Cover image bytes (may be empty)
//! - Decrypted audio written to the sink, with its length and SHA-256
//!
//! # Memory
//! Music is processed in passes of `cipher_buffer_size` bytes, each filled by
//! reads of at most `read_chunk_size` bytes. Cancellation is checked before
//! every read.

use super::options::{CancelFlag, DecodeOptions, DecodeProgress, ProgressCallback};
use super::stage::{DecodeStage, StageTracker};
use crate::audio::format::{AudioFormat, SNIFF_LEN};
use crate::audio::metadata::{decode_meta, Meta, MetaOutcome};
use crate::audio::tag::TagPlan;
use crate::container::ContainerReader;
use crate::crypto::{unlock_key, KeyBox, StreamCipher};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension used when the audio format cannot be determined
const UNKNOWN_EXTENSION: &str = "bin";

/// Everything recovered from one container
#[derive(Debug)]
pub struct DecodedTrack {
    pub meta: MetaOutcome,
    pub cover: Vec<u8>,
    /// Decrypted audio bytes written to the sink
    pub audio_len: u64,
    /// Lowercase hex SHA-256 of the decrypted audio
    pub audio_sha256: String,
    /// From `Meta.format`, or sniffed from the audio header
    pub format: Option<AudioFormat>,
}

impl DecodedTrack {
    pub fn meta(&self) -> &Meta {
        self.meta.meta()
    }

    /// Output file extension without the dot
    pub fn extension(&self) -> &'static str {
        self.format.map_or(UNKNOWN_EXTENSION, |f| f.extension())
    }

    /// Tags for an external writer of `self.format`
    pub fn tag_plan(&self) -> TagPlan {
        TagPlan::new(self.meta(), &self.cover)
    }
}

/// Result of [`Decoder::decode_file`]
#[derive(Debug)]
pub struct DecodedFile {
    pub track: DecodedTrack,
    pub output: PathBuf,
}

/// Container decoder
///
/// Holds no per-file state, so one instance (or its clones) may decode
/// many files concurrently.
#[derive(Clone, Default)]
pub struct Decoder {
    options: DecodeOptions,
    cancel: CancelFlag,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("options", &self.options)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options: options.normalized(),
            cancel: CancelFlag::new(),
            progress: None,
        }
    }

    /// Share an existing cancellation flag
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report progress after every cipher pass
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Decode a container from any seekable source
    ///
    /// # Errors
    /// - Format errors before any block is read
    /// - Crypto errors from the key block, before any audio is written
    /// - I/O errors and `Cancelled` while streaming; the sink may then hold
    ///   partial output, which the caller must discard
    pub fn decode<R: Read + Seek, W: Write>(
        &self,
        source: R,
        sink: &mut W,
    ) -> Result<DecodedTrack> {
        self.decode_container(ContainerReader::new(source), sink)
    }

    /// Decode `input` into `<output_dir>/<stem>.<ext>`
    ///
    /// `output_dir` defaults to the input's directory. Audio goes to a
    /// uniquely named `<stem>.*.part` file in that directory first, which is
    /// renamed once decoding succeeds and removed if it fails. Concurrent
    /// decodes of inputs with the same stem never share a temp file.
    pub fn decode_file(&self, input: &Path, output_dir: Option<&Path>) -> Result<DecodedFile> {
        let reader = ContainerReader::open_path(input)?;

        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        };
        fs::create_dir_all(&dir)?;

        let stem = input
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| OsString::from("output"));

        let mut prefix = stem.clone();
        prefix.push(".");
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".part")
            .tempfile_in(&dir)?;

        // Dropping `temp` on any error path removes the partial file
        let track = self.write_temp(reader, temp.as_file_mut())?;

        let mut name = stem;
        name.push(".");
        name.push(track.extension());
        let output = dir.join(name);
        temp.persist(&output).map_err(|e| e.error)?;

        info!(
            input = %input.display(),
            output = %output.display(),
            bytes = track.audio_len,
            "decoded file"
        );

        Ok(DecodedFile { track, output })
    }

    fn write_temp(&self, reader: ContainerReader<File>, file: &mut File) -> Result<DecodedTrack> {
        let mut writer = BufWriter::new(&mut *file);
        let track = self.decode_container(reader, &mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(track)
    }

    fn decode_container<R: Read + Seek, W: Write>(
        &self,
        reader: ContainerReader<R>,
        sink: &mut W,
    ) -> Result<DecodedTrack> {
        let mut tracker = StageTracker::new();
        let result = self.run(&mut tracker, reader, sink);
        if let Err(e) = &result {
            warn!(stage = %tracker.stage(), error = %e, "decode failed");
        }
        result
    }

    fn run<R: Read + Seek, W: Write>(
        &self,
        tracker: &mut StageTracker,
        mut reader: ContainerReader<R>,
        sink: &mut W,
    ) -> Result<DecodedTrack> {
        reader.validate()?;
        tracker.advance(DecodeStage::Validated);

        let key_block = reader.read_key_block()?;
        tracker.advance(DecodeStage::KeyBlockRead);

        let meta_block = reader.read_meta_block(&key_block)?;
        tracker.advance(DecodeStage::MetaBlockRead);

        let cover_block = reader.read_cover_block(&meta_block)?;
        tracker.advance(DecodeStage::CoverBlockRead);

        let music = reader.locate_music(&cover_block)?;
        tracker.advance(DecodeStage::MusicBlockLocated);

        let material = unlock_key(&key_block.bytes)?;
        tracker.advance(DecodeStage::KeyUnlocked);

        let key_box = KeyBox::schedule(material.key_bytes())?;
        tracker.advance(DecodeStage::KeyBoxBuilt);

        // The format guess uses the cursor after the music block was located,
        // which is the total source length
        let meta = decode_meta(&meta_block.bytes, music.offset + music.remaining);

        let mut cipher = StreamCipher::new(key_box);
        let mut music_reader =
            reader.into_music_reader(&music, self.options.read_chunk_size)?;
        let mut hasher = Sha256::new();
        let mut header = Vec::with_capacity(SNIFF_LEN);
        let mut buf = vec![0u8; self.options.cipher_buffer_size];

        loop {
            let n = music_reader.fill(&mut buf, &self.cancel)?;
            if n == 0 {
                break;
            }
            let pass = &mut buf[..n];
            cipher.apply(pass);

            if header.len() < SNIFF_LEN {
                let take = (SNIFF_LEN - header.len()).min(n);
                header.extend_from_slice(&pass[..take]);
            }
            hasher.update(&*pass);
            sink.write_all(pass)?;

            if let Some(progress) = &self.progress {
                progress(DecodeProgress {
                    decoded: music_reader.consumed(),
                    total: music.remaining,
                });
            }
        }
        sink.flush()?;
        tracker.advance(DecodeStage::MusicDecrypted);

        let audio_len = music_reader.consumed();
        let format = AudioFormat::resolve(&meta.meta().format, &header);
        debug!(audio_len, format = ?format, "music decrypted");

        tracker.advance(DecodeStage::Done);
        Ok(DecodedTrack {
            meta,
            cover: cover_block.bytes,
            audio_len,
            audio_sha256: hex::encode(hasher.finalize()),
            format,
        })
    }
}
