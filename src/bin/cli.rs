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


use anyhow::{bail, Context};
use clap::Parser;
use ncm_core::container::check_extension;
use ncm_core::{CancelFlag, DecodeOptions, DecodedFile, Decoder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "ncm-decode")]
#[command(about = "Decode NetEase Cloud Music .ncm files to plain audio", long_about = None)]
struct Cli {
    /// .ncm files or directories containing them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (default: next to each input)
    #[arg(short, long, env = "NCM_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Files decoded concurrently
    #[arg(short = 'n', long, default_value_t = 4, env = "NCM_WORKERS")]
    workers: usize,

    /// Maximum directory depth when walking input directories
    #[arg(long, default_value_t = 5, env = "NCM_DEPTH")]
    depth: usize,

    /// Largest single read from the music block, in bytes
    #[arg(
        long,
        default_value_t = DecodeOptions::default().read_chunk_size,
        env = "NCM_READ_CHUNK"
    )]
    read_chunk: usize,

    /// Bytes decrypted per cipher pass
    #[arg(
        long,
        default_value_t = DecodeOptions::default().cipher_buffer_size,
        env = "NCM_CIPHER_BUFFER"
    )]
    cipher_buffer: usize,

    /// Print one JSON report per decoded file
    #[arg(long)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a Path,
    output: &'a Path,
    title: &'a str,
    artists: String,
    format: &'a str,
    bytes: u64,
    sha256: &'a str,
    metadata_parsed: bool,
}

/// Expand directories into the `.ncm` files below them
///
/// Files without an `.ncm` extension are skipped, whether named directly
/// or found while walking.
fn collect_inputs(inputs: &[PathBuf], depth: usize) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            match check_extension(input) {
                Ok(()) => files.push(input.clone()),
                Err(e) => warn!(input = %input.display(), error = %e, "skipping input"),
            }
            continue;
        }
        for entry in WalkDir::new(input).max_depth(depth) {
            match entry {
                Ok(entry)
                    if entry.file_type().is_file() && check_extension(entry.path()).is_ok() =>
                {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping unreadable directory entry"),
            }
        }
    }
    files
}

fn print_report(input: &Path, decoded: &DecodedFile, json: bool) -> anyhow::Result<()> {
    let track = &decoded.track;
    if json {
        let report = Report {
            input,
            output: &decoded.output,
            title: &track.meta().name,
            artists: track.meta().format_artists(),
            format: track.extension(),
            bytes: track.audio_len,
            sha256: &track.audio_sha256,
            metadata_parsed: track.meta.is_parsed(),
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{} -> {}", input.display(), decoded.output.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let files = collect_inputs(&cli.inputs, cli.depth);
    if files.is_empty() {
        bail!("no .ncm files found");
    }

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    let options = DecodeOptions {
        read_chunk_size: cli.read_chunk,
        cipher_buffer_size: cli.cipher_buffer,
    };
    let decoder = Decoder::new(options).with_cancel(cancel.clone());
    let semaphore = Arc::new(Semaphore::new(cli.workers.max(1)));
    info!(files = files.len(), workers = cli.workers.max(1), "decoding");

    let mut handles = Vec::with_capacity(files.len());
    for input in files {
        let permit = semaphore.clone().acquire_owned().await.context("worker pool closed")?;
        let decoder = decoder.clone();
        let output_dir = cli.output.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = decoder.decode_file(&input, output_dir.as_deref());
            (input, result)
        }));
    }

    let total = handles.len();
    let mut failed = 0;
    for handle in handles {
        let (input, result) = handle.await.context("decode worker panicked")?;
        match result {
            Ok(decoded) => print_report(&input, &decoded, cli.json)?,
            Err(e) => {
                failed += 1;
                error!(input = %input.display(), error = %e, "{}", e.user_message());
            }
        }
    }

    if cancel.is_cancelled() {
        bail!("cancelled after {} of {} files", total - failed, total);
    }
    if failed > 0 {
        bail!("{failed} of {total} files failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_inputs_skips_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let song = dir.path().join("song.ncm");
        let cover = dir.path().join("cover.jpg");
        fs::write(&song, b"").unwrap();
        fs::write(&cover, b"").unwrap();

        let files = collect_inputs(&[song.clone(), cover], 5);
        assert_eq!(files, vec![song]);
    }

    #[test]
    fn test_collect_inputs_walks_to_depth() {
        let dir = tempfile::tempdir().unwrap();
        let shallow = dir.path().join("a").join("one.NCM");
        let deep = dir.path().join("a").join("b").join("c").join("two.ncm");
        fs::create_dir_all(deep.parent().unwrap()).unwrap();
        fs::write(&shallow, b"").unwrap();
        fs::write(&deep, b"").unwrap();
        fs::write(dir.path().join("a").join("notes.txt"), b"").unwrap();

        assert_eq!(collect_inputs(&[dir.path().to_path_buf()], 2), vec![shallow.clone()]);

        let mut all = collect_inputs(&[dir.path().to_path_buf()], 5);
        all.sort();
        let mut expected = vec![shallow, deep];
        expected.sort();
        assert_eq!(all, expected);
    }
}
