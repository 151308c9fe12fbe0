//! Incremental gzip materialization.
//!
//! The gzip trailer's ISIZE field (uncompressed size modulo 2^32) decides
//! whether the archive holds more than the plaintext log already has. When
//! it does, decompression restarts from the top of the archive, discards
//! exactly the bytes already on disk, and appends only the remainder.

use crate::error::TailError;
use flate2::read::GzDecoder;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Read the trailing ISIZE field: uncompressed length modulo 2^32, little
/// endian. Archives beyond 4 GiB decompressed wrap around; the format
/// offers nothing better without a full decode, so that limit stands.
pub fn read_size_hint(archive: &Path) -> io::Result<u64> {
    let mut file = File::open(archive)?;
    file.seek(SeekFrom::End(-4))?;
    let mut trailer = [0u8; 4];
    file.read_exact(&mut trailer)?;
    Ok(u64::from(u32::from_le_bytes(trailer)))
}

/// Append to `log_path` whatever the archive decompresses to beyond the
/// log's current length. Returns the number of bytes appended; 0 means the
/// size hint says nothing new exists and the log was left untouched.
///
/// flate2 is blocking, so the work runs on the blocking pool.
pub async fn sync_decompressed(archive: PathBuf, log_path: PathBuf) -> Result<u64, TailError> {
    tokio::task::spawn_blocking(move || sync_blocking(&archive, &log_path))
        .await
        .map_err(|e| TailError::Io(io::Error::other(e)))?
}

fn sync_blocking(archive: &Path, log_path: &Path) -> Result<u64, TailError> {
    if !log_path.exists() {
        File::create(log_path)?;
    }
    let existing_len = std::fs::metadata(log_path)?.len();

    let hint = read_size_hint(archive)?;
    if hint <= existing_len {
        return Ok(0);
    }

    let mut decoder = GzDecoder::new(File::open(archive)?);

    // Discard the prefix that is already materialized. A stream that ends
    // before the skip offset means the trailer promised more than the
    // archive holds.
    let skipped = io::copy(&mut (&mut decoder).take(existing_len), &mut io::sink())?;
    if skipped < existing_len {
        return Err(TailError::TruncatedArchive {
            path: archive.to_path_buf(),
            expected: existing_len,
            actual: skipped,
        });
    }

    let mut log = OpenOptions::new().append(true).open(log_path)?;
    let appended = io::copy(&mut decoder, &mut log)?;
    log.flush()?;
    Ok(appended)
}
