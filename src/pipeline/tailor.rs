//! Tail loop: turn appended bytes into printed lines.

use crate::pipeline::{Consumer, INITIAL_TAIL_WINDOW};
use anyhow::Result;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::watch;

/// Where emitted lines go. Stdout in production; tests collect in memory.
pub trait LineSink: Send {
    fn emit(&mut self, line: &str);
}

pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn emit(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Reads newly appended bytes from the decompressed log on every handshake.
/// The cursor only ever lands just past a newline, so a half-flushed final
/// line waits for the next round and every line is emitted exactly once.
pub struct Tailor<S> {
    log_path: PathBuf,
    cursor: u64,
    sink: S,
}

impl<S: LineSink> Tailor<S> {
    pub fn new(log_path: PathBuf, sink: S) -> Self {
        Self {
            log_path,
            cursor: 0,
            sink,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Read from the cursor (or from a bounded window before end-of-file on
    /// a cold start) through to the current end, emitting complete lines.
    pub async fn read_new_lines(&mut self) -> Result<()> {
        let mut file = File::open(&self.log_path).await?;
        let len = file.metadata().await?.len();

        let start = if self.cursor == 0 {
            len.saturating_sub(INITIAL_TAIL_WINDOW)
        } else {
            self.cursor
        };
        if len <= start {
            return Ok(());
        }

        file.seek(SeekFrom::Start(start)).await?;
        let mut buf = Vec::with_capacity((len - start) as usize);
        (&mut file).take(len - start).read_to_end(&mut buf).await?;

        let mut consumed = 0usize;
        for chunk in buf.split_inclusive(|&b| b == b'\n') {
            if chunk.last() != Some(&b'\n') {
                break; // incomplete trailing line, wait for the next append
            }
            let line = String::from_utf8_lossy(&chunk[..chunk.len() - 1]);
            self.sink.emit(line.trim_end_matches('\r'));
            consumed += chunk.len();
        }
        self.cursor = start + consumed as u64;
        Ok(())
    }
}

/// Consumer loop: park on the handshake, read the delta, acknowledge.
/// A missing log file at signal time is acknowledged without reading; the
/// next real append will find it in place.
pub async fn run_tailor<S: LineSink>(
    mut tailor: Tailor<S>,
    mut gate: Consumer,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        tokio::select! {
            ready = gate.wait() => {
                if !ready {
                    return Ok(());
                }
            }
            _ = shutdown.changed() => return Ok(()),
        }

        if !tokio::fs::try_exists(tailor.log_path()).await? {
            gate.complete();
            continue;
        }

        tailor.read_new_lines().await?;
        gate.complete();
    }
}
