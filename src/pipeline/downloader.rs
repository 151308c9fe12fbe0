//! Fetch/decompress loop.

use crate::api::LogClient;
use crate::pipeline::{gzip, Producer};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

/// Producer loop: poll the endpoint, materialize the decompressed delta,
/// hand it to the tailor through the handshake, sleep, repeat. Returns
/// cleanly on shutdown or when the tailor side is gone; anything else that
/// goes wrong bubbles up as fatal.
pub async fn run_downloader(
    mut client: LogClient,
    log_path: PathBuf,
    interval: Duration,
    mut gate: Producer,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        let archive = tokio::select! {
            fetched = client.download_log() => fetched?,
            _ = shutdown.changed() => return Ok(()),
        };

        let appended = gzip::sync_decompressed(archive, log_path.clone()).await?;
        if appended > 0 {
            tracing::debug!(appended, "new log data materialized");
            tokio::select! {
                delivered = gate.offer() => {
                    if !delivered {
                        return Ok(());
                    }
                }
                _ = shutdown.changed() => return Ok(()),
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => return Ok(()),
        }
    }
}
