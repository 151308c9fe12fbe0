//! Error taxonomy for the log pipeline.
//!
//! Every variant here is fatal for the run: a failed fetch or a partially
//! decompressed archive must stop the process rather than be retried over
//! an inconsistent on-disk state.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TailError {
    /// Remote endpoint answered with something other than 200.
    #[error("unexpected response status {status}: {body}")]
    Status { status: u16, body: String },

    /// 200 response whose JSON body carried no usable `redirect` field.
    #[error("download response is missing a redirect URL")]
    MissingRedirect,

    /// The gzip stream ran out before reaching the bytes already on disk.
    #[error("archive {} is truncated: needed to skip {expected} decompressed bytes, stream ended at {actual}", path.display())]
    TruncatedArchive {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
