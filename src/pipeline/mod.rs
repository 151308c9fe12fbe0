//! Streaming log synchronization pipeline.
//!
//! Two loops connected by a strict rendezvous: the downloader polls the
//! remote archive and appends newly decompressed bytes to the local log,
//! the tailor prints whatever was appended since its last read.

mod downloader;
mod gzip;
mod rendezvous;
mod tailor;

pub use downloader::run_downloader;
pub use gzip::{read_size_hint, sync_decompressed};
pub use rendezvous::{rendezvous, Consumer, Producer};
pub use tailor::{run_tailor, LineSink, StdoutSink, Tailor};

/// File name of the compressed archive inside the working directory.
pub const ARCHIVE_FILE_NAME: &str = "aemlog.log.gz";

/// File name of the accumulating decompressed log.
pub const LOG_FILE_NAME: &str = "aem-log.log";

/// How far before end-of-file the very first read starts, so a cold start
/// does not replay the whole historical log. A tunable heuristic, not a
/// correctness invariant.
pub const INITIAL_TAIL_WINDOW: u64 = 5 * 1024;
