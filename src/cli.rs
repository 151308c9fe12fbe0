//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

/// Tail AEM as a Cloud Service logs in near real time.
#[derive(Debug, Parser)]
#[command(name = "aemtail", version, about)]
pub struct Args {
    /// Path to a TOML file with org_id, client_id and access_token
    #[arg(short = 'f', long = "file")]
    pub credentials: PathBuf,

    /// Environment ID of the AEMaaCS environment
    #[arg(short = 'e', long = "environment-id")]
    pub environment_id: String,

    /// Program ID
    #[arg(short = 'p', long = "program-id")]
    pub program_id: String,

    /// Service name, e.g. "author" or "publish"
    #[arg(short = 's', long)]
    pub service: String,

    /// Log name to tail, e.g. "aemerror"
    #[arg(long = "log")]
    pub log_name: String,

    /// Cloud Manager base URL
    #[arg(long, default_value = "https://cloudmanager.adobe.io")]
    pub base_url: String,

    /// Working directory for the archive and decompressed log.
    /// A temp directory is created (and removed on exit) when omitted.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Seconds to wait between polls
    #[arg(long, default_value_t = 10)]
    pub interval: u64,
}
