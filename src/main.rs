use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use aemtail::api::{LogClient, LogClientConfig};
use aemtail::cli::Args;
use aemtail::config::Credentials;
use aemtail::pipeline::{
    rendezvous, run_downloader, run_tailor, StdoutSink, Tailor, LOG_FILE_NAME,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let credentials = Credentials::load(&args.credentials)?;

    // A user-supplied directory is left in place on exit; the auto-created
    // temp dir is removed when its guard drops.
    let mut work_guard = None;
    let work_dir = match &args.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create working directory {}", dir.display()))?;
            dir.clone()
        }
        None => {
            let tmp = tempfile::Builder::new().prefix("aem_logs").tempdir()?;
            let path = tmp.path().to_path_buf();
            work_guard = Some(tmp);
            path
        }
    };
    tracing::info!(dir = %work_dir.display(), "working directory ready");

    let log_path = work_dir.join(LOG_FILE_NAME);
    let client = LogClient::new(LogClientConfig {
        base_url: args.base_url,
        org_id: credentials.org_id,
        client_id: credentials.client_id,
        access_token: credentials.access_token,
        service: args.service,
        log_name: args.log_name,
        environment_id: args.environment_id,
        program_id: args.program_id,
        work_dir: work_dir.clone(),
    });

    let (producer, consumer) = rendezvous();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut downloader = tokio::spawn(run_downloader(
        client,
        log_path.clone(),
        Duration::from_secs(args.interval),
        producer,
        shutdown_rx.clone(),
    ));
    let mut tailor = tokio::spawn(run_tailor(
        Tailor::new(log_path, StdoutSink),
        consumer,
        shutdown_rx,
    ));

    let signal_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received, cleaning up");
            let _ = signal_shutdown.send(true);
        }
    });

    // Whichever loop finishes first takes the other one down with it: the
    // pipeline has no useful mode with only one side alive.
    let (download_result, tail_result) = tokio::select! {
        res = &mut downloader => {
            let _ = shutdown_tx.send(true);
            (res, tailor.await)
        }
        res = &mut tailor => {
            let _ = shutdown_tx.send(true);
            (downloader.await, res)
        }
    };

    drop(work_guard);

    if let Err(e) = download_result.context("log download task failed")? {
        eprintln!("\nERROR while getting the logs from AEMaaCS.\n\tMessage: {e:#}");
        std::process::exit(1);
    }
    if let Err(e) = tail_result.context("log tail task failed")? {
        eprintln!("\nERROR while tailing the log file.\n\tMessage: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
