//! Download the images listed in a CSV export into a timestamped run folder.
use std::fs;

use anyhow::{Context, Result};
use envconfig::Envconfig;
use media_common::records::read_identifiers_from_path;
use media_common::{LocationMapper, Run, RunLog};
use media_downloader::config::Config;
use media_downloader::downloader::Downloader;
use tracing::{info, warn};

fn run() -> Result<()> {
    let config = Config::init_from_env().context("Invalid configuration")?;

    let identifiers = read_identifiers_from_path(&config.csv_file_path)?;

    let run = Run::start();
    let run_dir = run.run_dir(&config.data_dir);
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create run dir {}", run_dir.display()))?;
    let log = RunLog::to_file(&run.log_file(&config.data_dir, "download"))?;
    info!(
        "Run {}: {} identifiers from {}, failure policy {}",
        run.timestamp(),
        identifiers.len(),
        config.csv_file_path.display(),
        config.on_error
    );

    let downloader = Downloader::new(
        LocationMapper::new(config.location_config()),
        run_dir,
        config.request_timeout.0,
        &config.user_agent,
        config.on_error,
    )?;
    let summary = downloader.run(&identifiers, &log)?;

    if summary.is_clean() {
        info!("{summary}");
    } else {
        warn!(
            "{summary}, see {}",
            run.log_file(&config.data_dir, "download").display()
        );
    }
    info!("Downloaded files are in {}", downloader.run_dir().display());

    Ok(())
}

fn main() {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    if let Err(e) = run() {
        eprintln!("Oops! {e}");

        let mut source = e.source();
        if source.is_some() {
            eprintln!("\nCaused by:");
            let mut index = 0;
            while let Some(err) = source {
                eprintln!("    {index}: {err}");
                source = err.source();
                index += 1;
            }
        }
        std::process::exit(1);
    }
}
