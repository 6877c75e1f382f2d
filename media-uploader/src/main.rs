//! Back up and replace stale bucket objects with previously downloaded files.
use anyhow::{Context, Result};
use common_s3::{create_s3_client, S3Impl};
use envconfig::Envconfig;
use media_common::records::read_identifiers_from_path;
use media_common::{LocationMapper, Run, RunLog, StalenessClassifier};
use media_uploader::config::Config;
use media_uploader::uploader::{UploadMode, Uploader};
use tracing::{info, warn};

async fn run() -> Result<()> {
    let config = Config::init_from_env().context("Invalid configuration")?;
    let mode = config.upload_mode()?;

    let run = Run::start();
    let identifiers = read_identifiers_from_path(&config.csv_file_path)?;
    let log_file = run.log_file(&config.data_dir, "upload");
    let log = RunLog::to_file(&log_file)?;

    match &mode {
        UploadMode::CheckOnly => info!("Check-only run, nothing will be written"),
        UploadMode::Replace { downloaded_dir, .. } => {
            info!("Uploading replacements from {}", downloaded_dir.display())
        }
    }
    info!(
        "Run {}: {} identifiers from {}, cutoff {}, failure policy {}",
        run.timestamp(),
        identifiers.len(),
        config.csv_file_path.display(),
        config.modified_date_limit,
        config.on_error
    );

    let client = S3Impl::new(create_s3_client(&config.s3_config()).await);
    let uploader = Uploader::new(
        client,
        config.bucket_name.as_str(),
        LocationMapper::new(config.location_config()),
        StalenessClassifier::new(config.modified_date_limit),
        mode,
        config.on_error,
    );
    uploader.preflight().await?;

    let summary = uploader.run(&identifiers, &log).await?;
    if summary.is_clean() {
        info!("{summary}");
    } else {
        warn!("{summary}, see {}", log_file.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    if let Err(e) = run().await {
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
