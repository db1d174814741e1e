use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};

use strike_finder::{
    batch::{channel, BatchEvent, BatchRunner, CancelFlag},
    config::{BatchConfig, Config},
    output::NamingMode,
    video::FfmpegBackend,
};

#[derive(Parser)]
#[command(
    name = "strike-finder",
    version,
    about = "Find lightning strikes in a folder of videos",
    long_about = "Strike-Finder scans every video in a folder for sudden bursts of change, saves the frames of each strike as PNG stills, cuts a short clip per strike and logs the change score of every frame."
)]
struct Cli {
    /// Folder containing the videos to scan
    #[arg(short, long)]
    input: PathBuf,

    /// Folder receiving stills, clips and score logs
    #[arg(short, long)]
    output: PathBuf,

    /// Changed-pixel count that counts as a strike
    #[arg(short, long)]
    threshold: Option<u64>,

    /// Output file suffix style
    #[arg(short, long, value_enum)]
    naming: Option<NamingMode>,

    /// Request an automatically derived threshold (not available yet)
    #[arg(long)]
    auto_threshold: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => {
                info!("Loading configuration from {:?}", config_path);
                Config::from_file(config_path)?
            }
            None => {
                info!("Using default configuration");
                Config::default()
            }
        };

        if let Some(threshold) = self.threshold {
            config.detection.threshold = threshold;
        }
        if let Some(naming) = self.naming {
            config.output.naming = naming;
        }
        if self.auto_threshold {
            config.detection.auto_threshold = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Strike-Finder v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;

    if let Some(path) = &cli.write_config {
        config.save_to_file(path)?;
        info!("Configuration written to {:?}", path);
        return Ok(());
    }

    if let Err(e) = FfmpegBackend::check_tools() {
        bail!(e.user_message());
    }

    let backend = FfmpegBackend::new(&config.output.codec);
    let batch = BatchConfig::new(cli.input, cli.output, config);
    let cancel = CancelFlag::new();
    let (tx, mut rx) = channel();

    let runner = BatchRunner::new(backend, batch, tx).with_cancel_flag(cancel.clone());
    let worker = tokio::task::spawn_blocking(move || runner.run());

    let mut cancel_requested = false;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(BatchEvent::Progress(percent)) => info!("Progress: {}%", percent),
                Some(BatchEvent::FileSkipped(skipped)) => {
                    info!("Skipped {}: {}", skipped.name, skipped.reason)
                }
                Some(BatchEvent::Error(message)) => error!("{}", message),
                Some(BatchEvent::Finished(_)) | None => break,
                Some(_) => {}
            },
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                warn!("Interrupt received, stopping after the current frame...");
                cancel.cancel();
                cancel_requested = true;
            }
        }
    }

    let summary = worker.await?;

    for failure in &summary.failures {
        error!("{}: {}", failure.name, failure.error);
    }

    if let Some(reason) = &summary.aborted {
        bail!("Scan aborted: {}", reason);
    }
    if !summary.failures.is_empty() {
        bail!("{} file(s) failed", summary.failures.len());
    }

    info!("Scan complete! {}", summary);
    Ok(())
}
