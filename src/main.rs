use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mgdwatch::{format_duration, Settings, SAMPLE_CONFIG};
use mgdwatch_sdk::Poller;

#[derive(Parser, Debug)]
#[command(name = "mgdwatch")]
#[command(about = "Read metrics from one or many mgd servers")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server to poll (host or host:port); repeat for several servers.
    /// Replaces the configured server list.
    #[arg(short, long = "server")]
    servers: Vec<String>,

    /// Time between passes (e.g. "10s", "1m")
    #[arg(short, long)]
    interval: Option<String>,

    /// Output format: line or json
    #[arg(short, long)]
    format: Option<String>,

    /// Append output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Print a sample configuration and exit
    #[arg(long, conflicts_with_all = ["config", "once"])]
    sample_config: bool,
}

impl Args {
    /// Apply command-line overrides on top of loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if !self.servers.is_empty() {
            settings.servers = self.servers.clone();
        }
        if let Some(interval) = &self.interval {
            settings.interval = interval.clone();
        }
        if let Some(format) = &self.format {
            settings.output.format = format.clone();
        }
        if let Some(path) = &self.output {
            settings.output.path = Some(path.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.sample_config {
        print!("{}", SAMPLE_CONFIG);
        return Ok(());
    }

    // Logs go to stderr; stdout carries metrics.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut settings);

    let interval = settings.interval()?;
    let adapter = settings.adapter()?;
    let addresses = adapter.addresses();

    let mut builder = Poller::builder(adapter).interval(interval);
    for output in settings.outputs()? {
        builder = builder.output(output);
    }
    let poller = builder.build();

    if args.once {
        let emitted = poller
            .run_once()
            .await
            .with_context(|| format!("gathering from {}", addresses.join(", ")))?;
        info!(emitted, "pass complete");
        return Ok(());
    }

    info!(
        servers = ?addresses,
        interval = %format_duration(interval),
        format = %settings.output.format,
        "starting mgdwatch"
    );

    let handle = poller.start();
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    let summary = handle.summary();
    handle.stop();

    if let Some(err) = &summary.last_error {
        warn!(error = %err, "last pass failed");
    }
    info!(
        passes = summary.passes,
        failures = summary.failures,
        emitted = summary.emitted,
        "shutting down"
    );
    Ok(())
}
