//! Command-line entry point: load the device list, run the fleet, persist
//! the results.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};

use rfleet::dispatcher::{CancelToken, Dispatcher, Outcome};
use rfleet::inventory;
use rfleet::session::SessionSettings;
use rfleet::sink::ResultSink;
use rfleet::transport::{SecurityLevel, SshTransport};

/// Run commands against a fleet of network devices over SSH.
#[derive(Parser)]
#[command(name = "rfleet", version, about)]
struct Cli {
    /// Device list file (rows: address,username,password,device_type,secret,commands[,read_timeout])
    #[arg(long, value_name = "FILE")]
    devices: PathBuf,

    /// Number of concurrent device sessions
    #[arg(long, default_value_t = 4, value_name = "COUNT")]
    workers: usize,

    /// Directory for per-device output files
    #[arg(long, default_value = "./result", value_name = "DIR")]
    output: PathBuf,

    /// Failure log path
    #[arg(long, default_value = "failed_devices.txt", value_name = "FILE")]
    failed: PathBuf,

    /// Prompt marker terminating each command response
    #[arg(long, default_value = "> ", value_name = "MARKER")]
    prompt: String,

    /// Per-device connect timeout in seconds
    #[arg(long, default_value_t = 10, value_name = "SECS")]
    connect_timeout: u64,

    /// SSH algorithm profile
    #[arg(long, value_enum, default_value_t = SecurityArg::Legacy)]
    security: SecurityArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum SecurityArg {
    Secure,
    Balanced,
    Legacy,
}

impl From<SecurityArg> for SecurityLevel {
    fn from(arg: SecurityArg) -> SecurityLevel {
        match arg {
            SecurityArg::Secure => SecurityLevel::Secure,
            SecurityArg::Balanced => SecurityLevel::Balanced,
            SecurityArg::Legacy => SecurityLevel::LegacyCompatible,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(!cli.prompt.is_empty(), "prompt marker must not be empty");

    let devices = inventory::load(&cli.devices)
        .with_context(|| format!("loading device list {}", cli.devices.display()))?;
    info!("dispatching {} device(s)", devices.len());

    let mut sink = ResultSink::open(&cli.output, &cli.failed)
        .await
        .with_context(|| format!("preparing output location {}", cli.output.display()))?;

    let settings = SessionSettings {
        prompt_marker: cli.prompt.into_bytes(),
        connect_timeout: Duration::from_secs(cli.connect_timeout),
        ..SessionSettings::default()
    };
    let transport = SshTransport::new(cli.security.into());
    let dispatcher = Dispatcher::new(transport, settings, cli.workers);

    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping dispatch");
            interrupt.cancel();
        }
    });

    let mut reports = dispatcher.run(devices, cancel);
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    while let Some(report) = reports.recv().await {
        match &report.outcome {
            Outcome::Output(_) => {
                info!("{} commands executed successfully", report.address);
                succeeded += 1;
            }
            Outcome::Failed { stage, reason } => {
                warn!("{} {} failed: {}", report.address, stage.label(), reason);
                failed += 1;
            }
        }
        sink.record(&report)
            .await
            .with_context(|| format!("persisting result for {}", report.address))?;
    }

    info!("run finished: {succeeded} succeeded, {failed} failed");
    Ok(())
}
