//! syncbench - throughput benchmark for document synchronization engines
//!
//! Runs fixed-duration phases of fetch/push/sync operations against a remote
//! endpoint and prints operation counts per window. The engine driven here is
//! the in-tree simulated one; real engines plug in through the
//! `libsyncbench::engine` traits.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use libsyncbench::phase::default_phases;
use libsyncbench::report::{write_json_report, Reporter};
use libsyncbench::sim::SimEngine;
use libsyncbench::{BenchmarkConfig, BenchmarkDriver, FailurePolicy, Phase, Result};

#[derive(Parser)]
#[command(name = "syncbench")]
#[command(about = "Throughput benchmark for document synchronization engines")]
#[command(version)]
struct Cli {
    /// Base URL of the remote repository namespace (e.g. https://github.com/user/)
    #[arg(long, env = "SYNCBENCH_REMOTE_URL")]
    remote_url: Option<String>,

    /// Access credential for the remote
    #[arg(long, env = "SYNCBENCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Duration of each phase in seconds
    #[arg(long, default_value = "30")]
    phase_secs: u64,

    /// Cool-down between phases in milliseconds, letting background sync
    /// work drain before the next phase's counters are snapshotted
    #[arg(long, default_value = "3000")]
    cooldown_ms: u64,

    /// Sync polling interval handed to the engine, in milliseconds
    #[arg(long, default_value = "3000")]
    interval_ms: u64,

    /// Comma-separated phases to run: fetch, push, sync (default: all three)
    #[arg(long)]
    phases: Option<String>,

    /// Keep a phase running after a failed operation instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Simulated engine operation latency in milliseconds
    #[arg(long, default_value = "0")]
    op_latency_ms: u64,

    /// Write phase results as JSON to this file
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing configuration is a usage error: print guidance, touch nothing.
    let (remote_url, token) = match (&cli.remote_url, &cli.token) {
        (Some(url), Some(token)) => (url.clone(), token.clone()),
        _ => {
            eprintln!(
                "Please set --remote-url / SYNCBENCH_REMOTE_URL and --token / SYNCBENCH_TOKEN"
            );
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&cli, remote_url, token).await {
        error!(error = %e, "benchmark failed");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: &Cli, remote_url: String, token: String) -> Result<()> {
    let mut config = BenchmarkConfig::new(remote_url, token);
    config.phase_duration = Duration::from_secs(cli.phase_secs);
    config.cooldown = Duration::from_millis(cli.cooldown_ms);
    config.interval = Duration::from_millis(cli.interval_ms);
    if cli.keep_going {
        config.failure_policy = FailurePolicy::Continue;
    }

    let phases = select_phases(cli, &config)?;

    let engine = SimEngine::new(&config).with_latency(Duration::from_millis(cli.op_latency_ms));
    let driver = BenchmarkDriver::new(config, engine);
    let results = driver.run_all(&phases).await?;

    Reporter::stdout().report(&results)?;

    if let Some(ref path) = cli.json_report {
        write_json_report(path, &results)?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

fn select_phases(cli: &Cli, config: &BenchmarkConfig) -> Result<Vec<Phase>> {
    let Some(ref list) = cli.phases else {
        return Ok(default_phases(config.phase_duration));
    };

    let mut phases = Vec::new();
    for name in list.split(',') {
        let name = name.trim();
        let phase = Phase::from_name(name, config.phase_duration).ok_or_else(|| {
            libsyncbench::BenchError::Config(format!(
                "unknown phase: '{name}'. Use: fetch, push, or sync"
            ))
        })?;
        phases.push(phase);
    }
    Ok(phases)
}
