// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use drm_hotplugd::config::Config;
use drm_hotplugd::logging::setup_logs;
use drm_hotplugd::Daemon;

/// Reconcile DRM connectors whenever a monitor is plugged or unplugged
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/drm-hotplugd/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DRM card node to manage
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Milliseconds to keep collecting events into one batch
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Log filter, e.g. "debug" or "drm_hotplugd=trace"
    #[arg(long)]
    log_level: Option<String>,

    /// Log to stderr only
    #[arg(long)]
    no_journald: bool,

    /// Print the connector inventory and exit
    #[arg(long)]
    list_connectors: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.device = device.clone();
        }
        if let Some(settle_ms) = self.settle_ms {
            config.settle_ms = settle_ms;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.no_journald {
            config.logging.journald = false;
        }
    }
}

fn list_connectors(daemon: &Daemon) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(daemon.inventory())
        .context("Failed to serialise inventory")?;
    println!("{json}");
    Ok(())
}

fn run(config: Config, list_only: bool) -> anyhow::Result<()> {
    let daemon = Daemon::start(config).context("Failed to start")?;
    if list_only {
        return list_connectors(&daemon);
    }

    let summary = daemon.run()?;
    info!(observer = ?summary.observer, "Exiting");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from this file, so it is not up yet
            eprintln!("drm-hotplugd: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);
    setup_logs(&config.logging);

    match run(config, cli.list_connectors) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
