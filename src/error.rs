// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the daemon
//!
//! Startup failures are fatal; everything raised after the pipeline is
//! running is only ever logged.

use std::path::PathBuf;

use thiserror::Error;

/// Main daemon error type
#[derive(Error, Debug)]
pub enum DaemonError {
    /// The DRM card node could not be opened
    #[error("Failed to open display device {}: {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Enumeration succeeded but found nothing to manage
    #[error("No connectors found for {card}")]
    NoConnectors { card: String },

    /// udev enumeration error
    #[error("udev error: {0}")]
    Udev(#[source] std::io::Error),

    /// The hotplug monitoring channel failed
    #[error("Monitoring channel error: {0}")]
    MonitorChannel(#[source] std::io::Error),

    /// Hook command ran but did not succeed
    #[error("Hook `{command}` failed: {status}")]
    Hook { command: String, status: String },

    /// Hook command could not be started
    #[error("Failed to run hook `{command}`: {source}")]
    HookSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for DaemonError
pub type Result<T> = std::result::Result<T, DaemonError>;
