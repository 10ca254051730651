// SPDX-License-Identifier: GPL-3.0-only
//! Tracing setup
//!
//! `RUST_LOG` wins over the configured level. The journald layer is added
//! only when the journal socket is reachable.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

pub fn setup_logs(config: &LoggingConfig) {
    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let journal_layer = if config.journald {
        tracing_journald::layer().ok()
    } else {
        None
    };

    // Option<Layer> is itself a layer, so a missing journal is a no-op
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(journal_layer)
        .init();
}
