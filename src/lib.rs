// SPDX-License-Identifier: GPL-3.0-only
//! Keeps DRM display outputs in sync with monitor hotplug
//!
//! A udev observer thread feeds kernel hotplug notifications through a
//! FIFO hand-off queue to a reconciliation loop on the main thread, which
//! rescans the card's connectors once per burst of events.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod hotplug;
pub mod lifecycle;
pub mod logging;
pub mod monitor;
pub mod pipeline;
pub mod reconcile;
pub mod signals;

pub use error::{DaemonError, Result};
pub use lifecycle::Daemon;
pub use pipeline::{Pipeline, PipelineSummary, StopHandle};
