// SPDX-License-Identifier: GPL-3.0-only
//! Display hotplug detection using udev
//!
//! A dedicated observer thread watches the DRM subsystem and hands every
//! add/remove/change notification to the reconciliation loop through a
//! shared FIFO queue.

mod event;
mod observer;
mod queue;
mod shutdown;
mod udev_monitor;

pub use event::{HotplugAction, HotplugEvent, Release};
pub use observer::{
    HotplugObserver, MonitorChannel, ObserverExit, ObserverHandle, Readiness, observe,
};
pub use queue::{HandoffQueue, QueueClosed};
pub use shutdown::ShutdownSignal;
pub use udev_monitor::UdevChannel;

#[cfg(test)]
pub(crate) use observer::tests as testing;
