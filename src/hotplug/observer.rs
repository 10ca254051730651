// SPDX-License-Identifier: GPL-3.0-only
//! Hotplug observer thread
//!
//! Opens the monitoring channel on its own thread (the udev socket is not
//! `Send`), waits for readiness and forwards every event to the hand-off
//! queue. Channel setup failures only end this thread; the rest of the
//! daemon keeps running without hotplug detection.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::Result;

use super::event::Release;
use super::queue::{HandoffQueue, QueueClosed};
use super::shutdown::ShutdownSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// An event is pending on the channel
    Ready,
    /// The shutdown signal fired while waiting
    Shutdown,
}

/// Source of kernel hotplug notifications
pub trait MonitorChannel {
    type Event: Release + fmt::Debug + Send + 'static;

    /// Block until an event is pending or shutdown is requested. No timeout.
    fn wait_ready(&mut self, shutdown: &ShutdownSignal) -> Result<Readiness>;

    /// Retrieve one pending event, if the channel actually has one
    fn receive_event(&mut self) -> Option<Self::Event>;
}

/// Why the observer thread ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverExit {
    /// The monitoring channel could not be opened
    ChannelUnavailable(String),
    /// Waiting on the channel failed
    Failed(String),
    /// Shutdown was requested or the queue was closed
    Stopped,
    /// The thread could not be spawned at all
    NotStarted(String),
    Panicked,
}

pub struct ObserverHandle {
    thread: Option<JoinHandle<ObserverExit>>,
    not_started: Option<String>,
}

impl ObserverHandle {
    pub fn join(self) -> ObserverExit {
        if let Some(reason) = self.not_started {
            return ObserverExit::NotStarted(reason);
        }
        match self.thread {
            Some(thread) => thread.join().unwrap_or(ObserverExit::Panicked),
            None => ObserverExit::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

pub struct HotplugObserver;

impl HotplugObserver {
    /// Start the observer thread.
    ///
    /// `open` runs on the new thread. A spawn failure is logged and reported
    /// through the returned handle rather than aborting startup.
    pub fn spawn<C, F>(
        open: F,
        queue: Arc<HandoffQueue<C::Event>>,
        shutdown: ShutdownSignal,
    ) -> ObserverHandle
    where
        C: MonitorChannel,
        F: FnOnce() -> Result<C> + Send + 'static,
    {
        let spawned = thread::Builder::new()
            .name("hotplug-observer".to_string())
            .spawn(move || match open() {
                Ok(channel) => {
                    info!("Hotplug monitoring initialised");
                    observe(channel, &queue, &shutdown)
                }
                Err(e) => {
                    error!("Failed to initialize display hotplug monitoring: {}", e);
                    ObserverExit::ChannelUnavailable(e.to_string())
                }
            });

        match spawned {
            Ok(thread) => ObserverHandle {
                thread: Some(thread),
                not_started: None,
            },
            Err(e) => {
                error!("Failed to spawn hotplug observer thread: {}", e);
                ObserverHandle {
                    thread: None,
                    not_started: Some(e.to_string()),
                }
            }
        }
    }
}

/// Observer main loop: Waiting -> Pushing -> Waiting until stopped.
/// The channel is dropped when this returns.
pub fn observe<C: MonitorChannel>(
    mut channel: C,
    queue: &HandoffQueue<C::Event>,
    shutdown: &ShutdownSignal,
) -> ObserverExit {
    loop {
        if shutdown.is_requested() {
            break;
        }

        match channel.wait_ready(shutdown) {
            Ok(Readiness::Ready) => {}
            Ok(Readiness::Shutdown) => break,
            Err(e) => {
                error!("Hotplug monitoring stopped: {}", e);
                return ObserverExit::Failed(e.to_string());
            }
        }

        let Some(event) = channel.receive_event() else {
            debug!("Channel signalled ready but no event was retrieved");
            continue;
        };

        debug!(?event, "Forwarding hotplug event");
        if let Err(QueueClosed(event)) = queue.push(event) {
            event.release();
            break;
        }
    }

    info!("Hotplug observer stopped");
    ObserverExit::Stopped
}
