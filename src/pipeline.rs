// SPDX-License-Identifier: GPL-3.0-only
//! Hotplug pipeline: observer thread -> hand-off queue -> reconciliation loop
//!
//! The queue and the shutdown signal are created here and passed to both
//! sides explicitly; nothing is process-global.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::hotplug::{
    HandoffQueue, HotplugObserver, MonitorChannel, ObserverExit, Release, ShutdownSignal,
};
use crate::monitor::ConnectorInventory;
use crate::reconcile::{LoopSummary, Reconcile, ReconciliationLoop};

/// Requests an orderly stop of a running pipeline. Cheap to clone.
pub struct StopHandle<E> {
    queue: Arc<HandoffQueue<E>>,
    shutdown: ShutdownSignal,
}

impl<E> StopHandle<E> {
    /// Wake the observer out of its wait and end the reconciliation loop
    pub fn stop(&self) {
        self.shutdown.request();
        self.queue.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_requested()
    }
}

impl<E> Clone for StopHandle<E> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Everything the pipeline owned, handed back once it has stopped
#[derive(Debug)]
pub struct PipelineSummary {
    pub reconciliation: LoopSummary,
    pub observer: ObserverExit,
    pub inventory: ConnectorInventory,
}

pub struct Pipeline<E> {
    queue: Arc<HandoffQueue<E>>,
    shutdown: ShutdownSignal,
    settle: Duration,
}

impl<E> Pipeline<E>
where
    E: Release + fmt::Debug + Send + 'static,
{
    pub fn new(settle: Duration) -> io::Result<Self> {
        Ok(Self {
            queue: Arc::new(HandoffQueue::new()),
            shutdown: ShutdownSignal::new()?,
            settle,
        })
    }

    pub fn stop_handle(&self) -> StopHandle<E> {
        StopHandle {
            queue: Arc::clone(&self.queue),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Start the observer and run the reconciliation loop on this thread.
    ///
    /// Blocks until [`StopHandle::stop`] is called. If the monitoring channel
    /// cannot be opened the loop still runs; it just never sees an event.
    pub fn run<C, F, R>(
        self,
        open_channel: F,
        reconciler: R,
        inventory: ConnectorInventory,
    ) -> PipelineSummary
    where
        C: MonitorChannel<Event = E>,
        F: FnOnce() -> Result<C> + Send + 'static,
        R: Reconcile,
    {
        let stop = self.stop_handle();
        let observer =
            HotplugObserver::spawn(open_channel, Arc::clone(&self.queue), self.shutdown.clone());

        let mut reconciliation =
            ReconciliationLoop::new(self.queue, reconciler, inventory, self.settle);
        let summary = reconciliation.run();

        // The loop only returns once the queue is closed; make sure the
        // observer got the message too before joining it.
        stop.stop();
        let observer = observer.join();
        match &observer {
            ObserverExit::Stopped => debug!("Hotplug observer joined"),
            other => warn!("Hotplug observer ended early: {:?}", other),
        }

        PipelineSummary {
            reconciliation: summary,
            observer,
            inventory: reconciliation.into_inventory(),
        }
    }
}
