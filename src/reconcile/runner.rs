// SPDX-License-Identifier: GPL-3.0-only
//! Reconciliation loop
//!
//! Runs on the main thread. Sleeps on the hand-off queue until the observer
//! pushes something, takes the whole backlog (plus anything arriving within
//! the settle window), releases every event and then reconciles once for
//! the batch. The queue lock is never held while reconciling.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::hotplug::{HandoffQueue, Release};
use crate::monitor::ConnectorInventory;

use super::{Reconcile, ReconcileReport};

#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing was queued
    Idle,
    Reconciled(ReconcileReport),
    /// Reconciliation failed; the next batch retries
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Events drained and released
    pub events: usize,
    /// Reconciliation attempts, one per batch
    pub cycles: usize,
    pub failures: usize,
}

pub struct ReconciliationLoop<E, R> {
    queue: Arc<HandoffQueue<E>>,
    reconciler: R,
    inventory: ConnectorInventory,
    settle: Duration,
    summary: LoopSummary,
}

impl<E, R> ReconciliationLoop<E, R>
where
    E: Release + fmt::Debug,
    R: Reconcile,
{
    pub fn new(
        queue: Arc<HandoffQueue<E>>,
        reconciler: R,
        inventory: ConnectorInventory,
        settle: Duration,
    ) -> Self {
        Self {
            queue,
            reconciler,
            inventory,
            settle,
            summary: LoopSummary::default(),
        }
    }

    pub fn summary(&self) -> LoopSummary {
        self.summary
    }

    /// Block until the queue is closed, reconciling once per batch
    pub fn run(&mut self) -> LoopSummary {
        info!(settle = ?self.settle, "Waiting for hotplug events");

        while let Some(mut batch) = self.queue.wait_drain() {
            if !self.settle.is_zero() {
                batch.extend(self.queue.drain_for(self.settle));
            }

            if self.queue.is_closed() {
                // Shutting down: release what we hold, skip the hardware pass
                let count = self.release_batch(batch);
                debug!(events = count, "Released events queued at shutdown");
                break;
            }

            self.reconcile_batch(batch);
        }

        info!(
            events = self.summary.events,
            cycles = self.summary.cycles,
            failures = self.summary.failures,
            "Reconciliation loop stopped"
        );
        self.summary
    }

    /// One non-blocking pass: drain whatever is queued and, if anything was,
    /// reconcile once
    pub fn cycle(&mut self) -> CycleOutcome {
        let batch = self.queue.drain();
        if batch.is_empty() {
            return CycleOutcome::Idle;
        }
        self.reconcile_batch(batch)
    }

    fn release_batch(&mut self, batch: Vec<E>) -> usize {
        let count = batch.len();
        for event in batch {
            trace!(?event, "Releasing hotplug event");
            event.release();
        }
        self.summary.events += count;
        count
    }

    fn reconcile_batch(&mut self, batch: Vec<E>) -> CycleOutcome {
        let count = self.release_batch(batch);
        info!(events = count, "Hotplug activity detected, reconciling connectors");

        self.summary.cycles += 1;
        let started = Instant::now();
        match self.reconciler.reconcile(&mut self.inventory) {
            Ok(report) => {
                info!(
                    changes = report.changes.len(),
                    elapsed = ?started.elapsed(),
                    "Reconciliation ok"
                );
                CycleOutcome::Reconciled(report)
            }
            Err(e) => {
                self.summary.failures += 1;
                error!("Reconciliation failed: {}", e);
                CycleOutcome::Failed
            }
        }
    }

    pub fn into_inventory(self) -> ConnectorInventory {
        self.inventory
    }
}
