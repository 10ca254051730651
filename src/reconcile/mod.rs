// SPDX-License-Identifier: GPL-3.0-only
//! Reconciliation of the connector inventory against the hardware
//!
//! The loop in [`runner`] decides *when* to reconcile; a [`Reconcile`]
//! implementation decides *what* that means.

mod hook;
mod runner;
mod sysfs;

pub use hook::HookCommand;
pub use runner::{CycleOutcome, LoopSummary, ReconciliationLoop};
pub use sysfs::SysfsReconciler;

use crate::error::Result;
use crate::monitor::{ConnectorChange, ConnectorInventory};

/// What a reconciliation pass observed and did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub changes: Vec<ConnectorChange>,
    pub hook_ran: bool,
}

/// Re-read hardware state and apply whatever the inventory needs
pub trait Reconcile {
    fn reconcile(&mut self, inventory: &mut ConnectorInventory) -> Result<ReconcileReport>;
}

#[cfg(test)]
pub(crate) use runner::tests as testing;
