// SPDX-License-Identifier: GPL-3.0-only
use crate::error::Result;
use crate::monitor::{ConnectorInventory, ConnectorSource, scan_inventory};

use super::hook::HookCommand;
use super::{Reconcile, ReconcileReport};

/// Rescans the card, records what changed and hands off to the hook
///
/// An empty rescan or a failing hook is treated as a transient failure:
/// the previous inventory is kept and the next hotplug batch retries.
pub struct SysfsReconciler<S> {
    source: S,
    hook: Option<HookCommand>,
}

impl<S: ConnectorSource> SysfsReconciler<S> {
    pub fn new(source: S, hook: Option<HookCommand>) -> Self {
        Self { source, hook }
    }
}

impl<S: ConnectorSource> Reconcile for SysfsReconciler<S> {
    fn reconcile(&mut self, inventory: &mut ConnectorInventory) -> Result<ReconcileReport> {
        let next = scan_inventory(inventory.card(), &self.source)?;
        let changes = inventory.diff(&next);

        if changes.is_empty() {
            info!("Connector state unchanged");
            return Ok(ReconcileReport::default());
        }

        for change in &changes {
            info!(connector = change.connector(), change = change.kind(), "Connector changed");
        }

        // The new state is only committed once the hook has applied it, so
        // a failed hook sees the same changes again on the next batch
        let hook_ran = match &self.hook {
            Some(hook) => {
                hook.run(&next, &changes)?;
                true
            }
            None => false,
        };

        *inventory = next;
        Ok(ReconcileReport { changes, hook_ran })
    }
}
