// SPDX-License-Identifier: GPL-3.0-only
//! Startup and shutdown ordering
//!
//! The device is opened and the inventory populated before the observer
//! thread exists, so the first hotplug batch always has something to
//! reconcile against. Every resource is owned here or by the pipeline and
//! dropped when [`Daemon::run`] returns.

use crate::config::Config;
use crate::error::Result;
use crate::hotplug::{HotplugEvent, UdevChannel};
use crate::monitor::{
    ConnectorInventory, ConnectorSource, DisplayDevice, SysfsConnectors, open_display_subsystem,
    populate_connector_inventory,
};
use crate::pipeline::{Pipeline, PipelineSummary};
use crate::reconcile::{HookCommand, SysfsReconciler};
use crate::signals::spawn_signal_listener;

pub struct Daemon<S = SysfsConnectors> {
    config: Config,
    device: DisplayDevice,
    source: S,
    inventory: ConnectorInventory,
}

impl Daemon {
    /// Open the display device and take the initial connector inventory
    /// from sysfs.
    ///
    /// Either failing is fatal; the caller should exit non-zero.
    pub fn start(config: Config) -> Result<Self> {
        Self::start_with(config, SysfsConnectors)
    }
}

impl<S: ConnectorSource> Daemon<S> {
    /// Like [`Daemon::start`], reading connectors from `source`
    pub fn start_with(config: Config, source: S) -> Result<Self> {
        info!("Running drm-hotplugd");

        let device = open_display_subsystem(&config.device)?;

        info!("Populating DRM connector list");
        let inventory = populate_connector_inventory(&device, &source)?;
        info!(
            connectors = inventory.len(),
            connected = inventory.connected().count(),
            "Connector list populated"
        );

        Ok(Self {
            config,
            device,
            source,
            inventory,
        })
    }

    pub fn inventory(&self) -> &ConnectorInventory {
        &self.inventory
    }

    /// Run until SIGINT/SIGTERM. Only startup problems are returned; errors
    /// inside the pipeline are logged and survived.
    pub fn run(self) -> Result<PipelineSummary> {
        let Self {
            config,
            device,
            source,
            inventory,
        } = self;

        let pipeline = Pipeline::<HotplugEvent>::new(config.settle())?;
        spawn_signal_listener(pipeline.stop_handle())?;

        let subsystem = config.subsystem.clone();
        let devtype = config.devtype.clone();
        let open_channel = move || UdevChannel::open(&subsystem, devtype.as_deref());

        let hook = config.hook.as_ref().map(HookCommand::from);
        let reconciler = SysfsReconciler::new(source, hook);

        let summary = pipeline.run(open_channel, reconciler, inventory);

        info!(
            device = %device.path().display(),
            events = summary.reconciliation.events,
            cycles = summary.reconciliation.cycles,
            "drm-hotplugd stopped"
        );
        drop(device);
        Ok(summary)
    }
}
