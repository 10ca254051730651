// SPDX-License-Identifier: GPL-3.0-only
//! DRM display device and connector inventory

mod connector;
mod device;
mod enumeration;

pub use connector::{Connector, ConnectorChange, ConnectorInventory, ConnectorStatus, Mode};
pub use device::{DisplayDevice, open_display_subsystem};
pub use enumeration::{
    ConnectorSource, SysfsConnectors, connector_name, populate_connector_inventory,
};
pub(crate) use enumeration::scan_inventory;

#[cfg(test)]
pub(crate) use connector::tests as testing;
