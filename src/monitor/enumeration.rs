// SPDX-License-Identifier: GPL-3.0-only
use std::ffi::OsStr;

use crate::error::{DaemonError, Result};

use super::connector::{Connector, ConnectorInventory};
use super::device::DisplayDevice;

/// Something that can list the connectors of one card
pub trait ConnectorSource {
    fn scan(&self, card: &str) -> Result<Vec<Connector>>;
}

/// Reads connectors from the DRM sysfs tree through udev
///
/// Connector devices show up in the `drm` subsystem as `<card>-<name>`,
/// e.g. `card0-HDMI-A-1`, with `status`, `enabled` and `modes` attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsConnectors;

impl ConnectorSource for SysfsConnectors {
    fn scan(&self, card: &str) -> Result<Vec<Connector>> {
        let mut enumerator = udev::Enumerator::new().map_err(DaemonError::Udev)?;
        enumerator.match_subsystem("drm").map_err(DaemonError::Udev)?;

        let prefix = format!("{card}-");
        let mut connectors = Vec::new();

        for device in enumerator.scan_devices().map_err(DaemonError::Udev)? {
            let sysname = device.sysname().to_string_lossy();
            let Some(name) = connector_name(&sysname, &prefix) else {
                continue;
            };

            let connector = Connector::from_attributes(name, |attr| {
                device.attribute_value(attr).and_then(OsStr::to_str)
            });
            debug!(
                connector = %connector.name,
                status = %connector.status,
                modes = connector.modes.len(),
                "Found connector"
            );
            connectors.push(connector);
        }

        Ok(connectors)
    }
}

/// Strip the card prefix from a sysfs device name
pub fn connector_name<'a>(sysname: &'a str, prefix: &str) -> Option<&'a str> {
    sysname.strip_prefix(prefix).filter(|name| !name.is_empty())
}

/// Enumerate the connectors of `device`. Zero connectors is an error.
pub fn populate_connector_inventory(
    device: &DisplayDevice,
    source: &impl ConnectorSource,
) -> Result<ConnectorInventory> {
    scan_inventory(device.card(), source)
}

pub(crate) fn scan_inventory(
    card: &str,
    source: &impl ConnectorSource,
) -> Result<ConnectorInventory> {
    let connectors = source.scan(card)?;
    if connectors.is_empty() {
        return Err(DaemonError::NoConnectors {
            card: card.to_string(),
        });
    }
    Ok(ConnectorInventory::new(card, connectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::ConnectorStatus;
    use crate::monitor::testing::connector;

    struct FixedSource(Vec<Connector>);

    impl ConnectorSource for FixedSource {
        fn scan(&self, _card: &str) -> Result<Vec<Connector>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_connector_name() {
        assert_eq!(connector_name("card0-HDMI-A-1", "card0-"), Some("HDMI-A-1"));
        assert_eq!(connector_name("card0", "card0-"), None);
        assert_eq!(connector_name("card0-", "card0-"), None);
        assert_eq!(connector_name("card1-DP-1", "card0-"), None);
        assert_eq!(connector_name("renderD128", "card0-"), None);
    }

    #[test]
    fn test_empty_scan_is_error() {
        let err = scan_inventory("card0", &FixedSource(Vec::new())).unwrap_err();
        assert!(matches!(err, DaemonError::NoConnectors { ref card } if card == "card0"));
    }

    #[test]
    fn test_scan_builds_inventory() {
        let source = FixedSource(vec![
            connector("eDP-1", ConnectorStatus::Connected, &[(1920, 1200)]),
            connector("DP-1", ConnectorStatus::Disconnected, &[]),
        ]);
        let inventory = scan_inventory("card0", &source).unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.connected().count(), 1);
    }
}
