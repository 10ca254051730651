// SPDX-License-Identifier: GPL-3.0-only
//! Connector model and inventory diffing

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorStatus {
    Connected,
    Disconnected,
    Unknown,
}

impl ConnectorStatus {
    /// Parse the sysfs `status` attribute
    pub fn from_sysfs(value: &str) -> Self {
        match value.trim() {
            "connected" => Self::Connected,
            "disconnected" => Self::Disconnected,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A resolution as advertised in the sysfs `modes` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mode {
    pub width: u32,
    pub height: u32,
    /// Trailing `i` in the sysfs listing
    pub interlaced: bool,
}

impl Mode {
    /// Parse one `modes` line such as `1920x1080` or `1920x1080i`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (line, interlaced) = match line.strip_suffix('i') {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        let (width, height) = line.split_once('x')?;
        Some(Self {
            width: width.parse().ok()?,
            height: height.parse().ok()?,
            interlaced,
        })
    }

    /// Parse a whole `modes` attribute, skipping lines that do not parse
    pub fn parse_list(value: &str) -> Vec<Self> {
        value.lines().filter_map(Self::parse).collect()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if self.interlaced {
            f.write_str("i")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connector {
    /// Connector name without the card prefix, e.g. "HDMI-A-1"
    pub name: String,
    /// Kernel connector object id (`connector_id`, newer kernels only)
    pub id: Option<u32>,
    pub status: ConnectorStatus,
    pub enabled: bool,
    /// Advertised modes; the kernel lists the preferred one first
    pub modes: Vec<Mode>,
}

impl Connector {
    /// Build a connector from sysfs attributes.
    ///
    /// `attribute` looks up one attribute of the connector device.
    pub fn from_attributes<'a>(
        name: impl Into<String>,
        attribute: impl Fn(&str) -> Option<&'a str>,
    ) -> Self {
        Self {
            name: name.into(),
            id: attribute("connector_id").and_then(|v| v.trim().parse().ok()),
            status: attribute("status")
                .map(ConnectorStatus::from_sysfs)
                .unwrap_or(ConnectorStatus::Unknown),
            enabled: attribute("enabled").is_some_and(|v| v.trim() == "enabled"),
            modes: attribute("modes").map(Mode::parse_list).unwrap_or_default(),
        }
    }

    pub fn preferred_mode(&self) -> Option<Mode> {
        self.modes.first().copied()
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectorStatus::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorChange {
    Added(String),
    Removed(String),
    StatusChanged {
        name: String,
        from: ConnectorStatus,
        to: ConnectorStatus,
    },
    EnabledChanged {
        name: String,
        enabled: bool,
    },
    PreferredModeChanged {
        name: String,
        from: Option<Mode>,
        to: Option<Mode>,
    },
}

impl ConnectorChange {
    pub fn connector(&self) -> &str {
        match self {
            Self::Added(name) | Self::Removed(name) => name,
            Self::StatusChanged { name, .. }
            | Self::EnabledChanged { name, .. }
            | Self::PreferredModeChanged { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Removed(_) => "removed",
            Self::StatusChanged { to, .. } => match to {
                ConnectorStatus::Connected => "connected",
                ConnectorStatus::Disconnected => "disconnected",
                ConnectorStatus::Unknown => "unknown",
            },
            Self::EnabledChanged { enabled: true, .. } => "enabled",
            Self::EnabledChanged { enabled: false, .. } => "disabled",
            Self::PreferredModeChanged { .. } => "mode",
        }
    }
}

impl fmt::Display for ConnectorChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.connector())
    }
}

/// Connectors of one DRM card, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectorInventory {
    card: String,
    connectors: BTreeMap<String, Connector>,
}

impl ConnectorInventory {
    pub fn new(card: impl Into<String>, connectors: impl IntoIterator<Item = Connector>) -> Self {
        Self {
            card: card.into(),
            connectors: connectors.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    pub fn card(&self) -> &str {
        &self.card
    }

    pub fn get(&self, name: &str) -> Option<&Connector> {
        self.connectors.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn connected(&self) -> impl Iterator<Item = &Connector> {
        self.iter().filter(|c| c.is_connected())
    }

    /// Changes needed to go from `self` to `next`, ordered by connector name
    pub fn diff(&self, next: &ConnectorInventory) -> Vec<ConnectorChange> {
        let mut changes = Vec::new();

        for (name, old) in &self.connectors {
            let Some(new) = next.connectors.get(name) else {
                changes.push(ConnectorChange::Removed(name.clone()));
                continue;
            };
            if old.status != new.status {
                changes.push(ConnectorChange::StatusChanged {
                    name: name.clone(),
                    from: old.status,
                    to: new.status,
                });
            }
            if old.enabled != new.enabled {
                changes.push(ConnectorChange::EnabledChanged {
                    name: name.clone(),
                    enabled: new.enabled,
                });
            }
            if old.preferred_mode() != new.preferred_mode() {
                changes.push(ConnectorChange::PreferredModeChanged {
                    name: name.clone(),
                    from: old.preferred_mode(),
                    to: new.preferred_mode(),
                });
            }
        }

        for name in next.connectors.keys() {
            if !self.connectors.contains_key(name) {
                changes.push(ConnectorChange::Added(name.clone()));
            }
        }

        changes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn connector(
        name: &str,
        status: ConnectorStatus,
        modes: &[(u32, u32)],
    ) -> Connector {
        Connector {
            name: name.to_string(),
            id: None,
            status,
            enabled: status == ConnectorStatus::Connected,
            modes: modes
                .iter()
                .map(|&(width, height)| Mode {
                    width,
                    height,
                    interlaced: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            Mode::parse("1920x1080"),
            Some(Mode {
                width: 1920,
                height: 1080,
                interlaced: false
            })
        );
        assert_eq!(Mode::parse("1920x1080i").map(|m| m.interlaced), Some(true));
        assert_eq!(Mode::parse("garbage"), None);
        assert_eq!(Mode::parse("x1080"), None);
        assert_eq!(Mode::parse("1920x1080i").unwrap().to_string(), "1920x1080i");
    }

    #[test]
    fn test_mode_list_skips_bad_lines() {
        let modes = Mode::parse_list("3840x2160\n1920x1080\n\nbogus\n1280x720\n");
        assert_eq!(modes.len(), 3);
        assert_eq!(modes[0].width, 3840);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ConnectorStatus::from_sysfs("connected\n"), ConnectorStatus::Connected);
        assert_eq!(ConnectorStatus::from_sysfs("disconnected"), ConnectorStatus::Disconnected);
        assert_eq!(ConnectorStatus::from_sysfs("weird"), ConnectorStatus::Unknown);
    }

    #[test]
    fn test_from_attributes() {
        let attrs: HashMap<&str, &str> = [
            ("status", "connected\n"),
            ("enabled", "enabled\n"),
            ("modes", "2560x1440\n1920x1080\n"),
            ("connector_id", "95\n"),
        ]
        .into_iter()
        .collect();

        let c = Connector::from_attributes("DP-1", |name| attrs.get(name).copied());
        assert_eq!(c.name, "DP-1");
        assert_eq!(c.id, Some(95));
        assert!(c.is_connected());
        assert!(c.enabled);
        assert_eq!(c.preferred_mode().map(|m| m.width), Some(2560));
    }

    #[test]
    fn test_from_attributes_missing_values() {
        let c = Connector::from_attributes("Writeback-1", |_| None);
        assert_eq!(c.status, ConnectorStatus::Unknown);
        assert!(!c.enabled);
        assert!(c.modes.is_empty());
        assert_eq!(c.id, None);
    }

    #[test]
    fn test_diff_unchanged() {
        let a = ConnectorInventory::new(
            "card0",
            [connector("eDP-1", ConnectorStatus::Connected, &[(1920, 1080)])],
        );
        assert!(a.diff(&a.clone()).is_empty());
    }

    #[test]
    fn test_diff_plug_and_mode_change() {
        let before = ConnectorInventory::new(
            "card0",
            [
                connector("DP-1", ConnectorStatus::Disconnected, &[]),
                connector("eDP-1", ConnectorStatus::Connected, &[(1920, 1080)]),
                connector("HDMI-A-1", ConnectorStatus::Connected, &[(1280, 720)]),
            ],
        );
        let after = ConnectorInventory::new(
            "card0",
            [
                connector("DP-1", ConnectorStatus::Connected, &[(3840, 2160)]),
                connector("eDP-1", ConnectorStatus::Connected, &[(1920, 1080)]),
                connector("DP-2", ConnectorStatus::Disconnected, &[]),
            ],
        );

        let changes: Vec<String> = before.diff(&after).iter().map(|c| c.to_string()).collect();
        assert_eq!(
            changes,
            vec![
                "connected:DP-1",
                "enabled:DP-1",
                "mode:DP-1",
                "removed:HDMI-A-1",
                "added:DP-2",
            ]
        );
    }

    #[test]
    fn test_connected_filter() {
        let inventory = ConnectorInventory::new(
            "card0",
            [
                connector("DP-1", ConnectorStatus::Disconnected, &[]),
                connector("eDP-1", ConnectorStatus::Connected, &[(1920, 1080)]),
            ],
        );
        let names: Vec<&str> = inventory.connected().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["eDP-1"]);
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.card(), "card0");
    }
}
