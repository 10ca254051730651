// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;
use std::process::Command;

use crate::config::HookConfig;
use crate::error::{DaemonError, Result};
use crate::monitor::{ConnectorChange, ConnectorInventory};

/// External command that applies the actual mode changes
///
/// Runs synchronously after a reconciliation that found changes. The new
/// state is passed through the environment:
///
/// - `DRM_HOTPLUGD_CARD`: card name, e.g. `card0`
/// - `DRM_HOTPLUGD_CONNECTED`: comma separated connected connectors
/// - `DRM_HOTPLUGD_CHANGES`: comma separated `kind:connector` entries
#[derive(Debug, Clone)]
pub struct HookCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl HookCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn run(&self, inventory: &ConnectorInventory, changes: &[ConnectorChange]) -> Result<()> {
        let command = self.program.display().to_string();
        let connected = inventory
            .connected()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let change_list = changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        debug!(%command, %connected, changes = %change_list, "Running hook");

        let status = Command::new(&self.program)
            .args(&self.args)
            .env("DRM_HOTPLUGD_CARD", inventory.card())
            .env("DRM_HOTPLUGD_CONNECTED", &connected)
            .env("DRM_HOTPLUGD_CHANGES", &change_list)
            .status()
            .map_err(|source| DaemonError::HookSpawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(DaemonError::Hook {
                command,
                status: status.to_string(),
            })
        }
    }
}

impl From<&HookConfig> for HookCommand {
    fn from(config: &HookConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}
