// SPDX-License-Identifier: GPL-3.0-only
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::card_name;
use crate::error::{DaemonError, Result};

/// Open handle on a DRM card node
///
/// Holding the node open keeps the card from going away underneath the
/// daemon. The descriptor is closed when this is dropped.
#[derive(Debug)]
pub struct DisplayDevice {
    path: PathBuf,
    card: String,
    _file: File,
}

impl DisplayDevice {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// sysfs name of the card, e.g. "card0"
    pub fn card(&self) -> &str {
        &self.card
    }
}

/// Open the display control device at `path` (e.g. `/dev/dri/card0`)
pub fn open_display_subsystem(path: &Path) -> Result<DisplayDevice> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| DaemonError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Opened display device {}", path.display());
    Ok(DisplayDevice {
        path: path.to_path_buf(),
        card: card_name(path),
        _file: file,
    })
}
