// SPDX-License-Identifier: GPL-3.0-only
//! Daemon configuration
//!
//! Loaded from `$XDG_CONFIG_HOME/drm-hotplugd/config.json`. A missing
//! default file falls back to [`Config::default`]; a missing file that was
//! asked for explicitly is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DaemonError, Result};

pub const APP_DIR: &str = "drm-hotplugd";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// DRM card node whose connectors are managed
    pub device: PathBuf,
    /// udev subsystem to monitor
    pub subsystem: String,
    /// Optional devtype filter; `drm_minor` cuts out most non-connector noise
    pub devtype: Option<String>,
    /// How long to keep collecting events into a batch before reconciling
    pub settle_ms: u64,
    /// Command run after a reconciliation that observed changes
    pub hook: Option<HookConfig>,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HookConfig {
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "drm_hotplugd=debug,warn"
    pub level: String,
    /// Also log to the systemd journal when it is reachable
    pub journald: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/dri/card0"),
            subsystem: "drm".to_string(),
            devtype: Some("drm_minor".to_string()),
            settle_ms: 250,
            hook: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            journald: true,
        }
    }
}

impl Config {
    /// Load config from `path`, or from the standard location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DaemonError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| DaemonError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Card name used for sysfs lookups, e.g. "card0" for /dev/dri/card0
pub fn card_name(device: &Path) -> String {
    device
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "card0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.device, PathBuf::from("/dev/dri/card0"));
        assert_eq!(config.subsystem, "drm");
        assert_eq!(config.devtype.as_deref(), Some("drm_minor"));
        assert_eq!(config.settle(), Duration::from_millis(250));
        assert_eq!(card_name(&config.device), "card0");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "device": "/dev/dri/card1", "settle_ms": 0,
                 "hook": {{ "command": "/usr/bin/kanshictl", "args": ["reload"] }},
                 "logging": {{ "level": "debug" }} }}"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(card_name(&config.device), "card1");
        assert_eq!(config.settle(), Duration::ZERO);
        assert_eq!(config.subsystem, "drm");
        assert!(config.logging.journald);
        assert_eq!(config.logging.level, "debug");
        let hook = config.hook.unwrap();
        assert_eq!(hook.command, PathBuf::from("/usr/bin/kanshictl"));
        assert_eq!(hook.args, vec!["reload".to_string()]);
    }

    #[test]
    fn test_null_devtype_disables_filter() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "devtype": null }}"#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.devtype, None);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(DaemonError::Config { .. })));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            Config::load(Some(file.path())),
            Err(DaemonError::Config { .. })
        ));
    }
}
