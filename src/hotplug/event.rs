// SPDX-License-Identifier: GPL-3.0-only
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

/// Something handed through the queue that must be released exactly once.
///
/// `release` takes `self`, so a second release does not type-check.
pub trait Release {
    fn release(self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugAction {
    Add,
    Remove,
    Change,
}

impl HotplugAction {
    /// Only add/remove/change mean a topology change; bind/unbind are driver noise
    pub fn from_event_type(event_type: udev::EventType) -> Option<Self> {
        match event_type {
            udev::EventType::Add => Some(Self::Add),
            udev::EventType::Remove => Some(Self::Remove),
            udev::EventType::Change => Some(Self::Change),
            _ => None,
        }
    }
}

impl fmt::Display for HotplugAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Change => "change",
        };
        f.write_str(name)
    }
}

/// One kernel hotplug notification
///
/// libudev objects are not `Send`, so the observer copies out what the
/// reconciliation side may want and drops the udev device on its own
/// thread. This handle is what crosses the queue.
#[derive(Debug)]
pub struct HotplugEvent {
    pub action: HotplugAction,
    pub seqnum: u64,
    pub syspath: PathBuf,
    pub sysname: String,
    pub devnode: Option<PathBuf>,
    /// `HOTPLUG=1` is set by DRM for connector status changes
    pub hotplug: bool,
    /// Kernel connector object id, when the driver reports a single connector
    pub connector: Option<u32>,
    pub received_at: Instant,
}

impl HotplugEvent {
    pub fn from_udev(action: HotplugAction, event: &udev::Event) -> Self {
        let property = |name: &str| event.property_value(name).map(OsStr::to_string_lossy);

        Self {
            action,
            seqnum: event.sequence_number(),
            syspath: event.syspath().to_path_buf(),
            sysname: event.sysname().to_string_lossy().into_owned(),
            devnode: event.devnode().map(|p| p.to_path_buf()),
            hotplug: property("HOTPLUG").is_some_and(|v| v == "1"),
            connector: property("CONNECTOR").and_then(|v| v.parse().ok()),
            received_at: Instant::now(),
        }
    }
}

impl Release for HotplugEvent {
    fn release(self) {
        trace!(
            seqnum = self.seqnum,
            latency = ?self.received_at.elapsed(),
            "released hotplug event"
        );
    }
}
