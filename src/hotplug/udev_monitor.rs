// SPDX-License-Identifier: GPL-3.0-only
use std::io;
use std::os::fd::{AsRawFd, RawFd};

use crate::error::{DaemonError, Result};

use super::event::{HotplugAction, HotplugEvent};
use super::observer::{MonitorChannel, Readiness};
use super::shutdown::ShutdownSignal;

/// udev monitor socket for display hotplug events
///
/// Not `Send`; it must be created on the thread that polls it.
pub struct UdevChannel {
    socket: udev::MonitorSocket,
}

impl UdevChannel {
    /// Open a monitor for `subsystem`, optionally narrowed to one devtype.
    ///
    /// `drm` with `drm_minor` keeps connector changes and drops most other
    /// DRM chatter.
    pub fn open(subsystem: &str, devtype: Option<&str>) -> Result<Self> {
        let builder = udev::MonitorBuilder::new().map_err(DaemonError::MonitorChannel)?;
        let builder = match devtype {
            Some(devtype) => builder.match_subsystem_devtype(subsystem, devtype),
            None => builder.match_subsystem(subsystem),
        }
        .map_err(DaemonError::MonitorChannel)?;
        let socket = builder.listen().map_err(DaemonError::MonitorChannel)?;

        info!(subsystem, devtype = ?devtype, "Listening for udev events");
        Ok(Self { socket })
    }
}

impl MonitorChannel for UdevChannel {
    type Event = HotplugEvent;

    fn wait_ready(&mut self, shutdown: &ShutdownSignal) -> Result<Readiness> {
        wait_readable(self.socket.as_raw_fd(), shutdown)
    }

    fn receive_event(&mut self) -> Option<HotplugEvent> {
        let event = self.socket.iter().next()?;

        debug!(
            "udev event: type={:?}, subsystem={:?}, devtype={:?}, syspath={:?}",
            event.event_type(),
            event.subsystem(),
            event.devtype(),
            event.syspath()
        );

        match HotplugAction::from_event_type(event.event_type()) {
            Some(action) => {
                let hotplug = HotplugEvent::from_udev(action, &event);
                info!(
                    action = %hotplug.action,
                    seqnum = hotplug.seqnum,
                    sysname = %hotplug.sysname,
                    "Display event detected"
                );
                Some(hotplug)
            }
            None => {
                debug!("Ignoring udev {:?} event", event.event_type());
                None
            }
        }
    }
}

/// Block until `fd` is readable or `shutdown` fires. No timeout.
///
/// `POLLERR` on a netlink socket is usually a receive buffer overrun after
/// an event burst; the next read clears it, so it counts as ready. Only a
/// hung up or invalid descriptor ends the wait with an error.
fn wait_readable(fd: RawFd, shutdown: &ShutdownSignal) -> Result<Readiness> {
    let mut fds = [
        libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        },
        libc::pollfd {
            fd: shutdown.wake_fd(),
            events: libc::POLLIN,
            revents: 0,
        },
    ];

    loop {
        trace!("Waiting for udev events...");

        // Negative timeout: block until one of the descriptors is readable
        let ready = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };

        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(DaemonError::MonitorChannel(err));
        }

        if fds[1].revents != 0 || shutdown.is_requested() {
            return Ok(Readiness::Shutdown);
        }

        let revents = fds[0].revents;
        if revents & libc::POLLNVAL != 0 {
            return Err(DaemonError::MonitorChannel(io::Error::other(format!(
                "udev socket is not open (revents {revents:#x})"
            ))));
        }
        if revents & libc::POLLIN != 0 {
            return Ok(Readiness::Ready);
        }
        if revents & libc::POLLHUP != 0 {
            return Err(DaemonError::MonitorChannel(io::Error::other(format!(
                "udev socket hung up (revents {revents:#x})"
            ))));
        }
        if revents & libc::POLLERR != 0 {
            warn!("udev socket reported an error, likely dropped events; reading on");
            return Ok(Readiness::Ready);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::{FromRawFd, OwnedFd};
    use std::thread;
    use std::time::Duration;

    fn pipe() -> (OwnedFd, OwnedFd) {
        let mut fds = [0; 2];
        let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
        assert_eq!(rc, 0, "pipe2: {}", io::Error::last_os_error());
        // SAFETY: pipe2 just returned both descriptors
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }

    #[test]
    fn test_shutdown_wakes_blocked_wait() {
        let (read, _write) = pipe();
        let shutdown = ShutdownSignal::new().unwrap();

        let waiter = {
            let shutdown = shutdown.clone();
            let fd = read.as_raw_fd();
            thread::spawn(move || wait_readable(fd, &shutdown))
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished(), "wait returned with nothing to read");

        shutdown.request();
        assert_eq!(waiter.join().unwrap().unwrap(), Readiness::Shutdown);
    }

    #[test]
    fn test_readable_fd_is_ready() {
        let (read, write) = pipe();
        let shutdown = ShutdownSignal::new().unwrap();
        let written = unsafe { libc::write(write.as_raw_fd(), b"x".as_ptr().cast(), 1) };
        assert_eq!(written, 1);

        let readiness = wait_readable(read.as_raw_fd(), &shutdown).unwrap();
        assert_eq!(readiness, Readiness::Ready);
    }

    #[test]
    fn test_socket_error_keeps_reading() {
        // The write end of a pipe without readers polls as POLLERR
        let (read, write) = pipe();
        drop(read);
        let shutdown = ShutdownSignal::new().unwrap();

        let readiness = wait_readable(write.as_raw_fd(), &shutdown).unwrap();
        assert_eq!(readiness, Readiness::Ready);
    }

    #[test]
    fn test_hang_up_fails_the_wait() {
        let (read, write) = pipe();
        drop(write);
        let shutdown = ShutdownSignal::new().unwrap();

        let err = wait_readable(read.as_raw_fd(), &shutdown).unwrap_err();
        assert!(matches!(err, DaemonError::MonitorChannel(_)));
    }
}
