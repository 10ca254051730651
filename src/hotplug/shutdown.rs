// SPDX-License-Identifier: GPL-3.0-only
//! Shutdown signal for the observer thread
//!
//! An atomic flag for cheap checks plus an eventfd that the observer polls
//! next to the udev socket, so a stop request interrupts a blocked wait.
//! The eventfd is never drained: once signalled it stays readable.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
struct Inner {
    requested: AtomicBool,
    wake: OwnedFd,
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> io::Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: eventfd just returned this descriptor and nothing else owns it
        let wake = unsafe { OwnedFd::from_raw_fd(fd) };

        Ok(Self {
            inner: Arc::new(Inner {
                requested: AtomicBool::new(false),
                wake,
            }),
        })
    }

    pub fn request(&self) {
        if self.inner.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        let one: u64 = 1;
        let written = unsafe {
            libc::write(
                self.inner.wake.as_raw_fd(),
                (&one as *const u64).cast(),
                std::mem::size_of::<u64>(),
            )
        };
        if written < 0 {
            // The flag is already set; only a blocked poll will miss it
            error!("Failed to signal shutdown eventfd: {}", io::Error::last_os_error());
        }
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Descriptor that becomes readable once shutdown is requested
    pub fn wake_fd(&self) -> RawFd {
        self.inner.wake.as_raw_fd()
    }
}
