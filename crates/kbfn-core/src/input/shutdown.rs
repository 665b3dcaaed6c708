// Kbfn Shutdown Handle
// Cross-thread stop request that also wakes a blocked device read

use parking_lot::{Condvar, Mutex};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Inner {
    requested: Mutex<bool>,
    wake: Condvar,
    // Becomes readable once shutdown is requested; polled next to the device
    eventfd: OwnedFd,
}

/// Cloneable stop request.
///
/// `request` may be called from any thread (typically the signal thread).
/// It wakes sleepers in `wait_timeout` and makes any pending
/// `EventSource::read_batch` return `ReadOutcome::Closed`.
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new() -> io::Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: eventfd just returned this descriptor and nothing else owns it
        let eventfd = unsafe { OwnedFd::from_raw_fd(fd) };

        Ok(Self {
            inner: Arc::new(Inner {
                requested: Mutex::new(false),
                wake: Condvar::new(),
                eventfd,
            }),
        })
    }

    /// Ask everything holding this handle to stop. Idempotent.
    pub fn request(&self) {
        {
            let mut requested = self.inner.requested.lock();
            if *requested {
                return;
            }
            *requested = true;
        }
        self.inner.wake.notify_all();

        // The counter is never read back, so the fd stays readable for good
        let value: u64 = 1;
        let written = unsafe {
            libc::write(
                self.inner.eventfd.as_raw_fd(),
                &value as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if written < 0 {
            log::warn!(
                "failed to signal shutdown eventfd: {}",
                io::Error::last_os_error()
            );
        }
    }

    pub fn is_requested(&self) -> bool {
        *self.inner.requested.lock()
    }

    /// Sleep for up to `timeout`, returning early (with `true`) on shutdown
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut requested = self.inner.requested.lock();
        while !*requested {
            if self.inner.wake.wait_until(&mut requested, deadline).timed_out() {
                break;
            }
        }
        *requested
    }

    pub(crate) fn raw_fd(&self) -> RawFd {
        self.inner.eventfd.as_raw_fd()
    }
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("requested", &self.is_requested())
            .finish()
    }
}
