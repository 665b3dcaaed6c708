// Kbfn Event Source
// Exclusive, cancellable reader for one physical keyboard

use super::{DeviceError, Shutdown};
use crate::event::Event;
use evdev::Device;
use std::io;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// Result of one wait on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Events reported by the device, EV_SYN reports removed
    Batch(Vec<Event>),
    /// The timeout passed (or a signal interrupted the wait)
    Timeout,
    /// Shutdown was requested; the device has been released
    Closed,
}

/// Grabbed input device.
///
/// While the source is open no other consumer on the host sees the
/// device's events. The grab is released when `read_batch` reports
/// `Closed` or an error, and on drop.
pub struct EventSource {
    device: Device,
    name: String,
    shutdown: Shutdown,
    grabbed: bool,
}

impl EventSource {
    /// Take exclusive ownership of `device`
    pub fn open(mut device: Device, shutdown: Shutdown) -> Result<Self, DeviceError> {
        let name = device.name().unwrap_or("Unknown").to_string();

        // A previous instance that crashed may have left the device grabbed
        let _ = device.ungrab();
        device.grab()?;
        log::info!("grabbed '{}'", name);

        Ok(Self {
            device,
            name,
            shutdown,
            grabbed: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next batch of events.
    ///
    /// Blocks until the device has data, `timeout` elapses (`None` waits
    /// indefinitely) or shutdown is requested. Never busy-polls.
    pub fn read_batch(&mut self, timeout: Option<Duration>) -> Result<ReadOutcome, DeviceError> {
        if !self.grabbed || self.shutdown.is_requested() {
            self.release();
            return Ok(ReadOutcome::Closed);
        }

        let mut fds = [
            libc::pollfd {
                fd: self.device.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.shutdown.raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
        ];

        let ready = unsafe {
            libc::poll(
                fds.as_mut_ptr(),
                fds.len() as libc::nfds_t,
                poll_timeout_ms(timeout),
            )
        };

        if ready < 0 {
            let err = io::Error::last_os_error();
            // EINTR just means a signal was delivered; the caller loops
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(ReadOutcome::Timeout);
            }
            self.release();
            return Err(DeviceError::Io(err));
        }

        if fds[1].revents & libc::POLLIN != 0 {
            self.release();
            return Ok(ReadOutcome::Closed);
        }

        if ready == 0 {
            return Ok(ReadOutcome::Timeout);
        }

        if fds[0].revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            self.release();
            return Err(DeviceError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("'{}' disconnected", self.name),
            )));
        }

        let fetched: io::Result<Vec<Event>> = self.device.fetch_events().map(|events| {
            events
                .map(Event::from)
                .filter(|event| !event.is_sync())
                .collect()
        });

        match fetched {
            Ok(events) => Ok(ReadOutcome::Batch(events)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(ReadOutcome::Timeout),
            Err(e) => {
                self.release();
                Err(DeviceError::Io(e))
            }
        }
    }

    fn release(&mut self) {
        if !self.grabbed {
            return;
        }
        self.grabbed = false;
        // Fails harmlessly when the device is already gone
        if let Err(e) = self.device.ungrab() {
            log::debug!("ungrab '{}': {}", self.name, e);
        }
        log::info!("released '{}'", self.name);
    }
}

/// Drop implementation for EventSource
///
/// The device MUST be ungrabbed on every exit path, including panics,
/// otherwise the physical keyboard stays unusable.
impl Drop for EventSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Convert an optional wait into a poll(2) timeout, rounding up so a
/// sub-millisecond remainder does not turn into a zero-timeout spin.
fn poll_timeout_ms(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(timeout) => {
            let ms = timeout.as_micros().div_ceil(1000);
            ms.min(libc::c_int::MAX as u128) as libc::c_int
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_timeout_rounds_up() {
        assert_eq!(poll_timeout_ms(None), -1);
        assert_eq!(poll_timeout_ms(Some(Duration::ZERO)), 0);
        assert_eq!(poll_timeout_ms(Some(Duration::from_micros(400))), 1);
        assert_eq!(poll_timeout_ms(Some(Duration::from_millis(50))), 50);
        assert_eq!(
            poll_timeout_ms(Some(Duration::from_secs(u64::MAX))),
            libc::c_int::MAX
        );
    }
}
