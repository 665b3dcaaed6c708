// Kbfn uinput Output
// Virtual keyboard that receives the transformed event stream

use super::EventSink;
use crate::event::{Event, KeyState};
use crate::input::DeviceError;
use crate::key::MAX_KEY_CODE;
use crate::state::PressedKeySet;
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, InputEvent};
use std::io;
use std::time::SystemTime;

/// Name of the virtual device; carries the prefix discovery skips
pub const DEFAULT_VIRTUAL_NAME: &str = "kbfn (virtual) keyboard";

// One flush rarely carries more than a tap plus a replayed key
const WRITE_BATCH_CAPACITY: usize = 16;

/// uinput-backed sink.
///
/// Writes are buffered until `flush`, which emits the whole batch followed
/// by a single SYN_REPORT, so multi-event emissions reach the system as
/// one report.
pub struct VirtualSink {
    device: VirtualDevice,
    // Written since the last flush, emitted as one report
    pending: Vec<InputEvent>,
    pressed: PressedKeySet,
}

impl VirtualSink {
    /// Create the virtual device, advertising every standard key code
    pub fn new(name: &str) -> Result<Self, DeviceError> {
        let mut keys = AttributeSet::new();
        for code in 0..=MAX_KEY_CODE {
            keys.insert(evdev::Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: io::Error| DeviceError::VirtualDevice(e.to_string()))?
            .name(name)
            .with_keys(&keys)
            .map_err(|e: io::Error| DeviceError::VirtualDevice(e.to_string()))?
            .build()
            .map_err(|e: io::Error| DeviceError::VirtualDevice(e.to_string()))?;

        log::info!("virtual device '{}' created", name);
        Ok(Self {
            device,
            pending: Vec::with_capacity(WRITE_BATCH_CAPACITY),
            pressed: PressedKeySet::new(),
        })
    }

    /// Release every key still down on the virtual device
    pub fn release_all(&mut self) -> io::Result<()> {
        let now = SystemTime::now();
        for key in self.pressed.snapshot() {
            log::debug!("releasing {} on shutdown", key);
            self.write(Event::key(now, key, KeyState::Up))?;
        }
        self.flush()
    }
}

impl EventSink for VirtualSink {
    fn write(&mut self, event: Event) -> io::Result<()> {
        self.pressed.update(&event);
        self.pending.push(event.into());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let result = self.device.emit(&self.pending);
        self.pending.clear();
        result
    }
}

impl Drop for VirtualSink {
    fn drop(&mut self) {
        // Keys left down on a destroyed device would stay stuck
        if let Err(e) = self.release_all() {
            log::warn!("failed to release keys on virtual device: {}", e);
        }
    }
}
