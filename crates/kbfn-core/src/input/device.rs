// Kbfn Input Layer - Device Discovery
// Finds the physical keyboard by display name or path

use evdev::{Device, EventType};
use std::io;
use std::path::PathBuf;

/// Name prefix of devices created by kbfn itself
pub const VIRTUAL_DEVICE_PREFIX: &str = "kbfn (virtual)";

/// Errors from the physical or virtual device
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Device I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to create virtual device: {0}")]
    VirtualDevice(String),
}

impl DeviceError {
    /// Whether the caller should go back to discovery instead of exiting
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DeviceError::NotFound(_) | DeviceError::Io(_))
    }
}

/// Device information for listing devices
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device index
    pub index: usize,
    /// Device name
    pub name: String,
    /// Device path (if available)
    pub path: Option<String>,
}

/// Check if a device is a virtual device created by kbfn.
///
/// Grabbing our own output device would feed events back into the pipeline.
pub fn is_virtual_device(name: &str) -> bool {
    name.starts_with(VIRTUAL_DEVICE_PREFIX)
}

/// Check whether a device matches the configured selector (name or path)
pub fn matches_device(name: &str, path: &str, wanted: &str) -> bool {
    !is_virtual_device(name) && (name == wanted || path == wanted)
}

/// Check if a device looks like a keyboard (EV_KEY with letter keys and SPACE)
fn is_keyboard_device(device: &Device) -> bool {
    if !device.supported_events().contains(EventType::KEY) {
        return false;
    }
    match device.supported_keys() {
        Some(keys) => [evdev::Key::KEY_SPACE, evdev::Key::KEY_A, evdev::Key::KEY_Z]
            .iter()
            .all(|key| keys.contains(*key)),
        None => false,
    }
}

/// Pick the node to grab among enumerated `(name, path, is_keyboard)` entries.
///
/// A path selects its node exactly. A display name is often shared by the
/// keyboard node and the mouse or consumer-control nodes of the same
/// receiver, so a name only selects nodes that look like keyboards.
pub fn select_device<'a, I>(candidates: I, wanted: &str) -> Option<usize>
where
    I: IntoIterator<Item = (&'a str, &'a str, bool)>,
{
    candidates.into_iter().position(|(name, path, is_keyboard)| {
        if !matches_device(name, path, wanted) {
            return false;
        }
        if path != wanted && !is_keyboard {
            log::debug!("skipping '{}' at {}: not a keyboard", name, path);
            return false;
        }
        true
    })
}

/// Open the device selected by `wanted` (display name or path)
pub fn find_device(wanted: &str) -> Result<Device, DeviceError> {
    let devices: Vec<(PathBuf, Device)> = evdev::enumerate().collect();
    let chosen = select_device(
        devices.iter().map(|(path, device)| {
            (
                device.name().unwrap_or("Unknown"),
                path.to_str().unwrap_or_default(),
                is_keyboard_device(device),
            )
        }),
        wanted,
    );

    match chosen.and_then(|index| devices.into_iter().nth(index)) {
        Some((path, device)) => {
            log::info!(
                "found device '{}' at {}",
                device.name().unwrap_or("Unknown"),
                path.display()
            );
            Ok(device)
        }
        None => Err(DeviceError::NotFound(wanted.to_string())),
    }
}

/// List keyboard devices, for `--list-devices`
pub fn list_devices() -> Vec<DeviceInfo> {
    evdev::enumerate()
        .filter(|(_, device)| {
            is_keyboard_device(device) && !is_virtual_device(device.name().unwrap_or(""))
        })
        .enumerate()
        .map(|(index, (path, device))| DeviceInfo {
            index,
            name: device.name().unwrap_or("Unknown").to_string(),
            path: path.to_str().map(|s| s.to_string()),
        })
        .collect()
}
