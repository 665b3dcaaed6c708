// Kbfn Input Layer
// Device discovery, exclusive reading and cancellation

mod device;
mod shutdown;
mod source;

pub use device::{
    find_device, is_virtual_device, list_devices, matches_device, select_device, DeviceError,
    DeviceInfo, VIRTUAL_DEVICE_PREFIX,
};
pub use shutdown::Shutdown;
pub use source::{EventSource, ReadOutcome};
