// Kbfn Core Library
// Layered keyboard event pipeline: remapping and dual-role keys

pub mod config;
pub mod event;
pub mod key;
pub mod output;
pub mod state;
pub mod transform;

// Device access needs the kernel evdev/uinput interfaces
#[cfg(feature = "evdev-backend")]
pub mod input;

pub use config::{Config, ConfigError, LayerConfig, LayerDescriptor, LayerKind, RemapConfig};
pub use event::{Event, EventKind, KeyState};
pub use key::{key_from_name, key_name, Key, MAX_KEY_CODE};
pub use output::{EventSink, MemorySink};
pub use state::{PressedKeySet, ReleaseCodeMap};
pub use transform::{
    DualRoleConfig, DualRoleEngine, EngineState, HoldAction, Layer, Pipeline, RemapLayer,
    TimerId, Timers,
};

#[cfg(feature = "evdev-backend")]
pub use input::{DeviceError, EventSource, ReadOutcome, Shutdown};
#[cfg(feature = "evdev-backend")]
pub use output::{VirtualSink, DEFAULT_VIRTUAL_NAME};
