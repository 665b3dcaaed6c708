// Kbfn Output Layer
// Terminal consumers of the pipeline

mod memory;

#[cfg(feature = "evdev-backend")]
mod uinput;

use crate::event::Event;
use std::io;

pub use memory::MemorySink;

#[cfg(feature = "evdev-backend")]
pub use uinput::{VirtualSink, DEFAULT_VIRTUAL_NAME};

/// Destination of the events leaving the last layer
pub trait EventSink {
    /// Queue one event for output
    fn write(&mut self, event: Event) -> io::Result<()>;

    /// Make everything written since the last flush visible at once
    fn flush(&mut self) -> io::Result<()>;
}
