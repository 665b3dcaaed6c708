// Kbfn In-Memory Sink
// Records pipeline output instead of writing to a device

use super::EventSink;
use crate::event::{Event, KeyState};
use crate::Key;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Recording {
    events: Vec<Event>,
    flushes: usize,
}

/// Sink that keeps every event it receives.
///
/// Clones share the same recording, so a test can hand one clone to a
/// pipeline and inspect the output through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    recording: Arc<Mutex<Recording>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn events(&self) -> Vec<Event> {
        self.recording.lock().events.clone()
    }

    /// Key events written so far, as (key, state) pairs
    pub fn keys(&self) -> Vec<(Key, KeyState)> {
        self.recording
            .lock()
            .events
            .iter()
            .filter_map(Event::as_key)
            .collect()
    }

    /// Number of flushes received
    pub fn flushes(&self) -> usize {
        self.recording.lock().flushes
    }

    pub fn clear(&self) {
        let mut recording = self.recording.lock();
        recording.events.clear();
        recording.flushes = 0;
    }
}

impl EventSink for MemorySink {
    fn write(&mut self, event: Event) -> io::Result<()> {
        self.recording.lock().events.push(event);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.recording.lock().flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_clones_share_recording() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();

        writer
            .write(Event::key(UNIX_EPOCH, Key::A, KeyState::Down))
            .unwrap();
        writer.flush().unwrap();

        assert_eq!(sink.keys(), vec![(Key::A, KeyState::Down)]);
        assert_eq!(sink.flushes(), 1);

        sink.clear();
        assert!(writer.events().is_empty());
    }
}
