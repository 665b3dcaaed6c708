// Kbfn Event Model
// The value that travels through every layer of the pipeline

use super::KeyState;
use crate::Key;
use std::time::SystemTime;

/// EV_SYN event type code from input-event-codes.h
pub const EV_SYN: u16 = 0x00;
/// EV_KEY event type code from input-event-codes.h
pub const EV_KEY: u16 = 0x01;

/// Event category.
///
/// Only key events are interpreted by the layers; everything else keeps its
/// raw evdev type so it can be written back out untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Key,
    Other(u16),
}

impl EventKind {
    /// Classify a raw evdev event type
    pub fn from_type(event_type: u16) -> Self {
        if event_type == EV_KEY {
            EventKind::Key
        } else {
            EventKind::Other(event_type)
        }
    }

    /// Raw evdev event type
    pub fn to_type(self) -> u16 {
        match self {
            EventKind::Key => EV_KEY,
            EventKind::Other(event_type) => event_type,
        }
    }
}

/// One input event.
///
/// Layers take events by value and may rewrite `code` or `value` before
/// forwarding; the timestamp is carried along or set explicitly when a
/// layer synthesizes a new event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: SystemTime,
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
}

impl Event {
    pub fn new(time: SystemTime, kind: EventKind, code: u16, value: i32) -> Self {
        Self {
            time,
            kind,
            code,
            value,
        }
    }

    /// Create a key event
    pub fn key(time: SystemTime, key: Key, state: KeyState) -> Self {
        Self::new(time, EventKind::Key, key.code(), state.to_i32())
    }

    /// Whether this is a key-category event
    pub fn is_key(&self) -> bool {
        self.kind == EventKind::Key
    }

    /// The key of a key-category event
    pub fn key_code(&self) -> Option<Key> {
        self.is_key().then_some(Key(self.code))
    }

    /// Up/down/hold value of a key-category event
    pub fn key_state(&self) -> Option<KeyState> {
        if self.is_key() {
            KeyState::from_i32(self.value)
        } else {
            None
        }
    }

    /// Key and state together, for key events with a known value
    pub fn as_key(&self) -> Option<(Key, KeyState)> {
        Some((self.key_code()?, self.key_state()?))
    }

    /// Same event with its key code replaced
    pub fn with_code(self, key: Key) -> Self {
        Self {
            code: key.code(),
            ..self
        }
    }

    /// Whether this is an EV_SYN report, which never enters the pipeline
    pub fn is_sync(&self) -> bool {
        self.kind == EventKind::Other(EV_SYN)
    }
}

#[cfg(feature = "evdev-backend")]
impl From<evdev::InputEvent> for Event {
    fn from(event: evdev::InputEvent) -> Self {
        Self::new(
            event.timestamp(),
            EventKind::from_type(event.event_type().0),
            event.code(),
            event.value(),
        )
    }
}

#[cfg(feature = "evdev-backend")]
impl From<Event> for evdev::InputEvent {
    fn from(event: Event) -> Self {
        // uinput stamps written events itself
        evdev::InputEvent::new(evdev::EventType(event.kind.to_type()), event.code, event.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_event_kind_from_type() {
        assert_eq!(EventKind::from_type(EV_KEY), EventKind::Key);
        assert_eq!(EventKind::from_type(0x04), EventKind::Other(0x04));
        assert_eq!(EventKind::Other(0x04).to_type(), 0x04);
    }

    #[test]
    fn test_key_event_accessors() {
        let time = UNIX_EPOCH + Duration::from_millis(5);
        let event = Event::key(time, Key::SPACE, KeyState::Down);
        assert!(event.is_key());
        assert_eq!(event.as_key(), Some((Key::SPACE, KeyState::Down)));

        let rewritten = event.with_code(Key::UP);
        assert_eq!(rewritten.key_code(), Some(Key::UP));
        assert_eq!(rewritten.time, time);
        assert_eq!(rewritten.value, 1);
    }

    #[test]
    fn test_other_event_has_no_key_state() {
        // EV_MSC / MSC_SCAN
        let event = Event::new(UNIX_EPOCH, EventKind::Other(0x04), 4, 0x70039);
        assert_eq!(event.key_code(), None);
        assert_eq!(event.key_state(), None);
        assert!(!event.is_sync());
        assert!(Event::new(UNIX_EPOCH, EventKind::Other(EV_SYN), 0, 0).is_sync());
    }

    #[test]
    fn test_key_event_with_unknown_value() {
        let event = Event::new(UNIX_EPOCH, EventKind::Key, 30, 7);
        assert_eq!(event.key_code(), Some(Key::A));
        assert_eq!(event.as_key(), None);
    }
}
