// Kbfn Pressed Key Tracking
// Per-layer view of which keys are down after the layer's own rewriting

use crate::event::{Event, KeyState};
use crate::Key;
use smallvec::SmallVec;
use std::collections::HashSet;

/// Set of keys a layer has forwarded a down for and no up yet.
///
/// Updated on every forwarded key event with value up or down; hold
/// (auto-repeat) events leave membership unchanged.
#[derive(Debug, Clone, Default)]
pub struct PressedKeySet {
    pressed: HashSet<Key>,
}

impl PressedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a forwarded event
    pub fn update(&mut self, event: &Event) {
        match event.as_key() {
            Some((key, KeyState::Down)) => {
                self.pressed.insert(key);
            }
            Some((key, KeyState::Up)) => {
                self.pressed.remove(&key);
            }
            _ => {}
        }
    }

    /// Check if a key is currently pressed
    pub fn contains(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    /// Pressed keys in code order.
    ///
    /// Rarely more than a handful of keys are down at once, so this stays
    /// on the stack.
    pub fn snapshot(&self) -> SmallVec<[Key; 8]> {
        let mut keys: SmallVec<[Key; 8]> = self.pressed.iter().copied().collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn key_event(key: Key, state: KeyState) -> Event {
        Event::key(UNIX_EPOCH, key, state)
    }

    #[test]
    fn test_down_then_up() {
        let mut pressed = PressedKeySet::new();
        pressed.update(&key_event(Key::A, KeyState::Down));
        assert!(pressed.contains(Key::A));
        pressed.update(&key_event(Key::A, KeyState::Up));
        assert!(!pressed.contains(Key::A));
        assert!(pressed.is_empty());
    }

    #[test]
    fn test_hold_does_not_change_membership() {
        let mut pressed = PressedKeySet::new();
        pressed.update(&key_event(Key::X, KeyState::Hold));
        assert!(!pressed.contains(Key::X));

        pressed.update(&key_event(Key::X, KeyState::Down));
        pressed.update(&key_event(Key::X, KeyState::Hold));
        assert!(pressed.contains(Key::X));
    }

    #[test]
    fn test_up_for_unknown_key_is_ignored() {
        let mut pressed = PressedKeySet::new();
        pressed.update(&key_event(Key::J, KeyState::Down));
        pressed.update(&key_event(Key::K, KeyState::Up));
        assert_eq!(pressed.snapshot().as_slice(), &[Key::J]);
    }
}
