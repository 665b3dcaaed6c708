// Kbfn Release Code Tracking
// Remembers what a translated down became so its up follows it

use crate::Key;
use std::collections::HashMap;

/// Input key -> output key emitted for its most recent down.
///
/// An entry exists exactly while a translated down has no forwarded up,
/// so a release is rewritten consistently even after the translation
/// that produced the down stopped being active.
#[derive(Debug, Clone, Default)]
pub struct ReleaseCodeMap {
    codes: HashMap<Key, Key>,
}

impl ReleaseCodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the output key used for an input key's down
    pub fn record(&mut self, input: Key, output: Key) {
        self.codes.insert(input, output);
    }

    /// Output key for a repeat, keeping the entry
    pub fn peek(&self, input: Key) -> Option<Key> {
        self.codes.get(&input).copied()
    }

    /// Output key for a release, removing the entry
    pub fn take(&mut self, input: Key) -> Option<Key> {
        self.codes.remove(&input)
    }

    pub fn contains(&self, input: Key) -> bool {
        self.codes.contains_key(&input)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_peek_take() {
        let mut codes = ReleaseCodeMap::new();
        codes.record(Key::I, Key::UP);

        assert_eq!(codes.peek(Key::I), Some(Key::UP));
        assert!(codes.contains(Key::I));
        assert_eq!(codes.take(Key::I), Some(Key::UP));
        assert_eq!(codes.take(Key::I), None);
        assert!(codes.is_empty());
    }
}
