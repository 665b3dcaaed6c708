// Kbfn Remap Layer
// Stateless one-to-one key code substitution

use super::{Layer, TimerId, Timers};
use crate::event::Event;
use crate::Key;
use std::collections::HashMap;
use std::io;

/// Rewrites the code of mapped key events; everything else passes through.
///
/// Each event is substituted at most once, so chains such as A -> B,
/// B -> C turn A into B, never into C.
pub struct RemapLayer {
    codes: HashMap<Key, Key>,
    next: Box<dyn Layer>,
}

impl RemapLayer {
    pub fn new(codes: impl IntoIterator<Item = (Key, Key)>, next: Box<dyn Layer>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
            next,
        }
    }

    /// Output key for `key`, if it is mapped
    pub fn lookup(&self, key: Key) -> Option<Key> {
        self.codes.get(&key).copied()
    }
}

impl Layer for RemapLayer {
    fn transform(&mut self, mut event: Event, timers: &mut Timers) -> io::Result<()> {
        if let Some(target) = event.key_code().and_then(|key| self.lookup(key)) {
            log::trace!("remap {} -> {}", Key(event.code), target);
            event = event.with_code(target);
        }
        self.next.transform(event, timers)
    }

    fn expire(&mut self, timer: TimerId, timers: &mut Timers) -> io::Result<()> {
        self.next.expire(timer, timers)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.next.flush()
    }
}
