// Kbfn Dual-Role Engine
// Tap/hold disambiguation for a key that is a plain key when tapped and a
// layer switch or modifier when held

use super::{Layer, LayerId, TimerId, Timers};
use crate::event::{Event, KeyState};
use crate::state::{PressedKeySet, ReleaseCodeMap};
use crate::Key;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, SystemTime};

/// Releases later than this after activation never produce a tap
pub const DEFAULT_HOLD_THRESHOLD: Duration = Duration::from_millis(500);

/// How long the first key struck after activation waits for classification
pub const DEFAULT_LOOKAHEAD_DELAY: Duration = Duration::from_millis(50);

/// What holding the activation key does to other keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldAction {
    /// Translate other keys through this map while held.
    ///
    /// Keys missing from the map are swallowed; map a key to itself to let
    /// it through unchanged.
    SwitchKeymap(HashMap<Key, Key>),
    /// Press this modifier before the first other key, release it with
    /// the activation key
    EmitCompanionModifier(Key),
}

/// Parameters of one dual-role key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualRoleConfig {
    pub key: Key,
    pub hold_threshold: Duration,
    pub lookahead_delay: Duration,
    pub hold_action: HoldAction,
}

impl DualRoleConfig {
    pub fn new(key: Key, hold_action: HoldAction) -> Self {
        Self {
            key,
            hold_threshold: DEFAULT_HOLD_THRESHOLD,
            lookahead_delay: DEFAULT_LOOKAHEAD_DELAY,
            hold_action,
        }
    }

    pub fn with_hold_threshold(mut self, threshold: Duration) -> Self {
        self.hold_threshold = threshold;
        self
    }

    pub fn with_lookahead_delay(mut self, delay: Duration) -> Self {
        self.lookahead_delay = delay;
        self
    }
}

/// Externally visible engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Activation key is up
    Idle,
    /// Activation key is down, nothing decided yet
    Active,
    /// A first key is waiting for classification
    ActiveAwait,
    /// The hold action has fired during this activation
    ActiveUsed,
}

/// First key struck after activation, held back until classified
#[derive(Debug, Clone, Copy)]
struct PendingFirst {
    event: Event,
    resolved: bool,
}

#[derive(Debug, Clone)]
struct Activation {
    started: SystemTime,
    used: bool,
    pending: Option<PendingFirst>,
}

/// What the hold action does with one key event
enum HoldEffect {
    Rewrite(Key),
    Swallow,
    Companion(Key),
}

/// Dual-role key layer.
///
/// Pressing the activation key forwards nothing. Releasing it quickly
/// without using it produces an ordinary keystroke of the activation key;
/// pressing other keys while it is down applies the hold action instead.
///
/// The first key struck after activation is held back for the lookahead
/// delay, or until a second new key arrives, whichever comes first; keys
/// already down before activation pass through untouched.
pub struct DualRoleEngine {
    id: LayerId,
    config: DualRoleConfig,
    activation: Option<Activation>,
    // Bumped on every activation; timers carry the value they were armed with
    generation: u64,
    pressed: PressedKeySet,
    release_codes: ReleaseCodeMap,
    next: Box<dyn Layer>,
}

impl DualRoleEngine {
    pub fn new(id: LayerId, config: DualRoleConfig, next: Box<dyn Layer>) -> Self {
        Self {
            id,
            config,
            activation: None,
            generation: 0,
            pressed: PressedKeySet::new(),
            release_codes: ReleaseCodeMap::new(),
            next,
        }
    }

    pub fn config(&self) -> &DualRoleConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        match &self.activation {
            None => EngineState::Idle,
            Some(a) if a.used => EngineState::ActiveUsed,
            Some(Activation {
                pending: Some(PendingFirst { resolved: false, .. }),
                ..
            }) => EngineState::ActiveAwait,
            Some(_) => EngineState::Active,
        }
    }

    /// Keys currently down as seen downstream of this layer
    pub fn pressed_keys(&self) -> &PressedKeySet {
        &self.pressed
    }

    /// Translated keys whose release has not been forwarded yet
    pub fn release_codes(&self) -> &ReleaseCodeMap {
        &self.release_codes
    }

    fn activate(&mut self, time: SystemTime) {
        self.generation += 1;
        self.activation = Some(Activation {
            started: time,
            used: false,
            pending: None,
        });
        log::debug!("{} activated", self.config.key);
    }

    fn deactivate(&mut self, release: Event, timers: &mut Timers) -> io::Result<()> {
        let Some(activation) = self.activation.take() else {
            return Ok(());
        };
        log::debug!("{} deactivated (used: {})", self.config.key, activation.used);

        if activation.used {
            if let HoldAction::EmitCompanionModifier(modifier) = self.config.hold_action {
                self.forward(Event::key(release.time, modifier, KeyState::Up), timers)?;
            }
            return Ok(());
        }

        let held = elapsed(activation.started, release.time);
        if held >= self.config.hold_threshold {
            return Ok(());
        }

        // Down and up go out back-to-back, inside the same flush
        self.forward(Event::key(release.time, self.config.key, KeyState::Down), timers)?;
        self.forward(release, timers)?;

        // A key pressed inside the window that never got classified is
        // replayed as typed, after the tap.
        if let Some(PendingFirst {
            event: first,
            resolved: false,
        }) = activation.pending
        {
            if elapsed(first.time, release.time) < self.config.lookahead_delay {
                self.forward(first, timers)?;
            }
        }
        Ok(())
    }

    fn on_activation_key(
        &mut self,
        event: Event,
        state: KeyState,
        timers: &mut Timers,
    ) -> io::Result<()> {
        match (state, self.activation.is_some()) {
            (KeyState::Down, false) => {
                self.activate(event.time);
                Ok(())
            }
            (KeyState::Up, true) => self.deactivate(event, timers),
            // Auto-repeat of the activation key while active
            (_, true) => Ok(()),
            (_, false) => self.forward(event, timers),
        }
    }

    /// Up/hold of a key whose down was translated
    fn is_release_mapped(&self, key: Key, state: KeyState) -> bool {
        state != KeyState::Down && self.release_codes.contains(key)
    }

    /// Mark the pending first event resolved and hand it back, when `key`
    /// is a second new key arriving while the first is still undecided.
    fn take_unresolved_first(&mut self, key: Key, state: KeyState) -> Option<Event> {
        if self.is_release_mapped(key, state) || self.pressed.contains(key) {
            return None;
        }
        let pending = self.activation.as_mut()?.pending.as_mut()?;
        if pending.resolved {
            return None;
        }
        pending.resolved = true;
        Some(pending.event)
    }

    /// Run one non-activation key event through the state machine
    fn step(&mut self, event: Event, timers: &mut Timers) -> io::Result<()> {
        let Some((key, state)) = event.as_key() else {
            return self.forward(event, timers);
        };

        let released = match state {
            KeyState::Up => self.release_codes.take(key),
            KeyState::Hold => self.release_codes.peek(key),
            KeyState::Down => None,
        };
        if let Some(target) = released {
            return self.forward(event.with_code(target), timers);
        }

        if self.pressed.contains(key) {
            // Down before activation: untouched for the rest of its life
            return self.forward(event, timers);
        }

        let Some(awaiting_first) = self.activation.as_ref().map(|a| a.pending.is_none()) else {
            return self.forward(event, timers);
        };
        if awaiting_first {
            self.stash_first(event, timers);
            return Ok(());
        }

        self.apply_hold_action(event, key, state, timers)
    }

    fn stash_first(&mut self, event: Event, timers: &mut Timers) {
        if let Some(activation) = self.activation.as_mut() {
            activation.pending = Some(PendingFirst {
                event,
                resolved: false,
            });
            timers.schedule(
                event.time + self.config.lookahead_delay,
                TimerId {
                    layer: self.id,
                    token: self.generation,
                },
            );
            log::debug!("holding back {} pending classification", Key(event.code));
        }
    }

    fn apply_hold_action(
        &mut self,
        event: Event,
        key: Key,
        state: KeyState,
        timers: &mut Timers,
    ) -> io::Result<()> {
        let effect = match &self.config.hold_action {
            HoldAction::SwitchKeymap(map) => match map.get(&key) {
                Some(target) => HoldEffect::Rewrite(*target),
                None => HoldEffect::Swallow,
            },
            HoldAction::EmitCompanionModifier(modifier) => HoldEffect::Companion(*modifier),
        };

        match effect {
            HoldEffect::Rewrite(target) => {
                if state == KeyState::Down {
                    self.release_codes.record(key, target);
                    self.mark_used();
                }
                self.forward(event.with_code(target), timers)
            }
            HoldEffect::Swallow => {
                log::trace!("{} {} has no mapping in the held layer", key, state);
                Ok(())
            }
            HoldEffect::Companion(modifier) => {
                if state == KeyState::Down && self.mark_used() {
                    self.forward(Event::key(event.time, modifier, KeyState::Down), timers)?;
                }
                self.forward(event, timers)
            }
        }
    }

    /// Set the "used" flag, returning true if it was not set before
    fn mark_used(&mut self) -> bool {
        match self.activation.as_mut() {
            Some(activation) => !std::mem::replace(&mut activation.used, true),
            None => false,
        }
    }

    /// Send an event downstream, keeping the pressed set in step with it.
    ///
    /// Releases and repeats of keys this layer never pressed are dropped.
    fn forward(&mut self, event: Event, timers: &mut Timers) -> io::Result<()> {
        if let Some((key, state)) = event.as_key() {
            if state != KeyState::Down && !self.pressed.contains(key) {
                log::trace!("dropping {} {}: not pressed downstream", key, state);
                return Ok(());
            }
            self.pressed.update(&event);
            log::debug!("write event:\t{}\t{}", key, state);
        }
        self.next.transform(event, timers)
    }
}

impl Layer for DualRoleEngine {
    fn transform(&mut self, event: Event, timers: &mut Timers) -> io::Result<()> {
        let Some((key, state)) = event.as_key() else {
            return self.forward(event, timers);
        };

        if key == self.config.key {
            return self.on_activation_key(event, state, timers);
        }

        // A second new key decides the first one: replay it before this key.
        if let Some(first) = self.take_unresolved_first(key, state) {
            self.step(first, timers)?;
        }
        self.step(event, timers)
    }

    fn expire(&mut self, timer: TimerId, timers: &mut Timers) -> io::Result<()> {
        if timer.layer != self.id {
            return self.next.expire(timer, timers);
        }
        if timer.token != self.generation {
            log::trace!("ignoring lookahead timer from an earlier activation");
            return Ok(());
        }

        let first = match self.activation.as_mut().and_then(|a| a.pending.as_mut()) {
            Some(pending) if !pending.resolved => {
                pending.resolved = true;
                pending.event
            }
            _ => return Ok(()),
        };
        log::debug!("lookahead elapsed for {}", Key(first.code));
        self.step(first, timers)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.next.flush()
    }
}

/// Time from `earlier` to `later`, zero if the clock went backwards
fn elapsed(earlier: SystemTime, later: SystemTime) -> Duration {
    later.duration_since(earlier).unwrap_or_default()
}
