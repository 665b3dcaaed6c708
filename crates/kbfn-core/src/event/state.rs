// Kbfn Key State
// Up, down and auto-repeat values of key events

use std::fmt;

/// Value field of an EV_KEY event; the discriminants are the kernel's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum KeyState {
    Up = 0,
    Down = 1,
    Hold = 2,
}

impl KeyState {
    /// Create a KeyState from the raw evdev value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Up),
            1 => Some(KeyState::Down),
            2 => Some(KeyState::Hold),
            _ => None,
        }
    }

    /// Convert KeyState to its raw evdev value
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::Up => write!(f, "up"),
            KeyState::Down => write!(f, "down"),
            KeyState::Hold => write!(f, "hold"),
        }
    }
}
