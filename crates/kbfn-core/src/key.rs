// Kbfn Key Type
// Linux input-event-codes.h key identifiers and their symbolic names

use std::fmt;
use std::str::FromStr;

/// Highest code the virtual keyboard advertises; raw codes above it are
/// rejected so nothing is written that the device would silently discard
pub const MAX_KEY_CODE: u16 = 0xff;

/// Represents a single keyboard key code.
///
/// The numeric values match Linux input-event-codes.h definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

impl Key {
    pub const ESC: Key = Key(1);
    pub const BACKSPACE: Key = Key(14);
    pub const TAB: Key = Key(15);
    pub const I: Key = Key(23);
    pub const ENTER: Key = Key(28);
    pub const LEFTCTRL: Key = Key(29);
    pub const A: Key = Key(30);
    pub const J: Key = Key(36);
    pub const K: Key = Key(37);
    pub const L: Key = Key(38);
    pub const LEFTSHIFT: Key = Key(42);
    pub const X: Key = Key(45);
    pub const LEFTALT: Key = Key(56);
    pub const SPACE: Key = Key(57);
    pub const CAPSLOCK: Key = Key(58);
    pub const UP: Key = Key(103);
    pub const LEFT: Key = Key(105);
    pub const RIGHT: Key = Key(106);
    pub const DOWN: Key = Key(108);

    /// Get the raw numeric code value
    pub fn code(self) -> u16 {
        self.0
    }

    /// Get the kernel name of this key, without the `KEY_` prefix
    pub fn name(self) -> &'static str {
        key_name(self.0)
    }
}

impl From<u16> for Key {
    fn from(code: u16) -> Self {
        Key(code)
    }
}

impl From<Key> for u16 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        key_from_name(s).ok_or_else(|| format!("Unknown key: {}", s))
    }
}

// Kernel names (KEY_ prefix stripped), ordered by code.
const KEY_NAMES: &[(&str, u16)] = &[
    ("RESERVED", 0),
    ("ESC", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("MINUS", 12),
    ("EQUAL", 13),
    ("BACKSPACE", 14),
    ("TAB", 15),
    ("Q", 16),
    ("W", 17),
    ("E", 18),
    ("R", 19),
    ("T", 20),
    ("Y", 21),
    ("U", 22),
    ("I", 23),
    ("O", 24),
    ("P", 25),
    ("LEFTBRACE", 26),
    ("RIGHTBRACE", 27),
    ("ENTER", 28),
    ("LEFTCTRL", 29),
    ("A", 30),
    ("S", 31),
    ("D", 32),
    ("F", 33),
    ("G", 34),
    ("H", 35),
    ("J", 36),
    ("K", 37),
    ("L", 38),
    ("SEMICOLON", 39),
    ("APOSTROPHE", 40),
    ("GRAVE", 41),
    ("LEFTSHIFT", 42),
    ("BACKSLASH", 43),
    ("Z", 44),
    ("X", 45),
    ("C", 46),
    ("V", 47),
    ("B", 48),
    ("N", 49),
    ("M", 50),
    ("COMMA", 51),
    ("DOT", 52),
    ("SLASH", 53),
    ("RIGHTSHIFT", 54),
    ("KPASTERISK", 55),
    ("LEFTALT", 56),
    ("SPACE", 57),
    ("CAPSLOCK", 58),
    ("F1", 59),
    ("F2", 60),
    ("F3", 61),
    ("F4", 62),
    ("F5", 63),
    ("F6", 64),
    ("F7", 65),
    ("F8", 66),
    ("F9", 67),
    ("F10", 68),
    ("NUMLOCK", 69),
    ("SCROLLLOCK", 70),
    ("KP7", 71),
    ("KP8", 72),
    ("KP9", 73),
    ("KPMINUS", 74),
    ("KP4", 75),
    ("KP5", 76),
    ("KP6", 77),
    ("KPPLUS", 78),
    ("KP1", 79),
    ("KP2", 80),
    ("KP3", 81),
    ("KP0", 82),
    ("KPDOT", 83),
    ("102ND", 86),
    ("F11", 87),
    ("F12", 88),
    ("KPENTER", 96),
    ("RIGHTCTRL", 97),
    ("KPSLASH", 98),
    ("SYSRQ", 99),
    ("RIGHTALT", 100),
    ("HOME", 102),
    ("UP", 103),
    ("PAGEUP", 104),
    ("LEFT", 105),
    ("RIGHT", 106),
    ("END", 107),
    ("DOWN", 108),
    ("PAGEDOWN", 109),
    ("INSERT", 110),
    ("DELETE", 111),
    ("MUTE", 113),
    ("VOLUMEDOWN", 114),
    ("VOLUMEUP", 115),
    ("POWER", 116),
    ("KPEQUAL", 117),
    ("PAUSE", 119),
    ("KPCOMMA", 121),
    ("LEFTMETA", 125),
    ("RIGHTMETA", 126),
    ("COMPOSE", 127),
    ("MENU", 139),
    ("NEXTSONG", 163),
    ("PLAYPAUSE", 164),
    ("PREVIOUSSONG", 165),
    ("STOPCD", 166),
    ("F13", 183),
    ("F14", 184),
    ("F15", 185),
    ("F16", 186),
    ("F17", 187),
    ("F18", 188),
    ("F19", 189),
    ("F20", 190),
    ("F21", 191),
    ("F22", 192),
    ("F23", 193),
    ("F24", 194),
];

// Spellings people reach for that the kernel does not use.
const KEY_ALIASES: &[(&str, u16)] = &[
    ("ESCAPE", 1),
    ("CTRL", 29),
    ("LEFT_CTRL", 29),
    ("SHIFT", 42),
    ("LEFT_SHIFT", 42),
    ("ALT", 56),
    ("LEFT_ALT", 56),
    ("RIGHT_CTRL", 97),
    ("RIGHT_SHIFT", 54),
    ("RIGHT_ALT", 100),
    ("ALTGR", 100),
    ("META", 125),
    ("SUPER", 125),
    ("LEFT_META", 125),
    ("RIGHT_META", 126),
    ("PAGE_UP", 104),
    ("PAGE_DOWN", 109),
    ("LEFT_BRACE", 26),
    ("RIGHT_BRACE", 27),
    ("PRINT", 99),
];

/// Display name for a key code
pub fn key_name(code: u16) -> &'static str {
    KEY_NAMES
        .binary_search_by_key(&code, |(_, c)| *c)
        .map(|idx| KEY_NAMES[idx].0)
        .unwrap_or("UNKNOWN")
}

/// Try to parse a key name to a key code.
///
/// Accepts kernel names with or without the `KEY_` prefix, a few common
/// aliases, and plain decimal codes up to [`MAX_KEY_CODE`].
pub fn key_from_name(name: &str) -> Option<Key> {
    let upper = name.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    // Single digits are key names ("1" is KEY_1), longer numbers are raw codes.
    if upper.len() > 1 && upper.bytes().all(|b| b.is_ascii_digit()) {
        return upper
            .parse::<u16>()
            .ok()
            .filter(|code| *code <= MAX_KEY_CODE)
            .map(Key);
    }

    let bare = upper.strip_prefix("KEY_").unwrap_or(&upper);
    KEY_NAMES
        .iter()
        .chain(KEY_ALIASES.iter())
        .find(|(n, _)| *n == bare)
        .map(|(_, code)| Key(*code))
}
