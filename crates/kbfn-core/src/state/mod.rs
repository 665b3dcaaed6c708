// Kbfn Layer State
// Bookkeeping owned by a single layer instance

mod pressed;
mod release;

pub use pressed::PressedKeySet;
pub use release::ReleaseCodeMap;
