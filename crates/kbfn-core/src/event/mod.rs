// Kbfn Event Handling
// Event model and key states

mod model;
mod state;

pub use model::{Event, EventKind, EV_KEY, EV_SYN};
pub use state::KeyState;
