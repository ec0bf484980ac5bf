//! The booth session: capture/composite/review state machine.
//!
//! The session owns everything a running booth remembers between events:
//! the current phase, the filter/background selection, the photo counter,
//! and the shot under review. It performs no IO and schedules nothing; the
//! event loop feeds it ticks and commands and executes the effects it asks
//! for, so every transition is directly testable.

mod selection;
mod state;
mod view;

pub use selection::Selection;
pub use state::{
    CountdownTick, Phase, ReviewShot, SavedPhoto, SelectionEffect, Session, COUNTDOWN_START,
};
pub use view::{BoothView, NullView};
