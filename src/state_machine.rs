//! Dialog state machine
//!
//! Elm-style split: `transition` is pure and returns effects, the runtime
//! executes them against the session store and lesson catalog.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{DialogContext, SessionRecord};
pub use transition::transition;
