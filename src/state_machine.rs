//! Transcript controller state machine
//!
//! Pure transitions in the Elm Architecture style: the runtime feeds events
//! in and executes the returned effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{ChatContext, ChatState};
pub use transition::{transition, TransitionError, TransitionResult};
