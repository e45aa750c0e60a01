//! Participant state machine
//!
//! Pure transitions over the four participant states. The conversation
//! coordinator owns the mutable state and applies the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::ParticipantState;
pub use transition::{transition, TransitionError, TransitionResult};
