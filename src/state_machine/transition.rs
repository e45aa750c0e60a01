//! Pure state transition function
//!
//! Given the same state and event this always produces the same result and
//! performs no I/O. Lock handling, history bookkeeping and delays live in the
//! conversation coordinator.

use super::{Effect, Event, ParticipantState};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: ParticipantState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ParticipantState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// Stay in `state` with no side effects
    pub fn unchanged(state: ParticipantState) -> Self {
        Self::new(state)
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn has_effect(&self, effect: &Effect) -> bool {
        self.effects.contains(effect)
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        state: ParticipantState,
        operation: &'static str,
    },
}

/// Guard for writing: only from `AwaitingWrite`, unless this is a greeting.
///
/// Greetings may also be sent from `Idle`, never during a read cycle or
/// while a send is unconfirmed.
pub fn check_write(state: ParticipantState, greeting: bool) -> Result<(), TransitionError> {
    let allowed = match state {
        ParticipantState::AwaitingWrite => true,
        ParticipantState::Idle => greeting,
        ParticipantState::Reading | ParticipantState::AwaitingReceive => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(TransitionError::InvalidState {
            state,
            operation: "write a message",
        })
    }
}

/// Pure transition function
pub fn transition(
    state: ParticipantState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    use ParticipantState::{AwaitingReceive, AwaitingWrite, Idle, Reading};

    match (state, event) {
        // ============================================================
        // Snapshot ingestion
        // ============================================================
        (Idle, Event::UnreadArrived) => {
            Ok(TransitionResult::new(Reading).with_effect(Effect::BeginReading))
        }

        // Busy states ignore new content; a running read loop picks it up
        (Reading | AwaitingWrite | AwaitingReceive, Event::UnreadArrived) => {
            Ok(TransitionResult::unchanged(state))
        }

        (AwaitingReceive, Event::EchoesChecked { pending_remaining: 0 }) => {
            Ok(TransitionResult::new(Idle).with_effect(Effect::ClearResidual))
        }

        (_, Event::EchoesChecked { .. }) => Ok(TransitionResult::unchanged(state)),

        // ============================================================
        // Read loop
        // ============================================================
        (Reading, Event::ReadFinished { chars_read }) if chars_read > 0 => {
            Ok(TransitionResult::new(AwaitingWrite).with_effect(Effect::RequestReply))
        }

        (Reading, Event::ReadFinished { .. } | Event::ReadAborted) => {
            Ok(TransitionResult::new(Idle))
        }

        (Idle | AwaitingWrite | AwaitingReceive, Event::ReadFinished { .. } | Event::ReadAborted) => {
            Err(TransitionError::InvalidState {
                state,
                operation: "finish reading",
            })
        }

        // ============================================================
        // Replies
        // ============================================================

        // Empty reply: nothing to send
        (AwaitingWrite, Event::WriteCommitted { text, .. }) if text.is_empty() => {
            Ok(TransitionResult::new(Idle))
        }

        (_, Event::WriteCommitted { text, greeting }) => {
            check_write(state, greeting)?;
            Ok(TransitionResult::new(AwaitingReceive).with_effect(Effect::CommitPending { text }))
        }

        (_, Event::ReplyAbandoned { history_empty }) => {
            let result = TransitionResult::new(Idle);
            if state != AwaitingWrite && !history_empty {
                Ok(result.with_effect(Effect::ReportUnexpectedState {
                    expected: AwaitingWrite,
                    actual: state,
                }))
            } else {
                Ok(result)
            }
        }
    }
}
