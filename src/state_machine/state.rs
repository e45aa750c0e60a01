//! Participant state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exactly one of these at a time; only `transition` produces a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantState {
    /// Caught up, nothing pending
    #[default]
    Idle,
    /// Simulating reading of unread messages from others
    Reading,
    /// Caught up after reading, a reply may be produced
    AwaitingWrite,
    /// Reply submitted, waiting for it to be echoed back in a snapshot
    AwaitingReceive,
}

impl ParticipantState {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantState::Idle => "idle",
            ParticipantState::Reading => "reading",
            ParticipantState::AwaitingWrite => "awaiting_write",
            ParticipantState::AwaitingReceive => "awaiting_receive",
        }
    }

    pub fn is_idle(self) -> bool {
        self == ParticipantState::Idle
    }
}

impl fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
