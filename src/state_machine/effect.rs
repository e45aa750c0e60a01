//! Effects produced by state transitions

use super::ParticipantState;

/// Effects the coordinator executes after a transition, inside the same
/// critical section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the read loop
    BeginReading,

    /// Tell the caller a reply should now be attempted
    RequestReply,

    /// Record the text as sent-but-not-echoed
    CommitPending { text: String },

    /// Reset the read-cycle bookkeeping after an echo confirmed the send
    ClearResidual,

    /// The transition was allowed but the prior state was not the expected one
    ReportUnexpectedState {
        expected: ParticipantState,
        actual: ParticipantState,
    },
}
