//! Participant runtime
//!
//! Wires the conversation coordinator to the outside world: the reply
//! pipeline that turns a finished read into a sent message, and the monitor
//! that polls the room and feeds every participant its snapshots.

mod monitor;
mod participant;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use monitor::{PollReport, SnapshotMonitor, DEFAULT_POLL_INTERVAL};
pub use participant::{Participant, ReplyOutcome, GREETING, WARM_UP_MESSAGE};
pub use traits::*;

use crate::room::RoomApiClient;

/// Participant wired to the production completion provider and room API
pub type ProductionParticipant = Participant<LlmCompletion, RoomApiClient>;

/// Monitor wired to the production room API
pub type ProductionMonitor = SnapshotMonitor<RoomApiClient, LlmCompletion, RoomApiClient>;

