//! Per-participant conversation coordinator
//!
//! Owns the history view, read cursor, pending sends and participant state
//! behind one lock, so no caller ever holds two locks or picks an order.
//! The lock is never held across a simulated wait.

mod history;

pub use history::{Authorship, HistoryEntry, LocalHistory, PendingSends, ReadCursor};

use crate::llm::ChatMessage;
use crate::pacing::{clamp_to_budget, Pacer};
use crate::room::{Identity, RoomMessage};
use crate::state_machine::transition::check_write;
use crate::state_machine::{
    transition, Effect, Event, ParticipantState, TransitionError, TransitionResult,
};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("History shrank: {previous} characters from others already read, snapshot has {current}")]
    HistoryShrank { previous: usize, current: usize },
}

/// History side of the shared state
#[derive(Debug, Default)]
struct HistoryRegion {
    view: LocalHistory,
    cursor: ReadCursor,
    pending: PendingSends,
}

/// State side of the shared state
#[derive(Debug)]
struct StateRegion {
    state: ParticipantState,
    /// Last moment the participant was idle
    idle_since: Instant,
}

#[derive(Debug)]
struct Shared {
    history: HistoryRegion,
    status: StateRegion,
}

/// Conversation state machine for one participant in one room
#[derive(Debug)]
pub struct ConversationManager {
    identity: Identity,
    pacer: Pacer,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<ParticipantState>,
}

impl ConversationManager {
    pub fn new(identity: Identity, pacer: Pacer) -> Self {
        let (state_tx, _) = watch::channel(ParticipantState::Idle);
        Self {
            identity,
            pacer,
            shared: Mutex::new(Shared {
                history: HistoryRegion::default(),
                status: StateRegion {
                    state: ParticipantState::Idle,
                    idle_since: Instant::now(),
                },
            }),
            state_tx,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> ParticipantState {
        *self.state_tx.borrow()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<ParticipantState> {
        self.state_tx.subscribe()
    }

    pub async fn wait_until_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|state| state.is_idle()).await;
    }

    pub async fn read_cursor(&self) -> ReadCursor {
        self.shared.lock().await.history.cursor
    }

    pub async fn pending_sends(&self) -> Vec<String> {
        self.shared.lock().await.history.pending.to_vec()
    }

    // ========================================================================
    // Snapshot ingestion
    // ========================================================================

    /// Ingest a complete room snapshot.
    ///
    /// Returns true exactly when this call read new content and left the
    /// participant in `AwaitingWrite`. Failures are logged and reported as
    /// "no reply".
    pub async fn update_messages(&self, snapshot: &[RoomMessage]) -> bool {
        match self.absorb(snapshot).await {
            Ok(true) => match self.read_until_caught_up().await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!(participant = %self.identity.name, error = %e, "Read cycle aborted");
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                tracing::error!(participant = %self.identity.name, error = %e, "Failed to ingest snapshot");
                false
            }
        }
    }

    /// Apply a snapshot without reading: confirm echoed sends, replace the
    /// history view, and start a read cycle if there is unread content.
    ///
    /// Returns true when this call moved the participant into `Reading`; the
    /// caller must then run [`Self::read_until_caught_up`].
    pub async fn absorb(&self, snapshot: &[RoomMessage]) -> Result<bool, ConversationError> {
        let mut shared = self.shared.lock().await;

        let confirmed = shared.history.pending.remove_echoed(&self.identity, snapshot);
        if confirmed > 0 {
            tracing::debug!(participant = %self.identity.name, confirmed, "Sent messages echoed back");
        }
        let pending_remaining = shared.history.pending.len();
        self.apply(&mut shared, Event::EchoesChecked { pending_remaining })?;

        shared.history.view = LocalHistory::from_snapshot(&self.identity, snapshot);

        if !shared.status.state.is_idle() {
            return Ok(false);
        }

        let unread = shared.history.cursor.unread(&shared.history.view)?;
        if unread == 0 {
            return Ok(false);
        }

        tracing::debug!(participant = %self.identity.name, unread, "Unread messages");
        let result = self.apply(&mut shared, Event::UnreadArrived)?;
        Ok(result.has_effect(&Effect::BeginReading))
    }

    /// Keep "reading" until an iteration finds nothing new.
    ///
    /// Each iteration marks everything currently visible as read, then
    /// sleeps for the reading time outside the lock. Snapshots absorbed
    /// during the sleep extend the cycle instead of racing it.
    pub async fn read_until_caught_up(&self) -> Result<bool, ConversationError> {
        let mut chars_read = 0;
        loop {
            let wait = {
                let mut shared = self.shared.lock().await;
                let Shared { history, status } = &mut *shared;
                let delta = match history.cursor.advance(&history.view) {
                    Ok(delta) => delta,
                    Err(e) => {
                        self.apply(&mut shared, Event::ReadAborted)?;
                        return Err(e);
                    }
                };

                if delta == 0 {
                    tracing::info!(participant = %self.identity.name, chars_read, "Caught up");
                    let result = self.apply(&mut shared, Event::ReadFinished { chars_read })?;
                    return Ok(result.has_effect(&Effect::RequestReply));
                }

                chars_read += delta;
                self.budgeted(self.pacer.config().reading_time(delta), status.idle_since)
            };

            self.pacer.wait(wait, "Simulating reading").await;
        }
    }

    // ========================================================================
    // Replies
    // ========================================================================

    /// Simulate typing `text` and record it as pending.
    ///
    /// The typing delay runs before anything is committed, so a snapshot
    /// absorbed during the delay never sees the text as pending. Returns
    /// whether the text was committed; an empty reply settles the
    /// participant back to `Idle` instead.
    pub async fn write(&self, text: &str, greeting: bool) -> Result<bool, ConversationError> {
        let wait = {
            let mut shared = self.shared.lock().await;
            let state = shared.status.state;
            check_write(state, greeting)?;

            if text.is_empty() {
                if state == ParticipantState::AwaitingWrite {
                    self.apply(
                        &mut shared,
                        Event::WriteCommitted {
                            text: String::new(),
                            greeting,
                        },
                    )?;
                }
                return Ok(false);
            }

            let typing = self.pacer.config().writing_time(text.chars().count());
            self.budgeted(typing, shared.status.idle_since)
        };

        self.pacer.wait(wait, "Simulating writing").await;

        let mut shared = self.shared.lock().await;
        self.apply(
            &mut shared,
            Event::WriteCommitted {
                text: text.to_string(),
                greeting,
            },
        )?;
        Ok(true)
    }

    /// Give up on the current reply attempt
    pub async fn abort(&self) {
        let mut shared = self.shared.lock().await;
        let history_empty = shared.history.view.is_empty();
        if let Err(e) = self.apply(&mut shared, Event::ReplyAbandoned { history_empty }) {
            // Abandoning is accepted from every state
            tracing::error!(participant = %self.identity.name, error = %e, "Failed to abandon reply");
        }
    }

    /// Forget a committed text that could not be delivered
    pub async fn retract(&self, text: &str) {
        let mut shared = self.shared.lock().await;
        if shared.history.pending.remove(text) {
            tracing::warn!(participant = %self.identity.name, "Retracted undelivered message");
        }
        let pending_remaining = shared.history.pending.len();
        if let Err(e) = self.apply(&mut shared, Event::EchoesChecked { pending_remaining }) {
            tracing::error!(participant = %self.identity.name, error = %e, "Failed to settle after retract");
        }
    }

    /// Context for the completion provider: the system prompt followed by
    /// every history entry up to the end of the last completed read.
    pub async fn relevant_history(&self, system_prompt: &str) -> Vec<ChatMessage> {
        let shared = self.shared.lock().await;
        let read = shared.history.cursor.last_read_index;
        std::iter::once(ChatMessage::system(system_prompt))
            .chain(
                shared
                    .history
                    .view
                    .entries()
                    .iter()
                    .take(read)
                    .map(HistoryEntry::to_chat_message),
            )
            .collect()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Clamp a simulated wait to the remaining response budget, measured
    /// fresh from the last idle moment.
    fn budgeted(&self, requested: Duration, idle_since: Instant) -> Duration {
        let config = self.pacer.config();
        let elapsed = self.pacer.simulated_time(idle_since.elapsed());
        let wait = clamp_to_budget(requested, config.max_response, elapsed);
        if wait < requested {
            tracing::debug!(
                participant = %self.identity.name,
                requested_ms = requested.as_millis(),
                clamped_ms = wait.as_millis(),
                "Clamped wait to response budget"
            );
        }
        wait
    }

    /// Run one transition against the shared state and execute the effects
    /// that touch it. Rejected events leave everything unchanged.
    fn apply(&self, shared: &mut Shared, event: Event) -> Result<TransitionResult, TransitionError> {
        let old = shared.status.state;
        let result = transition(old, event)?;
        let new = result.new_state;

        for effect in &result.effects {
            match effect {
                Effect::CommitPending { text } => shared.history.pending.insert(text.clone()),
                Effect::ClearResidual => shared.history.pending.clear(),
                Effect::ReportUnexpectedState { expected, actual } => {
                    tracing::error!(
                        participant = %self.identity.name,
                        expected = %expected,
                        actual = %actual,
                        "Unexpected state"
                    );
                }
                Effect::BeginReading | Effect::RequestReply => {}
            }
        }

        if old != new {
            if old.is_idle() || new.is_idle() {
                shared.status.idle_since = Instant::now();
            }
            tracing::debug!(participant = %self.identity.name, from = %old, to = %new, "Updating state");
            shared.status.state = new;
            self.state_tx.send_replace(new);
        }

        Ok(result)
    }
}
