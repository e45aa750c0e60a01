//! Room poller feeding snapshots to participants

use super::participant::{Participant, ReplyOutcome};
use super::traits::{CompletionClient, MessageSink, SnapshotSource};
use crate::pacing::Pacer;
use crate::room::{latest_timestamp, RoomApiError, RoomMessage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default simulated time between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Result of one poll
#[derive(Debug)]
pub struct PollReport {
    /// Messages newer than anything seen before
    pub new_messages: usize,
    /// Read cycles started by this snapshot
    pub replies: Vec<JoinHandle<ReplyOutcome>>,
}

/// Polls one room and hands every snapshot to its participants in order
pub struct SnapshotMonitor<S, C, K>
where
    S: SnapshotSource + 'static,
    C: CompletionClient + 'static,
    K: MessageSink + 'static,
{
    source: Arc<S>,
    room_id: String,
    pacer: Pacer,
    poll_interval: Duration,
    participants: Vec<Arc<Participant<C, K>>>,
    last_seen: Option<DateTime<Utc>>,
}

impl<S, C, K> SnapshotMonitor<S, C, K>
where
    S: SnapshotSource + 'static,
    C: CompletionClient + 'static,
    K: MessageSink + 'static,
{
    pub fn new(source: Arc<S>, room_id: impl Into<String>, pacer: Pacer) -> Self {
        Self {
            source,
            room_id: room_id.into(),
            pacer,
            poll_interval: DEFAULT_POLL_INTERVAL,
            participants: Vec::new(),
            last_seen: None,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn add_participant(&mut self, participant: Arc<Participant<C, K>>) {
        self.participants.push(participant);
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Newest message timestamp seen so far
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Fetch one snapshot and deliver it to every participant.
    ///
    /// A failed fetch is returned without touching any participant.
    pub async fn poll_once(&mut self) -> Result<PollReport, RoomApiError> {
        let snapshot = self.source.fetch_snapshot(&self.room_id).await?;

        let new_messages = self.log_new_messages(&snapshot);
        if let Some(latest) = latest_timestamp(&snapshot) {
            self.last_seen = Some(self.last_seen.map_or(latest, |seen| seen.max(latest)));
        }

        let mut replies = Vec::new();
        for participant in &self.participants {
            if let Some(handle) = participant.on_snapshot(&snapshot).await {
                replies.push(handle);
            }
        }

        Ok(PollReport {
            new_messages,
            replies,
        })
    }

    fn log_new_messages(&self, snapshot: &[RoomMessage]) -> usize {
        let mut count = 0;
        for message in snapshot.iter().filter(|m| self.is_new(m)) {
            count += 1;
            tracing::info!(
                room = %self.room_id,
                author = %message.name,
                timestamp = ?message.timestamp,
                content = %message.content,
                "New message"
            );
        }
        count
    }

    fn is_new(&self, message: &RoomMessage) -> bool {
        match (self.last_seen, message.timestamp) {
            (None, _) => true,
            (Some(seen), Some(ts)) => ts > seen,
            (Some(_), None) => false,
        }
    }

    /// Poll forever. Ends only with the process.
    pub async fn run(mut self) {
        tracing::info!(
            room = %self.room_id,
            participants = self.participants.len(),
            interval_ms = self.poll_interval.as_millis(),
            "Starting room monitor"
        );

        loop {
            let start = Instant::now();
            match self.poll_once().await {
                Ok(report) => {
                    if !report.replies.is_empty() {
                        tracing::debug!(started = report.replies.len(), "Read cycles started");
                    }
                }
                Err(e) => {
                    tracing::warn!(room = %self.room_id, error = %e, "Error fetching messages");
                }
            }
            let update = start.elapsed();

            self.pacer.wait(self.poll_interval, "Polling interval").await;
            tracing::debug!(
                update_ms = update.as_millis(),
                total_ms = start.elapsed().as_millis(),
                "Message update cycle finished"
            );
        }
    }
}
