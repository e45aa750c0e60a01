//! Mock implementations for testing
//!
//! These mocks enable pipeline and monitor tests without real I/O.

use super::traits::{CompletionClient, MessageSink, SnapshotSource};
use crate::llm::{LlmError, LlmRequest};
use crate::room::{OutgoingMessage, RoomApiError, RoomMessage, Snapshot};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock Completion Client
// ============================================================================

/// Completion client that returns queued replies
pub struct MockCompletion {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockCompletion {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// In-Memory Room
// ============================================================================

/// A room held in memory: snapshot source and send sink at once.
///
/// Sent messages show up in every later snapshot, like the real API.
pub struct InMemoryRoom {
    room_id: String,
    messages: Mutex<Vec<RoomMessage>>,
    sent: Mutex<Vec<OutgoingMessage>>,
    fail_sends: AtomicBool,
    fail_fetches: AtomicBool,
}

impl InMemoryRoom {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            messages: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
        }
    }

    /// Append a message from someone outside the test
    pub fn post(&self, name: &str, content: &str) {
        let message = RoomMessage::new(self.room_id.clone(), name, content);
        self.push(message);
    }

    fn push(&self, message: RoomMessage) {
        let mut messages = self.messages.lock().unwrap();
        // Strictly increasing, deterministic timestamps
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let offset = i64::try_from(messages.len()).unwrap();
        messages.push(message.at(base + ChronoDuration::seconds(offset)));
    }

    /// Current full view of the room
    pub fn messages(&self) -> Snapshot {
        self.messages.lock().unwrap().clone()
    }

    /// Everything submitted through the sink
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotSource for InMemoryRoom {
    async fn fetch_snapshot(&self, room_id: &str) -> Result<Snapshot, RoomApiError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(RoomApiError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self
            .messages()
            .into_iter()
            .filter(|m| m.room_id == room_id)
            .collect())
    }
}

#[async_trait]
impl MessageSink for InMemoryRoom {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<Value, RoomApiError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(RoomApiError::Status {
                status: 500,
                body: "send rejected".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        let mut echoed = RoomMessage::new(
            message.room_id.clone(),
            message.name.clone(),
            message.content.clone(),
        );
        echoed.email = Some(message.email.clone());
        self.push(echoed);
        Ok(serde_json::json!({ "success": true }))
    }
}
