//! Trait abstractions for runtime I/O
//!
//! These traits let the pipeline and monitor run against mocks in tests.

use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::room::{OutgoingMessage, RoomApiClient, RoomApiError, Snapshot};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Text completion, as a plain result value
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generated text, or why there is none
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Pull-based source of full room snapshots
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self, room_id: &str) -> Result<Snapshot, RoomApiError>;
}

/// Where outgoing messages are submitted
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Submit a message; the returned payload is informational
    async fn send_message(&self, message: &OutgoingMessage) -> Result<Value, RoomApiError>;
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use an `LlmService` as `CompletionClient`
pub struct LlmCompletion {
    service: Arc<dyn LlmService>,
}

impl LlmCompletion {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CompletionClient for LlmCompletion {
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.service.complete(request).await.map(|response| response.text)
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}

#[async_trait]
impl SnapshotSource for RoomApiClient {
    async fn fetch_snapshot(&self, room_id: &str) -> Result<Snapshot, RoomApiError> {
        RoomApiClient::fetch_snapshot(self, room_id).await
    }
}

#[async_trait]
impl MessageSink for RoomApiClient {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<Value, RoomApiError> {
        RoomApiClient::send_message(self, message).await
    }
}
