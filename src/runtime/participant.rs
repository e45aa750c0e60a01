//! Reply pipeline for one participant

use super::traits::{CompletionClient, MessageSink};
use crate::conversation::ConversationManager;
use crate::llm::LlmRequest;
use crate::prompt::clean_reply;
use crate::room::{Identity, OutgoingMessage, RoomMessage};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Sent on startup when greeting is enabled
pub const GREETING: &str = "hello everyone!";

/// Readiness check sent to the completion provider on startup
pub const WARM_UP_MESSAGE: &str = "Hi!";

/// What a reply attempt ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Nothing new was read, so no reply was due
    NotTriggered,
    /// The completion produced nothing usable
    Abandoned,
    /// The write was refused in the current state
    Rejected,
    /// Submitted to the room; confirmed once it is echoed back
    Sent(String),
    /// The room refused the message and it was retracted
    SendFailed(String),
}

/// A conversation participant: the coordinator plus its collaborators
pub struct Participant<C, K>
where
    C: CompletionClient + 'static,
    K: MessageSink + 'static,
{
    conversation: Arc<ConversationManager>,
    completion: Arc<C>,
    sink: Arc<K>,
    email: String,
    system_prompt: String,
}

impl<C, K> Participant<C, K>
where
    C: CompletionClient + 'static,
    K: MessageSink + 'static,
{
    pub fn new(
        conversation: Arc<ConversationManager>,
        completion: Arc<C>,
        sink: Arc<K>,
        email: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            conversation,
            completion,
            sink,
            email: email.into(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn identity(&self) -> &Identity {
        self.conversation.identity()
    }

    pub fn conversation(&self) -> &Arc<ConversationManager> {
        &self.conversation
    }

    fn span(&self) -> tracing::Span {
        let identity = self.identity();
        tracing::info_span!("participant", name = %identity.name, room = %identity.room_id)
    }

    /// Apply a snapshot without blocking on the read simulation.
    ///
    /// When the snapshot starts a new read cycle, the read loop and the reply
    /// run on their own task and its handle is returned. Snapshots applied
    /// while that task is running extend its read instead of starting
    /// another one.
    pub async fn on_snapshot(self: &Arc<Self>, snapshot: &[RoomMessage]) -> Option<JoinHandle<ReplyOutcome>> {
        let span = self.span();
        match self.conversation.absorb(snapshot).instrument(span.clone()).await {
            Ok(true) => {
                let this = Arc::clone(self);
                Some(tokio::spawn(
                    async move { this.read_and_reply().await }.instrument(span),
                ))
            }
            Ok(false) => None,
            Err(e) => {
                span.in_scope(|| tracing::error!(error = %e, "Failed to ingest snapshot"));
                None
            }
        }
    }

    /// Ingest a snapshot and, if that finished a read, reply.
    ///
    /// Waits for the whole read simulation and reply.
    pub async fn update_messages(&self, snapshot: &[RoomMessage]) -> ReplyOutcome {
        async {
            if self.conversation.update_messages(snapshot).await {
                self.reply().await
            } else {
                ReplyOutcome::NotTriggered
            }
        }
        .instrument(self.span())
        .await
    }

    async fn read_and_reply(&self) -> ReplyOutcome {
        match self.conversation.read_until_caught_up().await {
            Ok(true) => self.reply().await,
            Ok(false) => ReplyOutcome::NotTriggered,
            Err(e) => {
                tracing::error!(error = %e, "Read cycle aborted");
                ReplyOutcome::NotTriggered
            }
        }
    }

    /// Produce and send a reply to everything read so far
    pub async fn reply(&self) -> ReplyOutcome {
        let context = self.conversation.relevant_history(&self.system_prompt).await;
        let start = std::time::Instant::now();
        let result = self.completion.complete(&LlmRequest::new(context)).await;
        tracing::info!(duration_ms = start.elapsed().as_millis(), "Completion finished");

        let text = match result {
            Ok(text) => clean_reply(&text),
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind, "No reply from completion provider");
                String::new()
            }
        };

        if text.is_empty() {
            self.conversation.abort().await;
            return ReplyOutcome::Abandoned;
        }

        self.write_and_send(text, false).await
    }

    /// Send the fixed greeting without having read anything first
    pub async fn greet(&self) -> ReplyOutcome {
        self.write_and_send(GREETING.to_string(), true)
            .instrument(self.span())
            .await
    }

    /// Ask for a reply to a fixed opener under this participant's prompt.
    ///
    /// Only logs the result; a failure here never stops the participant.
    pub async fn warm_up(&self) -> Option<String> {
        let request = LlmRequest::from_message(WARM_UP_MESSAGE, Some(&self.system_prompt));
        let span = self.span();
        match self.completion.complete(&request).instrument(span.clone()).await {
            Ok(greeting) => {
                span.in_scope(|| {
                    tracing::info!(
                        model = self.completion.model_id(),
                        greeting = %greeting,
                        "Participant connected and ready"
                    );
                });
                Some(greeting)
            }
            Err(e) => {
                span.in_scope(|| tracing::warn!(error = %e, "Warm-up completion failed"));
                None
            }
        }
    }

    async fn write_and_send(&self, text: String, greeting: bool) -> ReplyOutcome {
        match self.conversation.write(&text, greeting).await {
            Ok(true) => {}
            Ok(false) => return ReplyOutcome::Abandoned,
            Err(e) => {
                tracing::warn!(error = %e, "Write refused");
                return ReplyOutcome::Rejected;
            }
        }

        tracing::info!(message = %text.chars().take(100).collect::<String>(), "Sending message");
        let message = OutgoingMessage::new(self.identity(), self.email.clone(), text.clone());
        match self.sink.send_message(&message).await {
            Ok(response) => {
                tracing::debug!(%response, "Message accepted");
                ReplyOutcome::Sent(text)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send message");
                self.conversation.retract(&text).await;
                ReplyOutcome::SendFailed(text)
            }
        }
    }
}
