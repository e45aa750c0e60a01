//! Text-completion providers
//!
//! Provides a common interface over the OpenAI-compatible chat endpoints the
//! participants talk to, plus an offline stand-in.

mod error;
mod offline;
mod openai;
mod registry;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use offline::{OfflineService, OFFLINE_REPLY};
pub use openai::{OpenAIService, Provider};
pub use registry::{build_service, LlmConfig, DEFAULT_MODEL};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        tracing::debug!(
            model = %self.model_id,
            messages = request.messages.len(),
            last = request.messages.last().map(|m| preview(&m.content)).unwrap_or_default(),
            "LLM request"
        );
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    reply = %preview(&response.text),
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// First 100 characters, for log lines
fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}
