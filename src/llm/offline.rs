//! Offline stand-in that never leaves the process

use super::{LlmError, LlmRequest, LlmResponse, LlmService, Usage};
use async_trait::async_trait;

/// Fixed reply returned in offline mode
pub const OFFLINE_REPLY: &str = "Lorem ipsum";

pub struct OfflineService {
    model_id: String,
}

impl OfflineService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl LlmService for OfflineService {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Ok(LlmResponse {
            text: OFFLINE_REPLY.to_string(),
            usage: Usage::default(),
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
