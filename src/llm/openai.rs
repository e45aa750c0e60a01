//! `OpenAI` and `OpenAI`-compatible chat provider (`OpenAI`, Groq)

use super::types::{ChatMessage, LlmRequest, LlmResponse, Role, Usage};
use super::{LlmError, LlmService};
use crate::room::is_valid_name;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hosts serving the chat completions API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Groq,
}

impl Provider {
    /// Open-weight model families are served by Groq, everything else by `OpenAI`
    pub fn for_model(model: &str) -> Self {
        const GROQ_FAMILIES: &[&str] = &["llama", "distil", "gemma", "mixtral"];
        let model = model.to_ascii_lowercase();
        if GROQ_FAMILIES.iter().any(|family| model.contains(family)) {
            Provider::Groq
        } else {
            Provider::OpenAI
        }
    }

    pub fn chat_url(self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1/chat/completions",
            Provider::Groq => "https://api.groq.com/openai/v1/chat/completions",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Groq => "Groq",
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }
}

/// Chat completions service for one model
pub struct OpenAIService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIService {
    pub fn new(api_key: String, model: impl Into<String>, provider: Provider) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, model, provider.chat_url())
    }

    /// Point at an arbitrary `OpenAI`-compatible endpoint
    pub fn with_base_url(
        api_key: String,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(Self::translate_message).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        }
    }

    fn translate_message(msg: &ChatMessage) -> OpenAIMessage {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        // The API only accepts a restricted alphabet for names; the
        // attribution label in the content carries the author regardless
        let name = msg.name.as_ref().filter(|n| is_valid_name(n)).cloned();

        OpenAIMessage {
            role: role.to_string(),
            content: Some(msg.content.clone()),
            name,
        }
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let text = choice
            .message
            .content
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(LlmError::empty_response());
        }

        let usage = resp.usage.unwrap_or_default();
        Ok(LlmResponse {
            text,
            usage: Usage {
                input_tokens: u64::from(usage.prompt_tokens),
                output_tokens: u64::from(usage.completion_tokens),
            },
        })
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<OpenAIErrorResponse>(&body) {
                return Err(LlmError::from_status(status.as_u16(), &error_resp.error.message));
            }
            return Err(LlmError::unknown(format!("HTTP {status} error: {body}")));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
