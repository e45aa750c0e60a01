//! Provider selection for the configured model

use super::{LlmError, LlmService, LoggingService, OfflineService, OpenAIService, Provider};
use std::sync::Arc;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Configuration for completion providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    /// Model name, routed to a provider by family
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            groq_api_key: std::env::var("GROQ_API_KEY").ok(),
            model: std::env::var("CHATROOM_MODEL").ok(),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Groq => self.groq_api_key.as_deref(),
        }
        .filter(|key| !key.is_empty())
    }
}

/// Build the service for the configured model, wrapped with logging.
///
/// Offline mode never needs an API key.
pub fn build_service(config: &LlmConfig, offline: bool) -> Result<Arc<dyn LlmService>, LlmError> {
    let model = config.model();
    let service: Arc<dyn LlmService> = if offline {
        tracing::info!(model, "Offline mode, completions are stubbed");
        Arc::new(OfflineService::new(model))
    } else {
        let provider = Provider::for_model(model);
        let api_key = config.api_key(provider).ok_or_else(|| {
            LlmError::auth(format!(
                "{} is not set, required for model {model}",
                provider.api_key_var()
            ))
        })?;
        tracing::info!(model, provider = provider.display_name(), "Created completion client");
        Arc::new(OpenAIService::new(api_key.to_string(), model, provider)?)
    };

    Ok(Arc::new(LoggingService::new(service)))
}
