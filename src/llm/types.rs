//! Common types for completion requests

use serde::{Deserialize, Serialize};

/// Chat role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry of a chat context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Author display name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Completion request
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// A single user message, optionally followed by a system prompt
    pub fn from_message(message: impl Into<String>, system_prompt: Option<&str>) -> Self {
        let mut messages = vec![ChatMessage::user(message)];
        if let Some(prompt) = system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        Self::new(messages)
    }
}

/// Completion response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    /// Generated text, trimmed and never empty
    pub text: String,
    pub usage: Usage,
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_message_appends_system_prompt() {
        let request = LlmRequest::from_message("Hi!", Some("be nice"));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0], ChatMessage::user("Hi!"));
        assert_eq!(request.messages[1].role, Role::System);

        let request = LlmRequest::from_message("Hi!", None);
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "ok" }));
    }
}
