
// Conversation types shared by every provider.
//
// A conversation is an ordered list of `Message`s: an optional system message first, then
// alternating user/assistant turns. Providers receive the list unchanged and decide how to put
// it on the wire (the local backend flattens it into a single prompt, the hosted backend sends
// it verbatim).

use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

mod error;
mod provider;
pub mod stream;

pub use error::ChatError;
pub use provider::{ChatProvider, ModelInfo};
pub use stream::{collect_fragments, Fragment, FragmentStream};

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system<T: Into<String>>(content: T) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
    pub fn user<T: Into<String>>(content: T) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Label used when a conversation is rendered as plain text.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Generation settings for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model override. Each provider falls back to its own default model when unset.
    #[serde(default)]
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Overrides the provider's request timeout. Used by short health probes.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: None,
        }
    }
}

impl GenerationParams {
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The requested model, or `default` when no override is set.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.max_tokens == 0 {
            return Err(ChatError::InvalidRequest(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ChatError::InvalidRequest(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Checks that a conversation is non-empty and contains at least one user turn.
pub fn validate_messages(messages: &[Message]) -> Result<(), ChatError> {
    if messages.is_empty() {
        return Err(ChatError::InvalidRequest(
            "conversation must contain at least one message".to_string(),
        ));
    }
    if !messages.iter().any(|m| m.role == Role::User) {
        return Err(ChatError::InvalidRequest(
            "conversation must contain at least one user message".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_general_purpose_settings() {
        let params = GenerationParams::default();
        assert_eq!(params.max_tokens, 1000);
        assert!((params.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(params.model, None);
        assert_eq!(params.model_or("mistral"), "mistral");
        assert_eq!(params.model("llama3").model_or("mistral"), "llama3");
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(GenerationParams::default().max_tokens(0).validate().is_err());
        assert!(GenerationParams::default().temperature(1.5).validate().is_err());
        assert!(GenerationParams::default().temperature(f32::NAN).validate().is_err());
        assert!(GenerationParams::default().temperature(0.0).validate().is_ok());
        assert!(GenerationParams::default().temperature(1.0).validate().is_ok());
    }

    #[test]
    fn conversation_needs_a_user_turn() {
        assert!(validate_messages(&[]).is_err());
        assert!(validate_messages(&[Message::system("Be brief.")]).is_err());
        assert!(validate_messages(&[Message::system("Be brief."), Message::user("Hi")]).is_ok());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
        assert_eq!(Role::System.to_string(), "System");
    }
}
