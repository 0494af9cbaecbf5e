use thiserror::Error;
use std::error::Error as StdError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error: status={status}, message={message}")]
    Api { status: u16, message: String },

    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ChatError {
    /// True when the failure happened while talking to the backend (connection refused,
    /// timeout, error status, broken stream). Such failures are eligible for fallback;
    /// validation, configuration and response-parsing failures are not.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChatError::Network(_)
                | ChatError::Timeout(_)
                | ChatError::Api { .. }
                | ChatError::Streaming(_)
        )
    }
}
