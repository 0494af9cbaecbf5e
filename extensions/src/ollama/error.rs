use counsel_core::chat::ChatError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Error body returned by Ollama, e.g. `{"error": "model 'llama9' not found"}`.
#[derive(Deserialize, Debug, Clone)]
pub struct OllamaErrorResponse {
    pub error: String,
}

/// Failures inside the Ollama client. Converted into [`ChatError`] at the trait boundary.
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse response body ({context}): {source}")]
    ResponseParsing {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Ollama API error: status={status}, message='{message}'")]
    ApiError { status: StatusCode, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Converts a non-success response into [`OllamaError::ApiError`], preferring the server's own
/// error message over the raw body.
pub(crate) async fn map_response_error(response: reqwest::Response) -> OllamaError {
    let status = response.status();
    debug_assert!(!status.is_success(), "map_response_error called with success status");

    match response.text().await {
        Ok(body_text) => {
            let message = match serde_json::from_str::<OllamaErrorResponse>(&body_text) {
                Ok(parsed) => parsed.error,
                Err(_) if body_text.trim().is_empty() => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
                Err(_) => body_text,
            };
            OllamaError::ApiError { status, message }
        }
        Err(e) => {
            warn!(status = %status, error = %e, "Failed to read Ollama error response body.");
            OllamaError::Network(e)
        }
    }
}

impl From<OllamaError> for ChatError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Network(source) if source.is_timeout() => {
                ChatError::Timeout(source.to_string())
            }
            OllamaError::Network(source) => ChatError::Network(Box::new(source)),
            OllamaError::ResponseParsing { source, .. } => ChatError::Parsing(Box::new(source)),
            OllamaError::ApiError { status, message } => ChatError::Api {
                status: status.as_u16(),
                message,
            },
            OllamaError::InvalidConfiguration(msg) => ChatError::Configuration(msg),
        }
    }
}
