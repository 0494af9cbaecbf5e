use counsel_core::chat::ChatError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Error envelope returned by the API: `{"error": {"message", "type", "code"}}`.
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// A string such as `"invalid_api_key"`, occasionally a number, often null.
    #[serde(default)]
    pub code: Option<Value>,
}

#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse response body ({context}): {source}")]
    ResponseParsing {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("OpenAI API error: status={status}, message='{body_text}'")]
    ApiError {
        status: StatusCode,
        detail: Option<OpenAiErrorDetail>,
        body_text: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub(crate) async fn map_response_error(response: reqwest::Response) -> OpenAiError {
    let status = response.status();
    debug_assert!(!status.is_success(), "map_response_error called with success status");

    match response.text().await {
        Ok(body_text) => match serde_json::from_str::<OpenAiErrorResponse>(&body_text) {
            Ok(parsed) => OpenAiError::ApiError {
                status,
                detail: Some(parsed.error),
                body_text,
            },
            Err(parse_err) => {
                warn!(
                    status = %status,
                    error = %parse_err,
                    "Failed to parse OpenAI error response JSON, returning raw body."
                );
                OpenAiError::ApiError {
                    status,
                    detail: None,
                    body_text,
                }
            }
        },
        Err(e) => {
            warn!(status = %status, error = %e, "Failed to read OpenAI error response body text.");
            OpenAiError::Network(e)
        }
    }
}

fn describe(detail: &OpenAiErrorDetail) -> String {
    let code = match &detail.code {
        Some(Value::String(code)) => Some(code.clone()),
        Some(Value::Number(code)) => Some(code.to_string()),
        _ => None,
    };
    match (detail.kind.as_deref(), code) {
        (Some(kind), Some(code)) => format!("{} (type: {}, code: {})", detail.message, kind, code),
        (Some(kind), None) => format!("{} (type: {})", detail.message, kind),
        (None, Some(code)) => format!("{} (code: {})", detail.message, code),
        (None, None) => detail.message.clone(),
    }
}

impl From<OpenAiError> for ChatError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::Network(source) if source.is_timeout() => {
                ChatError::Timeout(source.to_string())
            }
            OpenAiError::Network(source) => ChatError::Network(Box::new(source)),
            OpenAiError::ResponseParsing { source, .. } => ChatError::Parsing(Box::new(source)),
            OpenAiError::ApiError {
                status,
                detail,
                body_text,
            } => ChatError::Api {
                status: status.as_u16(),
                message: detail.as_ref().map(describe).unwrap_or(body_text),
            },
            OpenAiError::InvalidConfiguration(msg) => ChatError::Configuration(msg),
        }
    }
}
