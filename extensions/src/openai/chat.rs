use std::sync::Arc;

use async_trait::async_trait;
use counsel_core::chat::{
    stream::{decode_lines, lines, DONE_SENTINEL},
    ChatError, ChatProvider, Fragment, FragmentStream, GenerationParams, Message, ModelInfo,
};
use futures::TryStreamExt;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace};

use super::error::{map_response_error, OpenAiError};
use super::shared::{OpenAiConfig, SharedOpenAiClient};

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Payload of one `data:` event of a streamed chat completion.
#[derive(Deserialize, Debug)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize, Debug)]
struct ModelEntry {
    id: String,
}

/// Decodes one server-sent-event line.
///
/// Only `data:` lines carry payload. Comments, `event:` lines, role-only deltas and malformed
/// payloads yield nothing.
pub(crate) fn decode_event(line: &str) -> Vec<Fragment> {
    let Some(payload) = line.trim().strip_prefix("data:") else {
        return Vec::new();
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Vec::new();
    }
    if payload == DONE_SENTINEL {
        return vec![Fragment::Done];
    }

    match serde_json::from_str::<ChatCompletionChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty())
            .map(Fragment::Text)
            .into_iter()
            .collect(),
        Err(e) => {
            trace!(error = %e, line = %payload, "Skipping unparseable event payload");
            Vec::new()
        }
    }
}

/// Streaming client for the OpenAI chat-completion API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    shared_client: Arc<SharedOpenAiClient>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        Self::new_with_options(config, None)
    }

    pub fn new_with_options(
        config: OpenAiConfig,
        client_override: Option<Client>,
    ) -> Result<Self, OpenAiError> {
        let shared_client = SharedOpenAiClient::new(config, client_override)?;
        Ok(Self {
            shared_client: Arc::new(shared_client),
        })
    }

    pub fn config(&self) -> &OpenAiConfig {
        self.shared_client.config()
    }

    async fn send_chat(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream, OpenAiError> {
        let config = self.shared_client.config();
        let url = self.shared_client.build_url("chat/completions")?;
        let body = ChatCompletionRequest {
            model: params.model_or(&config.default_model),
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: true,
        };
        debug!(%url, model = body.model, messages = messages.len(), "Sending chat completion request to OpenAI");

        let mut request = self
            .shared_client
            .http_client()
            .post(url)
            .bearer_auth(config.api_key.expose_secret())
            .json(&body);
        if let Some(timeout) = params.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "OpenAI chat completion API returned error status");
            return Err(map_response_error(response).await);
        }

        let bytes = response.bytes_stream().map_err(OpenAiError::Network);
        Ok(decode_lines(lines(bytes), decode_event))
    }

    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, OpenAiError> {
        let config = self.shared_client.config();
        let url = self.shared_client.build_url("models")?;
        debug!(%url, "Requesting OpenAI model list");

        let response = self
            .shared_client
            .http_client()
            .get(url)
            .bearer_auth(config.api_key.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "Failed to list models from OpenAI");
            return Err(map_response_error(response).await);
        }

        let raw_body = response.text().await?;
        let list: ModelList =
            serde_json::from_str(&raw_body).map_err(|e| OpenAiError::ResponseParsing {
                context: "Parsing model list".to_string(),
                source: e,
            })?;

        let models = list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                size: None,
                modified_at: None,
            })
            .collect::<Vec<_>>();
        debug!(count = models.len(), "Parsed OpenAI model list");
        Ok(models)
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.shared_client.config().default_model
    }

    #[instrument(
        name = "openai_open_stream",
        skip(self, messages, params),
        fields(model = params.model_or(self.default_model()), max_tokens = params.max_tokens)
    )]
    async fn open_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError> {
        self.send_chat(messages, params).await.map_err(Into::into)
    }

    #[instrument(name = "openai_list_models", skip(self))]
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        self.fetch_models().await.map_err(Into::into)
    }
}
