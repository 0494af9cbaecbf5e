use std::sync::Arc;

use async_trait::async_trait;
use counsel_core::chat::{
    stream::{decode_lines, lines, strip_event_prefix, DONE_SENTINEL},
    ChatError, ChatProvider, Fragment, FragmentStream, GenerationParams, Message, ModelInfo,
};
use futures::TryStreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace};

use super::error::{map_response_error, OllamaError};
use super::shared::{OllamaConfig, SharedOllamaClient};

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize, Debug)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// One NDJSON record of a streamed `/api/generate` response.
#[derive(Deserialize, Debug)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize, Debug)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize, Debug)]
struct TagModel {
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    modified_at: Option<String>,
}

/// Renders a conversation as the single prompt string `/api/generate` expects.
///
/// Each message becomes `"<Role>: <content>"` followed by a blank line, and the prompt ends
/// with an open `Assistant: ` turn for the model to complete.
pub fn flatten_prompt(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str(message.role.label());
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Assistant: ");
    prompt
}

/// Decodes one line of a streamed response.
///
/// Blank lines and lines that are not valid records are skipped. A record flagged `done`
/// yields its text (if any) followed by [`Fragment::Done`].
pub(crate) fn decode_line(line: &str) -> Vec<Fragment> {
    let payload = strip_event_prefix(line.trim()).trim();
    if payload.is_empty() {
        return Vec::new();
    }
    if payload == DONE_SENTINEL {
        return vec![Fragment::Done];
    }

    match serde_json::from_str::<GenerateChunk>(payload) {
        Ok(chunk) => {
            let mut fragments = Vec::with_capacity(2);
            if let Some(text) = chunk.response.filter(|t| !t.is_empty()) {
                fragments.push(Fragment::Text(text));
            }
            if chunk.done {
                fragments.push(Fragment::Done);
            }
            fragments
        }
        Err(e) => {
            trace!(error = %e, line = %payload, "Skipping unparseable stream line");
            Vec::new()
        }
    }
}

/// Streaming client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    shared_client: Arc<SharedOllamaClient>,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, OllamaError> {
        Self::new_with_options(config, None)
    }

    pub fn new_with_options(
        config: OllamaConfig,
        client_override: Option<Client>,
    ) -> Result<Self, OllamaError> {
        let shared_client = SharedOllamaClient::new(config, client_override)?;
        Ok(Self {
            shared_client: Arc::new(shared_client),
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        self.shared_client.config()
    }

    async fn send_generate(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream, OllamaError> {
        let config = self.shared_client.config();
        let url = self.shared_client.build_url("api/generate")?;
        let body = GenerateRequest {
            model: params.model_or(&config.default_model),
            prompt: flatten_prompt(messages),
            stream: true,
            options: GenerateOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
            },
        };
        debug!(%url, model = body.model, prompt_len = body.prompt.len(), "Sending generate request to Ollama");

        let mut request = self.shared_client.http_client().post(url).json(&body);
        if let Some(timeout) = params.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "Ollama generate API returned error status");
            return Err(map_response_error(response).await);
        }

        let bytes = response.bytes_stream().map_err(OllamaError::Network);
        Ok(decode_lines(lines(bytes), decode_line))
    }

    async fn fetch_tags(&self) -> Result<Vec<ModelInfo>, OllamaError> {
        let url = self.shared_client.build_url("api/tags")?;
        debug!(%url, "Requesting Ollama model list");

        let response = self
            .shared_client
            .http_client()
            .get(url)
            .timeout(self.shared_client.config().probe_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "Failed to list models from Ollama");
            return Err(map_response_error(response).await);
        }

        let raw_body = response.text().await?;
        let tags: TagsResponse =
            serde_json::from_str(&raw_body).map_err(|e| OllamaError::ResponseParsing {
                context: "Parsing model list".to_string(),
                source: e,
            })?;

        let models = tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name,
                size: m.size,
                modified_at: m.modified_at,
            })
            .collect::<Vec<_>>();
        debug!(count = models.len(), "Parsed Ollama model list");
        Ok(models)
    }
}

#[async_trait]
impl ChatProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.shared_client.config().default_model
    }

    #[instrument(
        name = "ollama_open_stream",
        skip(self, messages, params),
        fields(model = params.model_or(self.default_model()), max_tokens = params.max_tokens)
    )]
    async fn open_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError> {
        self.send_generate(messages, params).await.map_err(Into::into)
    }

    #[instrument(name = "ollama_list_models", skip(self), fields(base_url = %self.shared_client.config().base_url))]
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        self.fetch_tags().await.map_err(Into::into)
    }
}
