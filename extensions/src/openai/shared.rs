use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use tracing::{debug, instrument, trace};
use url::Url;

use super::error::OpenAiError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// Configuration for the OpenAI chat-completion API.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub(crate) api_key: SecretString,
    pub(crate) base_url: Url,
    /// Longest silence tolerated while waiting for response data.
    pub(crate) timeout: Duration,
    pub(crate) default_model: String,
}

impl OpenAiConfig {
    /// Fails with [`OpenAiError::InvalidConfiguration`] if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, OpenAiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OpenAiError::InvalidConfiguration(
                "API key cannot be empty".to_string(),
            ));
        }

        let base_url = Url::parse(DEFAULT_OPENAI_BASE_URL).map_err(|e| {
            OpenAiError::InvalidConfiguration(format!("Failed to parse default base URL: {}", e))
        })?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            timeout: Duration::from_secs(60),
            default_model: DEFAULT_OPENAI_MODEL.to_string(),
        })
    }

    pub fn base_url(mut self, url: &str) -> Result<Self, OpenAiError> {
        self.base_url = Url::parse(url).map_err(|e| {
            OpenAiError::InvalidConfiguration(format!("Invalid base URL '{}': {}", url, e))
        })?;
        Ok(self)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Result<Self, OpenAiError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(OpenAiError::InvalidConfiguration(
                "Model name cannot be empty".to_string(),
            ));
        }
        self.default_model = model;
        Ok(self)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SharedOpenAiClient {
    config: OpenAiConfig,
    http_client: Client,
}

impl SharedOpenAiClient {
    #[instrument(name = "shared_openai_client_new", skip(config, client_override))]
    pub(crate) fn new(config: OpenAiConfig, client_override: Option<Client>) -> Result<Self, OpenAiError> {
        let http_client = match client_override {
            Some(client) => {
                debug!("Using provided HTTP client.");
                client
            }
            None => {
                debug!(read_timeout = ?config.timeout, "Building default HTTP client.");
                // No total deadline: a healthy stream may run for minutes.
                Client::builder()
                    .connect_timeout(CONNECT_TIMEOUT)
                    .read_timeout(config.timeout)
                    .build()
                    .map_err(|e| {
                        OpenAiError::InvalidConfiguration(format!(
                            "Failed to build default HTTP client: {}",
                            e
                        ))
                    })?
            }
        };

        // Base URL only, never the key.
        debug!(base_url = %config.base_url, model = %config.default_model, "Shared OpenAI client initialized.");
        Ok(Self { config, http_client })
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub(crate) fn build_url(&self, relative_path: &str) -> Result<Url, OpenAiError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                OpenAiError::InvalidConfiguration(
                    "Base URL cannot be a 'cannot-be-a-base' URL.".to_string(),
                )
            })?
            .pop_if_empty()
            .extend(relative_path.split('/'));

        trace!(built_url = %url, "Built OpenAI API URL (without auth)");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            OpenAiConfig::new("  "),
            Err(OpenAiError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn key_is_redacted_in_debug_output() {
        let config = OpenAiConfig::new("sk-test-123").unwrap();
        assert_eq!(config.api_key.expose_secret(), "sk-test-123");
        assert!(!format!("{:?}", config).contains("sk-test-123"));
    }

    #[test]
    fn urls_extend_versioned_base() {
        let config = OpenAiConfig::new("sk-test").unwrap();
        let shared = SharedOpenAiClient::new(config, Some(Client::new())).unwrap();
        assert_eq!(
            shared.build_url("chat/completions").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        let config = OpenAiConfig::new("sk-test")
            .unwrap()
            .base_url("http://localhost:8000/v1/")
            .unwrap();
        let shared = SharedOpenAiClient::new(config, Some(Client::new())).unwrap();
        assert_eq!(
            shared.build_url("models").unwrap().as_str(),
            "http://localhost:8000/v1/models"
        );
    }
}
