use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, trace};
use url::Url;

use super::error::OllamaError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "mistral";

/// Configuration for a local Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub(crate) base_url: Url,
    /// Longest silence tolerated while waiting for response data.
    pub(crate) timeout: Duration,
    /// Timeout for lightweight requests such as listing models.
    pub(crate) probe_timeout: Duration,
    pub(crate) default_model: String,
}

impl OllamaConfig {
    pub fn new() -> Result<Self, OllamaError> {
        let base_url = Url::parse(DEFAULT_OLLAMA_BASE_URL).map_err(|e| {
            OllamaError::InvalidConfiguration(format!("Failed to parse default base URL: {}", e))
        })?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(10),
            default_model: DEFAULT_OLLAMA_MODEL.to_string(),
        })
    }

    pub fn base_url(mut self, url: &str) -> Result<Self, OllamaError> {
        self.base_url = Url::parse(url).map_err(|e| {
            OllamaError::InvalidConfiguration(format!("Invalid base URL '{}': {}", url, e))
        })?;
        Ok(self)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Result<Self, OllamaError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(OllamaError::InvalidConfiguration(
                "Model name cannot be empty".to_string(),
            ));
        }
        self.default_model = model;
        Ok(self)
    }
}

/// HTTP client and configuration shared by everything that talks to one Ollama server.
#[derive(Clone, Debug)]
pub(crate) struct SharedOllamaClient {
    config: OllamaConfig,
    http_client: Client,
}

impl SharedOllamaClient {
    #[instrument(name = "shared_ollama_client_new", skip(config, client_override))]
    pub(crate) fn new(config: OllamaConfig, client_override: Option<Client>) -> Result<Self, OllamaError> {
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
                        OllamaError::InvalidConfiguration(format!(
                            "Failed to build default HTTP client: {}",
                            e
                        ))
                    })?
            }
        };

        debug!(base_url = %config.base_url, model = %config.default_model, "Shared Ollama client initialized.");
        Ok(Self { config, http_client })
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Appends `relative_path` (e.g. `api/generate`) to the base URL, keeping any path prefix
    /// the base URL already has.
    pub(crate) fn build_url(&self, relative_path: &str) -> Result<Url, OllamaError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                OllamaError::InvalidConfiguration(
                    "Base URL cannot be a 'cannot-be-a-base' URL.".to_string(),
                )
            })?
            .pop_if_empty()
            .extend(relative_path.split('/'));

        trace!(built_url = %url, "Built Ollama API URL");
        Ok(url)
    }
}
