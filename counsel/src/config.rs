use std::sync::Arc;

use anyhow::{Context, Result};
use counsel_core::{chat::ChatProvider, Gateway, ProviderId, ProviderSelection};
use counsel_extensions::{
    ollama::{OllamaClient, OllamaConfig},
    openai::{OpenAiClient, OpenAiConfig},
};
use tracing::{debug, info};

use crate::cli::{BackendArgs, Cli};

/// Settings resolved from flags, environment and `.env`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderId,
    pub ollama: OllamaConfig,
    /// `None` when no API key is configured.
    pub openai: Option<OpenAiConfig>,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let provider: ProviderId = cli.provider.parse()?;
        Self::from_parts(provider, &cli.backends)
    }

    pub fn from_parts(provider: ProviderId, backends: &BackendArgs) -> Result<Self> {
        let mut ollama = OllamaConfig::new()?;
        if let Some(url) = backends.ollama_url.as_deref() {
            ollama = ollama.base_url(url).context("OLLAMA_BASE_URL")?;
        }
        if let Some(model) = backends.ollama_model.as_deref() {
            ollama = ollama.default_model(model).context("OLLAMA_MODEL")?;
        }

        let openai = match backends.openai_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                let mut openai = OpenAiConfig::new(key)?;
                if let Some(url) = backends.openai_url.as_deref() {
                    openai = openai.base_url(url).context("OPENAI_BASE_URL")?;
                }
                if let Some(model) = backends.openai_model.as_deref() {
                    openai = openai.default_model(model).context("OPENAI_MODEL")?;
                }
                Some(openai)
            }
            _ => {
                debug!("No OpenAI API key configured; hosted provider disabled");
                None
            }
        };

        Ok(Self {
            provider,
            ollama,
            openai,
        })
    }

    pub fn build_gateway(&self) -> Result<Gateway> {
        let local: Arc<dyn ChatProvider> = Arc::new(OllamaClient::new(self.ollama.clone())?);
        let hosted = match &self.openai {
            Some(config) => {
                Some(Arc::new(OpenAiClient::new(config.clone())?) as Arc<dyn ChatProvider>)
            }
            None => None,
        };

        info!(
            provider = %self.provider,
            hosted_configured = hosted.is_some(),
            "AI gateway configured"
        );
        Ok(Gateway::new(ProviderSelection::new(self.provider), local, hosted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends() -> BackendArgs {
        BackendArgs {
            ollama_url: None,
            ollama_model: None,
            openai_api_key: None,
            openai_url: None,
            openai_model: None,
        }
    }

    #[test]
    fn blank_key_means_no_hosted_provider() {
        let mut args = backends();
        args.openai_api_key = Some("   ".to_string());
        let config = AppConfig::from_parts(ProviderId::Local, &args).unwrap();
        assert!(config.openai.is_none());
        assert!(!config.build_gateway().unwrap().has_hosted_credential());
    }

    #[test]
    fn key_enables_hosted_provider() {
        let mut args = backends();
        args.openai_api_key = Some("sk-test".to_string());
        args.ollama_url = Some("http://gpu-box:11434".to_string());
        let gateway = AppConfig::from_parts(ProviderId::Hosted, &args)
            .unwrap()
            .build_gateway()
            .unwrap();
        assert!(gateway.has_hosted_credential());
        assert_eq!(gateway.current_provider(), ProviderId::Hosted);
    }

    #[test]
    fn invalid_url_is_reported() {
        let mut args = backends();
        args.ollama_url = Some("not a url".to_string());
        let err = AppConfig::from_parts(ProviderId::Local, &args).unwrap_err();
        assert!(format!("{err:#}").contains("OLLAMA_BASE_URL"));
    }
}
