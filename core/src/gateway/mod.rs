//! Routing of generation requests to the active provider.
//!
//! The gateway owns the active-provider selection and the two backends. Its failure policy is
//! asymmetric:
//!
//! * **Local active.** A transport failure falls back to the hosted provider when a hosted
//!   credential is configured. Without one the call fails with
//!   [`GatewayError::Unavailable`]. Fallback never goes the other way.
//! * **Hosted active.** A failure is not propagated. The caller receives
//!   [`DEGRADED_RESPONSE`] instead.
//!
//! Every [`Generation`] carries an [`Outcome`] so callers can tell these cases apart even
//! though none of them surface as an error.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::chat::{validate_messages, ChatProvider, GenerationParams, Message};

mod error;
mod selection;
mod status;

pub use error::GatewayError;
pub use selection::{ProviderId, ProviderSelection};
pub use status::{ConnectionState, ConnectionStatus};

/// Returned in place of an error when the hosted provider fails.
pub const DEGRADED_RESPONSE: &str =
    "I apologize, but I'm having trouble connecting to the AI service. Please try again later.";

/// Model used for the hosted connectivity probe.
pub const HOSTED_PROBE_MODEL: &str = "gpt-3.5-turbo";

const PROBE_PROMPT: &str = "Hello";
const HOSTED_PROBE_MAX_TOKENS: u32 = 5;
const HOSTED_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const WARM_UP_MAX_TOKENS: u32 = 10;
const WARM_UP_TEMPERATURE: f32 = 0.1;
const WARM_UP_TIMEOUT: Duration = Duration::from_secs(30);

/// How a generation result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The active provider answered.
    Primary,
    /// The local provider failed and the hosted provider answered instead.
    Fallback,
    /// The hosted provider failed; the text is [`DEGRADED_RESPONSE`].
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub text: String,
    /// The provider that produced `text`.
    pub provider: ProviderId,
    pub outcome: Outcome,
}

pub struct Gateway {
    selection: ProviderSelection,
    local: Arc<dyn ChatProvider>,
    hosted: Option<Arc<dyn ChatProvider>>,
}

impl Gateway {
    /// Creates a gateway.
    ///
    /// `hosted` is `None` when no hosted credential is configured; the hosted provider is then
    /// unavailable both as a primary and as a fallback.
    pub fn new(
        selection: ProviderSelection,
        local: Arc<dyn ChatProvider>,
        hosted: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        debug!(
            active = %selection.get(),
            local = local.name(),
            hosted = hosted.as_ref().map(|h| h.name()),
            "Gateway created"
        );
        Self { selection, local, hosted }
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    pub fn current_provider(&self) -> ProviderId {
        self.selection.get()
    }

    pub fn has_hosted_credential(&self) -> bool {
        self.hosted.is_some()
    }

    /// Changes the active provider for all subsequent calls.
    ///
    /// Returns a confirmation message. Unknown names fail with
    /// [`GatewayError::InvalidProvider`] and leave the selection untouched.
    pub fn switch_provider(&self, name: &str) -> Result<String, GatewayError> {
        let provider: ProviderId = name.parse()?;
        Ok(self.switch_to(provider))
    }

    pub fn switch_to(&self, provider: ProviderId) -> String {
        let previous = self.selection.get();
        self.selection.set(provider);
        info!(from = %previous, to = %provider, "Switched AI provider");
        format!("Switched to {} provider", provider)
    }

    /// Generates a complete response for `messages`.
    ///
    /// Blocks until the provider's stream is fully drained. See the module documentation for
    /// the failure policy.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), messages = messages.len()))]
    pub async fn generate(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<Generation, GatewayError> {
        validate_messages(messages)
            .and_then(|_| params.validate())
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let active = self.selection.get();
        debug!(provider = %active, max_tokens = params.max_tokens, "Dispatching generation request");
        match active {
            ProviderId::Local => self.generate_local(messages, params).await,
            ProviderId::Hosted => match &self.hosted {
                Some(hosted) => Ok(Self::generate_hosted(hosted.as_ref(), messages, params, Outcome::Primary).await),
                None => {
                    error!("Hosted provider selected without a configured credential");
                    Err(GatewayError::HostedNotConfigured)
                }
            },
        }
    }

    /// Like [`generate`](Self::generate) but returns only the text.
    pub async fn generate_text(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, GatewayError> {
        self.generate(messages, params).await.map(|g| g.text)
    }

    async fn generate_local(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<Generation, GatewayError> {
        let err = match self.local.complete(messages, params).await {
            Ok(text) => {
                return Ok(Generation {
                    text: text.trim().to_string(),
                    provider: ProviderId::Local,
                    outcome: Outcome::Primary,
                });
            }
            Err(err) => err,
        };

        if !err.is_transport() {
            error!(error = %err, provider = self.local.name(), "Local provider rejected the request");
            return Err(GatewayError::Local(err));
        }

        match &self.hosted {
            Some(hosted) => {
                warn!(
                    error = %err,
                    from = self.local.name(),
                    to = hosted.name(),
                    "Local provider failed, falling back to hosted provider"
                );
                Ok(Self::generate_hosted(hosted.as_ref(), messages, params, Outcome::Fallback).await)
            }
            None => {
                error!(error = %err, "Local provider failed and no hosted credential is configured");
                Err(GatewayError::Unavailable { source: err })
            }
        }
    }

    async fn generate_hosted(
        hosted: &dyn ChatProvider,
        messages: &[Message],
        params: &GenerationParams,
        outcome: Outcome,
    ) -> Generation {
        match hosted.complete(messages, params).await {
            Ok(text) => Generation {
                text,
                provider: ProviderId::Hosted,
                outcome,
            },
            Err(err) => {
                error!(error = %err, provider = hosted.name(), "Hosted provider failed, returning degraded response");
                Generation {
                    text: DEGRADED_RESPONSE.to_string(),
                    provider: ProviderId::Hosted,
                    outcome: Outcome::Degraded,
                }
            }
        }
    }

    /// Checks connectivity of the active provider. Never fails; problems are reported in the
    /// returned status.
    #[instrument(skip(self), fields(provider = %self.selection.get()))]
    pub async fn test_connection(&self) -> ConnectionStatus {
        let status = match self.selection.get() {
            ProviderId::Local => self.probe_local().await,
            ProviderId::Hosted => self.probe_hosted().await,
        };
        if status.is_connected() {
            info!(warmed_up = ?status.warmed_up, "Connection test succeeded");
        } else {
            warn!(detail = ?status.detail, "Connection test failed");
        }
        status
    }

    async fn probe_local(&self) -> ConnectionStatus {
        let models = match self.local.list_models().await {
            Ok(models) => models,
            Err(err) => return ConnectionStatus::error(ProviderId::Local, err.to_string()),
        };
        debug!(count = models.len(), "Local provider reachable, warming up model");

        let warm_up = [Message::user(PROBE_PROMPT)];
        let params = GenerationParams::default()
            .max_tokens(WARM_UP_MAX_TOKENS)
            .temperature(WARM_UP_TEMPERATURE)
            .timeout(WARM_UP_TIMEOUT);
        let warmed_up = match self.local.complete(&warm_up, &params).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Warm-up request failed");
                false
            }
        };

        ConnectionStatus::connected(ProviderId::Local)
            .with_models(models)
            .with_warm_up(warmed_up)
    }

    async fn probe_hosted(&self) -> ConnectionStatus {
        let Some(hosted) = &self.hosted else {
            return ConnectionStatus::error(
                ProviderId::Hosted,
                "Hosted provider credential not configured",
            );
        };

        let probe = [Message::user(PROBE_PROMPT)];
        let params = GenerationParams::default()
            .model(HOSTED_PROBE_MODEL)
            .max_tokens(HOSTED_PROBE_MAX_TOKENS)
            .timeout(HOSTED_PROBE_TIMEOUT);
        match hosted.complete(&probe, &params).await {
            Ok(_) => ConnectionStatus::connected(ProviderId::Hosted),
            Err(err) => ConnectionStatus::error(ProviderId::Hosted, err.to_string()),
        }
    }
}
