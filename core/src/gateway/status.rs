use serde::Serialize;

use crate::chat::ModelInfo;

use super::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Error,
}

/// Result of a health check against the active provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub status: ConnectionState,
    pub provider: ProviderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmed_up: Option<bool>,
}

impl ConnectionStatus {
    pub fn connected(provider: ProviderId) -> Self {
        Self {
            status: ConnectionState::Connected,
            provider,
            detail: None,
            models: None,
            warmed_up: None,
        }
    }

    pub fn error(provider: ProviderId, detail: impl Into<String>) -> Self {
        Self {
            status: ConnectionState::Error,
            provider,
            detail: Some(detail.into()),
            models: None,
            warmed_up: None,
        }
    }

    #[must_use]
    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = Some(models);
        self
    }

    #[must_use]
    pub fn with_warm_up(mut self, warmed_up: bool) -> Self {
        self.warmed_up = Some(warmed_up);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionState::Connected
    }
}
