use std::{
    fmt,
    str::FromStr,
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};

use super::GatewayError;

/// The backends a gateway can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Local streaming completion server.
    Local,
    /// Hosted chat-completion API.
    Hosted,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Local => "local",
            ProviderId::Hosted => "hosted",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "mistral" | "ollama" => Ok(ProviderId::Local),
            "hosted" | "openai" => Ok(ProviderId::Hosted),
            _ => Err(GatewayError::InvalidProvider(s.to_string())),
        }
    }
}

/// The active-provider selection.
///
/// Cloning yields another handle to the same selection. Writes are last-writer-wins; a
/// generation call reads the selection once, when it starts.
#[derive(Debug, Clone)]
pub struct ProviderSelection {
    active: Arc<RwLock<ProviderId>>,
}

impl ProviderSelection {
    pub fn new(initial: ProviderId) -> Self {
        Self {
            active: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn get(&self) -> ProviderId {
        // A poisoned lock still holds a valid `Copy` value.
        *self.active.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, provider: ProviderId) {
        let mut active = self.active.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *active = provider;
    }
}

impl Default for ProviderSelection {
    fn default() -> Self {
        Self::new(ProviderId::Local)
    }
}
