use thiserror::Error;

use crate::chat::ChatError;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid provider '{0}': expected 'local' or 'hosted'")]
    InvalidProvider(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The local provider failed and there is nothing to fall back to. Retrying will not help
    /// until either prerequisite is fixed.
    #[error(
        "Local provider is not available ({source}) and no hosted provider credential is configured. \
         Start the local completion server or configure a hosted API key."
    )]
    Unavailable {
        #[source]
        source: ChatError,
    },

    #[error("Hosted provider is selected but no hosted credential is configured")]
    HostedNotConfigured,

    #[error("Local provider error: {0}")]
    Local(#[source] ChatError),
}

impl GatewayError {
    /// True for failures caused by missing configuration rather than a transient fault.
    pub fn is_availability(&self) -> bool {
        matches!(self, GatewayError::Unavailable { .. } | GatewayError::HostedNotConfigured)
    }
}
