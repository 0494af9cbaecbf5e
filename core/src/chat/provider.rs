use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::stream::{collect_fragments, FragmentStream};
use super::{ChatError, GenerationParams, Message};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// A backend that turns a conversation into a lazy sequence of text fragments.
///
/// Implementations only deal with their own wire format. Concatenating the fragments into a
/// full response is done once, by [`collect_fragments`], for every backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Model used when `GenerationParams::model` is unset.
    fn default_model(&self) -> &str;

    /// Issues a streaming generation request.
    ///
    /// Returns once the backend has accepted the request. Fragments are read lazily from the
    /// returned stream; consumers may stop polling at any point.
    async fn open_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError>;

    /// Lists the models the backend can serve. Doubles as a lightweight reachability probe.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError>;

    /// Issues a request and drains its stream into one string.
    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, ChatError> {
        let stream = self.open_stream(messages, params).await?;
        collect_fragments(stream).await
    }
}
