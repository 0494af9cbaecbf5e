//! Local completion backend served by [Ollama](https://ollama.com).
//!
//! Conversations are flattened into a single prompt and sent to `/api/generate` with streaming
//! enabled. The response is newline-delimited JSON, one record per generated fragment.

mod chat;
mod error;
mod shared;

pub use chat::{flatten_prompt, OllamaClient};
pub use error::{OllamaError, OllamaErrorResponse};
pub use shared::OllamaConfig;
