//! Hosted chat backend using the OpenAI chat-completion API.
//!
//! Requests are sent with `stream: true`; the response is a server-sent-event stream whose
//! `data:` lines carry incremental `choices[0].delta.content` pieces, terminated by `[DONE]`.

mod chat;
mod error;
mod shared;

pub use chat::OpenAiClient;
pub use error::{OpenAiError, OpenAiErrorDetail, OpenAiErrorResponse};
pub use shared::OpenAiConfig;
