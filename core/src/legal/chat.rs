use tracing::instrument;

use crate::{
    chat::{GenerationParams, Message},
    gateway::{Gateway, Generation},
};

use super::LegalError;

pub const DOCUMENT_CHAT_MAX_TOKENS: u32 = 500;

const SYSTEM_PROMPT: &str = "You are a legal AI assistant. You help users understand legal documents, \
explain clauses, and provide legal insights. Always be helpful, accurate, and professional.";

/// Builds the conversation for a question about a single document.
pub fn document_chat_messages(document_text: &str, question: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Document content: {}\n\nUser question: {}",
            document_text, question
        )),
    ]
}

/// Answers `question` using `document_text` as context.
#[instrument(skip(gateway, document_text), fields(document_len = document_text.len()))]
pub async fn ask_about_document(
    gateway: &Gateway,
    document_text: &str,
    question: &str,
) -> Result<Generation, LegalError> {
    if document_text.trim().is_empty() {
        return Err(LegalError::MissingField("Document content"));
    }
    if question.trim().is_empty() {
        return Err(LegalError::MissingField("Question"));
    }

    let messages = document_chat_messages(document_text, question);
    let params = GenerationParams::default().max_tokens(DOCUMENT_CHAT_MAX_TOKENS);
    Ok(gateway.generate(&messages, &params).await?)
}
