//! Legal use-cases built on top of the [`Gateway`](crate::gateway::Gateway).
//!
//! Each use-case builds a conversation from a fixed template and its own inputs, then hands it
//! to the gateway with use-case specific generation settings.

use std::path::PathBuf;

use thiserror::Error;

use crate::gateway::GatewayError;

mod chat;
mod document;
pub mod nda;
pub mod redline;

pub use chat::{ask_about_document, document_chat_messages, DOCUMENT_CHAT_MAX_TOKENS};
pub use document::DocumentStats;
pub use nda::{generate_nda, NdaDraft, NdaParameters, NdaTemplate};
pub use redline::{
    analyze_clause, analyze_document, analyze_document_with_progress, clause_type, extract_clauses, AnalysisEvent, AnalyzedClause,
    ClauseAnalysis, ClauseType, RedlineReport, RedlineSummary, RiskLevel,
};

#[derive(Debug, Error)]
pub enum LegalError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Failed to read template '{path}': {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
