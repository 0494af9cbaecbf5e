//! Clause extraction and risk review.
//!
//! A document is split into clauses with a set of legal section patterns, each clause is sent
//! through the gateway for a red / amber / green classification, and the results are rolled up
//! into a [`RedlineSummary`].

use std::{collections::HashSet, fmt};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    chat::{GenerationParams, Message},
    gateway::Gateway,
};

use super::LegalError;

pub const ANALYSIS_MAX_TOKENS: u32 = 500;
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

const MIN_SENTENCE_LEN: usize = 20;

const REVIEWER_PROMPT: &str = r#"You are a legal reviewer specializing in clause analysis. Analyze the following clause and classify it:
- Red: Unfair, risky, or problematic clauses
- Amber: Ambiguous, unusual, or clauses that need review
- Green: Standard, fair, and acceptable clauses

Then provide:
1. Risk level (red/amber/green)
2. Brief explanation of the classification
3. Suggested improvements if red or amber
4. Confidence score (0-100)

Format your response as JSON:
{
    "risk_level": "red|amber|green",
    "explanation": "brief explanation",
    "suggestions": "improvement suggestions",
    "confidence": 85
}"#;

const MANUAL_REVIEW: &str = "Manual review recommended";

static CLAUSE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+\.\s*[A-Z][^.]*\.",
        r"[A-Z][^.]*\.",
        r"WHEREAS[^.]*\.",
        r"PROVIDED[^.]*\.",
        r"FURTHER[^.]*\.",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static CLAUSE_KEYWORDS: Lazy<Vec<(ClauseType, Regex)>> = Lazy::new(|| {
    [
        (ClauseType::Confidentiality, r"(?i)\b(?:confidential|secret|proprietary)"),
        (ClauseType::Indemnity, r"(?i)\b(?:indemnify|indemnification|liability)"),
        (
            ClauseType::IntellectualProperty,
            r"(?i)\bintellectual property|\bip\b|\bpatent|\bcopyright",
        ),
        (ClauseType::Termination, r"(?i)\b(?:terminate|termination)|\bend\b"),
        (ClauseType::GoverningLaw, r"(?i)\b(?:governing law|jurisdiction|venue)"),
    ]
    .into_iter()
    .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (kind, re)))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    Confidentiality,
    Indemnity,
    #[serde(rename = "ip")]
    IntellectualProperty,
    Termination,
    GoverningLaw,
    General,
}

impl ClauseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseType::Confidentiality => "confidentiality",
            ClauseType::Indemnity => "indemnity",
            ClauseType::IntellectualProperty => "ip",
            ClauseType::Termination => "termination",
            ClauseType::GoverningLaw => "governing_law",
            ClauseType::General => "general",
        }
    }
}

impl fmt::Display for ClauseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Red,
    Amber,
    Green,
}

impl RiskLevel {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Some(RiskLevel::Red),
            "amber" | "yellow" => Some(RiskLevel::Amber),
            "green" => Some(RiskLevel::Green),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Red => "red",
            RiskLevel::Amber => "amber",
            RiskLevel::Green => "green",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClauseAnalysis {
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub suggestions: String,
    /// 0 to 100.
    pub confidence: u8,
}

impl ClauseAnalysis {
    fn unparseable() -> Self {
        Self {
            risk_level: RiskLevel::Amber,
            explanation: "Unable to parse AI response".to_string(),
            suggestions: MANUAL_REVIEW.to_string(),
            confidence: 50,
        }
    }

    fn failed(error: &dyn fmt::Display) -> Self {
        Self {
            risk_level: RiskLevel::Amber,
            explanation: format!("Analysis failed: {}", error),
            suggestions: MANUAL_REVIEW.to_string(),
            confidence: 0,
        }
    }

    /// Parses a reviewer reply. Accepts either the whole reply as JSON or the outermost
    /// `{...}` slice of it.
    pub fn parse(reply: &str) -> Option<Self> {
        let reply = reply.trim();
        Self::parse_json(reply).or_else(|| {
            let start = reply.find('{')?;
            let end = reply.rfind('}')?;
            (start < end)
                .then(|| Self::parse_json(&reply[start..=end]))
                .flatten()
        })
    }

    fn parse_json(json: &str) -> Option<Self> {
        let raw: RawAnalysis = serde_json::from_str(json).ok()?;
        Some(Self {
            risk_level: RiskLevel::parse(&raw.risk_level)?,
            explanation: value_text(&raw.explanation),
            suggestions: value_text(&raw.suggestions),
            confidence: confidence(&raw.confidence),
        })
    }
}

#[derive(Deserialize)]
struct RawAnalysis {
    risk_level: String,
    #[serde(default)]
    explanation: Value,
    #[serde(default)]
    suggestions: Value,
    #[serde(default)]
    confidence: Value,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn confidence(value: &Value) -> u8 {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    score.map_or(50, |s| s.round().clamp(0.0, 100.0) as u8)
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedClause {
    /// Position of the clause among the extracted clauses.
    pub clause_id: usize,
    pub clause_text: String,
    pub clause_type: ClauseType,
    #[serde(flatten)]
    pub analysis: ClauseAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedlineSummary {
    pub total_clauses: usize,
    pub red: usize,
    pub amber: usize,
    pub green: usize,
    /// Share of red and amber clauses, in percent with one decimal.
    pub risk_percentage: f64,
}

impl RedlineSummary {
    pub fn of(clauses: &[AnalyzedClause]) -> Self {
        let count = |level| {
            clauses
                .iter()
                .filter(|c| c.analysis.risk_level == level)
                .count()
        };
        let (red, amber, green) = (
            count(RiskLevel::Red),
            count(RiskLevel::Amber),
            count(RiskLevel::Green),
        );
        let risk_percentage = if clauses.is_empty() {
            0.0
        } else {
            let share = (red + amber) as f64 / clauses.len() as f64 * 100.0;
            (share * 10.0).round() / 10.0
        };
        Self {
            total_clauses: clauses.len(),
            red,
            amber,
            green,
            risk_percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedlineReport {
    pub clauses: Vec<AnalyzedClause>,
    pub summary: RedlineSummary,
}

/// Progress notifications emitted while a document is analysed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    Started,
    ClausesFound { count: usize },
    /// `index` is 1-based.
    AnalyzingClause { index: usize, total: usize },
    Summarizing,
    Completed { total_clauses: usize },
}

impl AnalysisEvent {
    pub fn status(&self) -> &'static str {
        match self {
            AnalysisEvent::Started => "started",
            AnalysisEvent::Completed { .. } => "completed",
            _ => "progress",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AnalysisEvent::Started => "Starting document analysis...".to_string(),
            AnalysisEvent::ClausesFound { count } => format!("Found {} clauses to analyze...", count),
            AnalysisEvent::AnalyzingClause { index, total } => {
                format!("Analyzing clause {}/{}...", index, total)
            }
            AnalysisEvent::Summarizing => "Generating analysis summary...".to_string(),
            AnalysisEvent::Completed { total_clauses } => {
                format!("Analysis complete: {} clauses reviewed", total_clauses)
            }
        }
    }
}

/// Splits `text` into candidate clauses.
///
/// Matches from every pattern are collected in pattern order with duplicates dropped. When no
/// pattern matches, the text is split into sentences and short fragments are discarded.
pub fn extract_clauses(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let clauses: Vec<String> = CLAUSE_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| m.as_str().trim().to_string())
        .filter(|clause| !clause.is_empty() && seen.insert(clause.clone()))
        .collect();
    if !clauses.is_empty() {
        return clauses;
    }

    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_LEN)
        .map(str::to_string)
        .collect()
}

/// Classifies a clause by the first matching keyword group.
pub fn clause_type(text: &str) -> ClauseType {
    CLAUSE_KEYWORDS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map_or(ClauseType::General, |(kind, _)| *kind)
}

/// Asks the active provider to classify one clause. Never fails: gateway errors and
/// unparseable replies are folded into an amber result.
#[instrument(skip_all, fields(clause_len = clause_text.len()))]
pub async fn analyze_clause(gateway: &Gateway, clause_text: &str) -> ClauseAnalysis {
    let messages = vec![
        Message::system(REVIEWER_PROMPT),
        Message::user(format!("Analyze this clause: {}", clause_text)),
    ];
    let params = GenerationParams::default()
        .max_tokens(ANALYSIS_MAX_TOKENS)
        .temperature(ANALYSIS_TEMPERATURE);

    match gateway.generate_text(&messages, &params).await {
        Ok(reply) => ClauseAnalysis::parse(&reply).unwrap_or_else(|| {
            debug!(reply = %reply, "Reviewer reply is not valid analysis JSON");
            ClauseAnalysis::unparseable()
        }),
        Err(e) => {
            warn!(error = %e, "Clause analysis failed");
            ClauseAnalysis::failed(&e)
        }
    }
}

pub async fn analyze_document(gateway: &Gateway, text: &str) -> Result<RedlineReport, LegalError> {
    analyze_document_with_progress(gateway, text, |_| {}).await
}

/// Analyses every non-empty clause of `text` in order, reporting progress to `on_event`.
#[instrument(skip_all, fields(document_len = text.len()))]
pub async fn analyze_document_with_progress<F>(
    gateway: &Gateway,
    text: &str,
    mut on_event: F,
) -> Result<RedlineReport, LegalError>
where
    F: FnMut(AnalysisEvent) + Send,
{
    if text.trim().is_empty() {
        return Err(LegalError::MissingField("Document content"));
    }

    on_event(AnalysisEvent::Started);
    let extracted = extract_clauses(text);
    let total = extracted.len();
    on_event(AnalysisEvent::ClausesFound { count: total });

    let mut clauses = Vec::with_capacity(total);
    for (clause_id, clause_text) in extracted.into_iter().enumerate() {
        if clause_text.trim().is_empty() {
            continue;
        }
        on_event(AnalysisEvent::AnalyzingClause {
            index: clause_id + 1,
            total,
        });
        let analysis = analyze_clause(gateway, &clause_text).await;
        clauses.push(AnalyzedClause {
            clause_id,
            clause_type: clause_type(&clause_text),
            clause_text,
            analysis,
        });
    }

    on_event(AnalysisEvent::Summarizing);
    let summary = RedlineSummary::of(&clauses);
    on_event(AnalysisEvent::Completed {
        total_clauses: summary.total_clauses,
    });

    Ok(RedlineReport { clauses, summary })
}
