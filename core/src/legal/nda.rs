use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    chat::{GenerationParams, Message},
    gateway::{Gateway, Outcome, ProviderId},
};

use super::LegalError;

pub const NDA_MAX_TOKENS: u32 = 2000;
pub const NDA_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_JURISDICTION: &str = "India";

const SYSTEM_PROMPT: &str = "You are a legal document generator specializing in NDA agreements. \
Generate professional, legally sound documents.";

const DEFAULT_TEMPLATE: &str = "You are a legal assistant generating an NDA agreement. Format the output in legal English. Use the following inputs to construct the NDA:
- Parties: {party_a}, {party_b}, {party_c}
- Type: {nda_type}
- Purpose: {purpose}
- Duration: {confidentiality_period}
- Jurisdiction: {jurisdiction}

Generate a comprehensive, legally sound NDA agreement based on these parameters.";

fn default_nda_type() -> String {
    "two-way".to_string()
}

fn default_confidentiality_period() -> String {
    "2 years".to_string()
}

fn default_jurisdiction() -> String {
    DEFAULT_JURISDICTION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdaParameters {
    #[serde(default)]
    pub party_a: String,
    #[serde(default)]
    pub party_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_c: Option<String>,
    #[serde(default = "default_nda_type")]
    pub nda_type: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default = "default_confidentiality_period")]
    pub confidentiality_period: String,
    #[serde(default = "default_jurisdiction")]
    pub jurisdiction: String,
}

impl Default for NdaParameters {
    fn default() -> Self {
        Self {
            party_a: String::new(),
            party_b: String::new(),
            party_c: None,
            nda_type: default_nda_type(),
            purpose: String::new(),
            confidentiality_period: default_confidentiality_period(),
            jurisdiction: default_jurisdiction(),
        }
    }
}

impl NdaParameters {
    pub fn new(
        party_a: impl Into<String>,
        party_b: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            party_a: party_a.into(),
            party_b: party_b.into(),
            purpose: purpose.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), LegalError> {
        if self.party_a.trim().is_empty() {
            return Err(LegalError::MissingField("Party A"));
        }
        if self.party_b.trim().is_empty() {
            return Err(LegalError::MissingField("Party B"));
        }
        if self.purpose.trim().is_empty() {
            return Err(LegalError::MissingField("Purpose"));
        }
        Ok(())
    }

    fn party_c_or_na(&self) -> &str {
        match self.party_c.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => "N/A",
        }
    }
}

/// Prompt template with `{placeholder}` slots for the NDA parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdaTemplate {
    text: String,
}

impl Default for NdaTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl NdaTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LegalError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LegalError::Template {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { text })
    }

    /// Loads the template at `path`, using the built-in one if the file cannot be read.
    pub async fn from_file_or_default(path: impl AsRef<Path>) -> Self {
        match Self::from_file(path).await {
            Ok(template) => template,
            Err(e) => {
                warn!(error = %e, "Falling back to built-in NDA template");
                Self::default()
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn render(&self, params: &NdaParameters) -> String {
        [
            ("{party_a}", params.party_a.as_str()),
            ("{party_b}", params.party_b.as_str()),
            ("{party_c}", params.party_c_or_na()),
            ("{nda_type}", params.nda_type.as_str()),
            ("{purpose}", params.purpose.as_str()),
            ("{confidentiality_period}", params.confidentiality_period.as_str()),
            ("{jurisdiction}", params.jurisdiction.as_str()),
        ]
        .into_iter()
        .fold(self.text.clone(), |text, (slot, value)| text.replace(slot, value))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NdaDraft {
    pub content: String,
    pub parameters: NdaParameters,
    pub provider: ProviderId,
    pub outcome: Outcome,
}

#[instrument(skip_all, fields(nda_type = %params.nda_type, jurisdiction = %params.jurisdiction))]
pub async fn generate_nda(
    gateway: &Gateway,
    template: &NdaTemplate,
    params: NdaParameters,
) -> Result<NdaDraft, LegalError> {
    params.validate()?;

    let messages = vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(template.render(&params)),
    ];
    let generation_params = GenerationParams::default()
        .max_tokens(NDA_MAX_TOKENS)
        .temperature(NDA_TEMPERATURE);
    let generation = gateway.generate(&messages, &generation_params).await?;
    info!(outcome = ?generation.outcome, chars = generation.text.len(), "NDA generated");

    Ok(NdaDraft {
        content: generation.text,
        parameters: params,
        provider: generation.provider,
        outcome: generation.outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_named() {
        let params = NdaParameters::new("Acme", "", "Evaluation");
        let err = params.validate().unwrap_err();
        assert_eq!(err.to_string(), "Party B is required");

        let params = NdaParameters::new("Acme", "Globex", "  ");
        assert!(matches!(params.validate(), Err(LegalError::MissingField("Purpose"))));
    }

    #[test]
    fn deserialising_fills_defaults() {
        let params: NdaParameters =
            serde_json::from_str(r#"{"party_a": "Acme", "party_b": "Globex", "purpose": "Merger"}"#)
                .unwrap();
        assert_eq!(params.nda_type, "two-way");
        assert_eq!(params.confidentiality_period, "2 years");
        assert_eq!(params.jurisdiction, "India");
        assert_eq!(params.party_c, None);
    }

    #[test]
    fn render_fills_every_slot() {
        let mut params = NdaParameters::new("Acme", "Globex", "Merger talks");
        params.jurisdiction = "Singapore".to_string();
        let rendered = NdaTemplate::default().render(&params);

        assert!(rendered.contains("- Parties: Acme, Globex, N/A"));
        assert!(rendered.contains("- Type: two-way"));
        assert!(rendered.contains("- Purpose: Merger talks"));
        assert!(rendered.contains("- Duration: 2 years"));
        assert!(rendered.contains("- Jurisdiction: Singapore"));
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn custom_template_with_third_party() {
        let mut params = NdaParameters::new("A", "B", "P");
        params.party_c = Some("C".to_string());
        let template = NdaTemplate::new("{party_a}/{party_b}/{party_c} {unknown}");
        assert_eq!(template.render(&params), "A/B/C {unknown}");
    }
}
