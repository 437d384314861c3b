//! Structured field extraction with validation and re-extraction.
//!
//! Three-phase pipeline: extract every field with a targeted prompt,
//! validate which fields came back usable, then re-run only the missing
//! fields with a more insistent prompt.

use serde::Serialize;
use tracing::{debug, info};

use loopcraft_llm::{ChatClient, LlmError, Message};

use crate::error::PatternError;

/// Replies the validator treats as "nothing extracted".
const MISSING_SENTINELS: [&str; 3] = ["not available", "not mentioned", "unknown"];

/// One field to pull out of the source text. The prompt's `{text}`
/// placeholder receives the document.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Complete,
    Missing,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedField {
    pub name: String,
    pub value: String,
    pub status: FieldStatus,
}

/// Per-field results of a full extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub fields: Vec<ExtractedField>,
}

impl ExtractionReport {
    pub fn missing_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.status == FieldStatus::Missing)
            .count()
    }

    /// Field name/value map as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), serde_json::Value::String(f.value.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Runs the extract/validate/re-extract pipeline over a document.
pub struct Extractor<'a> {
    client: &'a dyn ChatClient,
    fields: Vec<FieldSpec>,
}

impl<'a> Extractor<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self {
            client,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            prompt: prompt.into(),
        });
        self
    }

    pub async fn extract(&self, text: &str) -> Result<ExtractionReport, PatternError> {
        // Phase 1: one targeted prompt per field.
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in &self.fields {
            debug!(field = %spec.name, "Extracting field");
            let value = self.ask(&spec.name, &spec.prompt.replace("{text}", text)).await?;
            let status = if is_missing(&value) {
                FieldStatus::Missing
            } else {
                FieldStatus::Complete
            };
            fields.push(ExtractedField {
                name: spec.name.clone(),
                value: value.trim().to_string(),
                status,
            });
        }

        // Phase 2/3: validate, then re-extract only what is missing.
        let missing = fields
            .iter()
            .filter(|f| f.status == FieldStatus::Missing)
            .count();
        if missing > 0 {
            info!(missing, "Re-extracting missing fields");
        }

        for field in fields.iter_mut().filter(|f| f.status == FieldStatus::Missing) {
            let value = self
                .ask(&field.name, &focused_prompt(&field.name, text))
                .await?;
            if !is_missing(&value) {
                field.value = value.trim().to_string();
                field.status = FieldStatus::Complete;
            }
        }

        Ok(ExtractionReport { fields })
    }

    /// One extraction call. An empty completion means "nothing found", not
    /// a failure.
    async fn ask(&self, field: &str, prompt: &str) -> Result<String, PatternError> {
        match self.client.complete(&[Message::user(prompt)]).await {
            Ok(value) => Ok(value),
            Err(LlmError::EmptyCompletion) => Ok(String::new()),
            Err(source) => Err(PatternError::Step {
                step: field.to_string(),
                source,
            }),
        }
    }
}

fn is_missing(value: &str) -> bool {
    let normalized = value.trim().trim_end_matches('.').to_lowercase();
    normalized.is_empty() || MISSING_SENTINELS.contains(&normalized.as_str())
}

fn focused_prompt(field: &str, text: &str) -> String {
    format!(
        "Re-read the following text carefully and extract the '{field}' field. \
         Look for indirect mentions, abbreviations and synonyms. \
         If it is genuinely absent, respond with 'Not available'.\n\n{text}"
    )
}
