//! Configuration for the claimx pipeline.
//!
//! Row thresholds are tuned per field and per form layout, and their unit
//! is whatever the OCR engine reports (inches for the layout service the
//! defaults were tuned on, pixels for most image engines). Retargeting to
//! another layout or engine is a config change, never a code change.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extraction::policy::FieldKind;
use crate::extraction::rules::ArtifactFilter;

/// Main configuration for the claimx pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimxConfig {
    /// Extraction behavior.
    pub extraction: ExtractionConfig,

    /// Per-field policies, in output column order.
    pub fields: Vec<FieldConfig>,

    /// LLM date fallback settings.
    pub llm: LlmConfig,
}

impl Default for ClaimxConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            fields: default_fields(),
            llm: LlmConfig::default(),
        }
    }
}

/// Extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Ask the LLM collaborator when a deterministic date fails validation.
    pub enable_llm_fallback: bool,

    /// Years past the current year a two-digit year may still resolve to.
    pub two_digit_year_pivot: i32,

    /// Treat fields without a policy as an error instead of skipping them.
    pub strict: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enable_llm_fallback: false,
            two_digit_year_pivot: 0,
            strict: true,
        }
    }
}

/// Policy parameters for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Field name; output keys are `<name>_<row>`.
    pub name: String,

    /// Value kind, selects filter, formatter and validator.
    pub kind: FieldKind,

    /// Max vertical distance between words of the same row.
    pub line_threshold: f32,

    /// Max vertical jump before the field region is considered left.
    pub max_row_gap: f32,

    /// Cardinality ceiling.
    pub max_rows: usize,

    /// Age ceiling for date plausibility (date kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_years_old: Option<u32>,

    /// Override of the kind's artifact filter table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactFilter>,
}

impl FieldConfig {
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        line_threshold: f32,
        max_row_gap: f32,
        max_rows: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            line_threshold,
            max_row_gap,
            max_rows,
            max_years_old: None,
            artifacts: None,
        }
    }

    pub fn with_max_years_old(mut self, years: u32) -> Self {
        self.max_years_old = Some(years);
        self
    }
}

fn default_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::new("insured_id", FieldKind::InsuredId, 0.2, 1.5, 1),
        FieldConfig::new("birth_date", FieldKind::Date, 1.5, 1.5, 1).with_max_years_old(110),
        FieldConfig::new("startservdate", FieldKind::Date, 0.2, 1.5, 6).with_max_years_old(10),
        FieldConfig::new("endservdate", FieldKind::Date, 0.2, 1.5, 6).with_max_years_old(10),
        FieldConfig::new("cpthcpccode", FieldKind::ProcedureCode, 0.2, 1.5, 6),
        FieldConfig::new("charges", FieldKind::Currency, 0.2, 1.5, 6),
        FieldConfig::new("qty", FieldKind::Quantity, 0.06, 0.9, 6),
        FieldConfig::new("total_charges", FieldKind::Currency, 0.06, 1.5, 1),
    ]
}

/// LLM fallback configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat completions endpoint.
    pub endpoint: String,

    /// Model or deployment name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Completion token limit.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// System prompt.
    pub prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 50,
            temperature: 0.0,
            prompt: "You receive a date read by OCR from a medical claim form. \
                     The reading may contain extra or missing separators and digits \
                     misread from printed ruling lines. Reply with the most likely \
                     date in MM/DD/YYYY format and nothing else. If no date can be \
                     inferred reply with the single word error."
                .to_string(),
        }
    }
}

impl ClaimxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Output columns: `fileName` then `<field>_<i>` for every row slot.
    pub fn output_columns(&self) -> Vec<String> {
        std::iter::once("fileName".to_string())
            .chain(self.fields.iter().flat_map(|f| {
                (1..=f.max_rows).map(move |i| format!("{}_{}", f.name, i))
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_output_columns() {
        let config = ClaimxConfig::default();
        let columns = config.output_columns();

        assert_eq!(columns[0], "fileName");
        assert_eq!(columns[1], "insured_id_1");
        assert!(columns.contains(&"charges_6".to_string()));
        assert!(!columns.contains(&"charges_7".to_string()));
        assert_eq!(columns.last().unwrap(), "total_charges_1");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ClaimxConfig =
            serde_json::from_str(r#"{"extraction": {"enable_llm_fallback": true}}"#).unwrap();

        assert!(config.extraction.enable_llm_fallback);
        assert!(config.extraction.strict);
        assert_eq!(config.fields.len(), 8);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_field_config_requires_thresholds() {
        let result = serde_json::from_str::<FieldConfig>(r#"{"name": "charges", "kind": "currency"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ClaimxConfig::default();
        config.fields.truncate(2);
        config.save(&path).unwrap();

        let loaded = ClaimxConfig::from_file(&path).unwrap();
        assert_eq!(loaded.fields, config.fields);
    }
}
