//! Field and document extraction on top of the policy registry.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{DocumentError, PolicyError, Result};
use crate::models::config::ClaimxConfig;
use crate::models::field::{Document, FieldDescriptor};
use crate::models::record::Record;
use crate::ocr::{RowClusterer, Word};

use super::accumulator::RowFieldAccumulator;
use super::policy::{FieldPolicy, PolicyRegistry, DEFAULT_MAX_YEARS_OLD};
use super::rules::DateValidator;
use super::DateFallback;

/// Result of extracting one document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    /// Source file name.
    pub file_name: String,
    /// Merged values of every field.
    pub record: Record,
    /// Skipped fields and consistency warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Runs clustering and accumulation for each field of a document.
///
/// Holds no mutable state, so one orchestrator can serve many documents
/// from many threads.
pub struct FieldExtractionOrchestrator {
    registry: PolicyRegistry,
    fallback: Option<Box<dyn DateFallback>>,
    strict: bool,
    dates: DateValidator,
}

impl FieldExtractionOrchestrator {
    /// Orchestrator over an already resolved registry.
    pub fn new(registry: PolicyRegistry) -> Self {
        Self {
            registry,
            fallback: None,
            strict: true,
            dates: DateValidator::new(DEFAULT_MAX_YEARS_OLD),
        }
    }

    /// Resolve every configured field and build an orchestrator.
    pub fn from_config(config: &ClaimxConfig) -> Result<Self> {
        let registry = PolicyRegistry::from_config(config)?;
        let mut orchestrator = Self::new(registry).with_strict(config.extraction.strict);
        orchestrator.dates = orchestrator
            .dates
            .with_two_digit_year_pivot(config.extraction.two_digit_year_pivot);
        Ok(orchestrator)
    }

    /// Set the date fallback collaborator.
    pub fn with_fallback(mut self, fallback: Box<dyn DateFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Set whether unknown fields are errors.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Extract one field into a record fragment.
    ///
    /// A field whose region was not detected yields an empty fragment.
    /// Unknown field names are an error.
    pub fn extract_field(&self, field: &FieldDescriptor) -> Result<Record> {
        let policy = self.registry.get(&field.name)?;
        Ok(self.run_policy(policy, field))
    }

    fn run_policy(&self, policy: &FieldPolicy, field: &FieldDescriptor) -> Record {
        if !field.cropping.found() {
            info!("{}: region not detected, skipping", field.name);
            return Record::new();
        }

        let words: Vec<Word> = field
            .analysis
            .words
            .iter()
            .filter(|w| policy.filter.admits(&w.content))
            .cloned()
            .collect();
        debug!(
            "{}: {} of {} words admitted",
            field.name,
            words.len(),
            field.analysis.words.len()
        );

        let rows = RowClusterer::new(policy.line_threshold).cluster(&words);
        let mut accumulator = RowFieldAccumulator::new(policy)
            .with_fallback(self.fallback.as_deref())
            .with_confidence(field.cropping.confidence);
        if let Some(cardinality) = field.cardinality {
            accumulator = accumulator.with_max_rows(cardinality.min(policy.max_rows));
        }

        accumulator.run(rows).record
    }

    /// Extract every field of a document and merge the fragments.
    pub fn extract_document(&self, document: &Document) -> Result<DocumentResult> {
        let start = Instant::now();
        let mut record = Record::new();
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for field in &document.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(DocumentError::DuplicateField(field.name.clone()).into());
            }

            match self.registry.get(&field.name) {
                Ok(policy) => record.merge(self.run_policy(policy, field)),
                Err(PolicyError::UnknownField(name)) if !self.strict => {
                    warn!("{}: no policy for field '{}', skipped", document.file_name, name);
                    warnings.push(format!("Unknown field '{}' skipped", name));
                }
                Err(e) => return Err(e.into()),
            }
        }

        warnings.extend(record.validate(&self.dates));

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "{}: {} values extracted in {}ms",
            document.file_name,
            record.len(),
            processing_time_ms
        );

        Ok(DocumentResult {
            file_name: document.file_name.clone(),
            record,
            warnings,
            processing_time_ms,
        })
    }
}
