//! OCR analysis documents as handed over by the detection and OCR services.

use serde::{Deserialize, Serialize};

use crate::ocr::Word;

/// Result of locating a field region on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cropping {
    /// Detection confidence; negative means the region was not found.
    pub confidence: f32,
}

impl Cropping {
    /// Whether the field region was located at all.
    pub fn found(&self) -> bool {
        self.confidence >= 0.0
    }
}

/// OCR analysis of one cropped field region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// Recognized words, in no particular order.
    pub words: Vec<Word>,
}

/// A field region ready for extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, resolved against the policy registry.
    pub name: String,

    /// Cardinality override; the policy's `max_rows` applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<usize>,

    /// Detection outcome.
    pub cropping: Cropping,

    /// OCR outcome.
    pub analysis: Analysis,
}

impl FieldDescriptor {
    /// Descriptor for a detected field with the given words.
    pub fn new(name: impl Into<String>, confidence: f32, words: Vec<Word>) -> Self {
        Self {
            name: name.into(),
            cardinality: None,
            cropping: Cropping { confidence },
            analysis: Analysis { words },
        }
    }

    /// Descriptor for a field whose region was not detected.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::new(name, -1.0, Vec::new())
    }

    pub fn with_cardinality(mut self, cardinality: usize) -> Self {
        self.cardinality = Some(cardinality);
        self
    }
}

/// All analyzed fields of one scanned claim form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source file name, used as the first output column.
    #[serde(rename = "fileName", alias = "file_name")]
    pub file_name: String,

    /// Analyzed field regions.
    pub fields: Vec<FieldDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_descriptor() {
        let json = r#"{
            "name": "charges",
            "cardinality": 6,
            "cropping": {"confidence": 0.93},
            "analysis": {"words": [{"content": "99", "polygon": [1, 2, 3, 2, 3, 4, 1, 4]}]}
        }"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();

        assert_eq!(field.name, "charges");
        assert_eq!(field.cardinality, Some(6));
        assert!(field.cropping.found());
        assert_eq!(field.analysis.words.len(), 1);
    }

    #[test]
    fn test_missing_keys_fail_fast() {
        let json = r#"{"name": "charges", "analysis": {"words": []}}"#;
        assert!(serde_json::from_str::<FieldDescriptor>(json).is_err());
    }

    #[test]
    fn test_negative_confidence_is_not_found() {
        assert!(!FieldDescriptor::not_found("qty").cropping.found());
    }

    #[test]
    fn test_document_file_name_aliases() {
        let a: Document = serde_json::from_str(r#"{"fileName": "a.pdf", "fields": []}"#).unwrap();
        let b: Document = serde_json::from_str(r#"{"file_name": "a.pdf", "fields": []}"#).unwrap();
        assert_eq!(a, b);
    }
}
