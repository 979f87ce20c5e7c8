//! Data models: configuration, analysis documents, and extracted records.

pub mod config;
pub mod field;
pub mod record;

pub use config::{ClaimxConfig, ExtractionConfig, FieldConfig, LlmConfig};
pub use field::{Analysis, Cropping, Document, FieldDescriptor};
pub use record::Record;
