//! Core library for medical claim form field extraction.
//!
//! This crate provides:
//! - Row segmentation of unordered OCR words
//! - Ruling-line artifact cleanup per field kind
//! - Row accumulation into dates, charges, quantities and codes
//! - Date plausibility checks with an optional fallback collaborator
//! - Record consistency checks and evaluation against ground truth

pub mod error;
pub mod evaluate;
pub mod extraction;
pub mod models;
pub mod ocr;

pub use error::{ClaimxError, DocumentError, PolicyError, Result};
pub use extraction::{
    DateFallback, DocumentResult, FieldExtractionOrchestrator, FieldKind, FieldPolicy,
    PolicyRegistry, RowFieldAccumulator,
};
pub use models::{ClaimxConfig, Document, FieldDescriptor, Record};
pub use ocr::{Row, RowClusterer, Word};
