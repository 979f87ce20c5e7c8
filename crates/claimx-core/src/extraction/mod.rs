//! Claim form field extraction module.

pub mod accumulator;
mod orchestrator;
pub mod policy;
pub mod rules;

pub use accumulator::{Accumulated, AccumulatorState, RowFieldAccumulator};
pub use orchestrator::{DocumentResult, FieldExtractionOrchestrator};
pub use policy::{FieldKind, FieldPolicy, PolicyRegistry};

/// Collaborator asked for a date when the deterministic one is implausible.
///
/// Called at most once per rejected row. Any reply is re-validated, so
/// implementations may return their best guess.
pub trait DateFallback: Send + Sync {
    /// Infer a date from the rejected `MM/DD/YY(YY)` string, or `None`.
    fn infer_date(&self, raw: &str) -> Option<String>;
}
