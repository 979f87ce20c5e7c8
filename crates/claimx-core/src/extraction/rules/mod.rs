//! Rule-based cleanup, formatting, and validation for claim form fields.

pub mod artifacts;
pub mod dates;
pub mod format;
pub mod patterns;

pub use artifacts::{ArtifactFilter, ArtifactRule, CharClass, DropRule, WordPosition};
pub use dates::{is_valid_date, normalize_date_text, DateValidator};
pub use format::{
    format_currency, format_date, format_insured_id, format_procedure_code, format_quantity,
    Formatter,
};
