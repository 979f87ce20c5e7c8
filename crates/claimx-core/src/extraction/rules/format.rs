//! Formatters: turn a cleaned row buffer into a canonical field value.
//!
//! Every formatter returns `None` when the buffer cannot be formatted.
//! A `None` is not an error; the row is simply skipped.

use serde::{Deserialize, Serialize};

use super::patterns::{INSURED_ID, NON_DIGIT, PROCEDURE_CODE, PUNCTUATION};

/// Canonical value formatter for a field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    /// `MMDDYY` / `MMDDYYYY` digits to `MM/DD/YY` / `MM/DD/YYYY`.
    Date,
    /// Digits to `D.DD`.
    Currency,
    /// Integer part of a count.
    Quantity,
    /// Insured's ID token.
    InsuredId,
    /// CPT/HCPCS procedure code.
    ProcedureCode,
}

impl Formatter {
    /// Format a buffer, or `None` when it does not fit the field.
    pub fn format(&self, buffer: &str) -> Option<String> {
        match self {
            Formatter::Date => format_date(buffer),
            Formatter::Currency => format_currency(buffer),
            Formatter::Quantity => format_quantity(buffer),
            Formatter::InsuredId => format_insured_id(buffer),
            Formatter::ProcedureCode => format_procedure_code(buffer),
        }
    }
}

/// Insert `/` separators into a 6 or 8 digit buffer.
pub fn format_date(digits: &str) -> Option<String> {
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    match digits.len() {
        6 | 8 => Some(format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..])),
        _ => None,
    }
}

/// All digits but the last two, a point, then the cents.
pub fn format_currency(text: &str) -> Option<String> {
    let digits = NON_DIGIT.replace_all(text, "");

    match digits.len() {
        0 | 1 => None,
        2 => Some(format!("0.{}", digits)),
        n => Some(format!("{}.{}", &digits[..n - 2], &digits[n - 2..])),
    }
}

/// Integer part only; anything after the first decimal point is dropped.
pub fn format_quantity(text: &str) -> Option<String> {
    let integer_part = text.split('.').next().unwrap_or_default();
    let digits = NON_DIGIT.replace_all(integer_part, "");

    if digits.is_empty() {
        None
    } else {
        Some(digits.into_owned())
    }
}

/// First 8-12 digit token, optionally prefixed by one letter.
pub fn format_insured_id(text: &str) -> Option<String> {
    let cleaned = PUNCTUATION.replace_all(&text.to_uppercase(), "").into_owned();

    INSURED_ID
        .captures(&cleaned)
        .map(|caps| caps[1].to_string())
}

/// First 5-character CPT/HCPCS token.
pub fn format_procedure_code(text: &str) -> Option<String> {
    let cleaned = PUNCTUATION.replace_all(&text.to_uppercase(), "").into_owned();

    PROCEDURE_CODE
        .captures(&cleaned)
        .map(|caps| caps[1].to_string())
}
