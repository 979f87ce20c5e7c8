//! Common regex patterns for claim form field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anything that is not a digit
    pub static ref NON_DIGIT: Regex = Regex::new(r"[^0-9]").unwrap();

    // Anything that is neither a digit nor a decimal point
    pub static ref NON_DIGIT_OR_POINT: Regex = Regex::new(r"[^0-9.]").unwrap();

    // Punctuation removed from identifier text (keeps letters, digits, whitespace)
    pub static ref PUNCTUATION: Regex = Regex::new(r"[^A-Za-z0-9\s]").unwrap();

    // Insured's ID: 8-12 digits, optionally prefixed by one letter
    pub static ref INSURED_ID: Regex = Regex::new(
        r"\b([A-Z]?[0-9]{8,12})\b"
    ).unwrap();

    // CPT/HCPCS procedure code: 4 digits + digit/letter, or letter + 4 digits
    pub static ref PROCEDURE_CODE: Regex = Regex::new(
        r"\b([0-9]{4}[0-9A-Z]|[A-Z][0-9]{4})\b"
    ).unwrap();

    // Canonical dates produced by the date formatter
    pub static ref DATE_MDY_LONG: Regex = Regex::new(
        r"^(\d{2})/(\d{2})/(\d{4})$"
    ).unwrap();

    pub static ref DATE_MDY_SHORT: Regex = Regex::new(
        r"^(\d{2})/(\d{2})/(\d{2})$"
    ).unwrap();

    // A date somewhere in free text, e.g. an LLM reply ("Sure: 02/14/2024.")
    pub static ref DATE_IN_TEXT: Regex = Regex::new(
        r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})\b"
    ).unwrap();
}
