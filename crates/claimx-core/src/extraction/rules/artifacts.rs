//! Artifact filter: strips OCR and segmentation noise from word text.
//!
//! The vertical ruling lines printed between the columns of a claim form
//! are regularly read as a digit "1" glued to the real value ("99" next to
//! a rule becomes "199" or "991"). Which character is the artifact depends
//! on the cleaned length of the token and on where the word sits in its
//! row, so the fix is a table of `(lengths, position) -> drop` rules
//! evaluated in order. At most one character is ever dropped per word.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::patterns::{NON_DIGIT, NON_DIGIT_OR_POINT, PUNCTUATION};

/// Characters kept when a word is cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    /// ASCII digits only.
    Digits,
    /// ASCII digits and the decimal point.
    DigitsAndPoint,
    /// Uppercased letters and digits; punctuation removed.
    Text,
}

impl CharClass {
    fn strip(&self, content: &str) -> String {
        match self {
            CharClass::Digits => NON_DIGIT.replace_all(content, "").into_owned(),
            CharClass::DigitsAndPoint => NON_DIGIT_OR_POINT.replace_all(content, "").into_owned(),
            CharClass::Text => PUNCTUATION
                .replace_all(&content.to_uppercase(), "")
                .trim()
                .to_string(),
        }
    }

    /// Separator placed between words of the same row in the buffer.
    pub fn separator(&self) -> &'static str {
        match self {
            CharClass::Text => " ",
            _ => "",
        }
    }
}

/// Position of a word inside its row of `n` words (0-based index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordPosition {
    /// Any word.
    Any,
    /// The first (leftmost) word.
    First,
    /// The last word of a row holding more than one word.
    LastOfMany,
    /// The middle word of a three-word row.
    MiddleOfThree,
}

impl WordPosition {
    /// Whether the word at `index` of a row with `row_len` words matches.
    pub fn matches(&self, index: usize, row_len: usize) -> bool {
        match self {
            WordPosition::Any => true,
            WordPosition::First => index == 0,
            WordPosition::LastOfMany => row_len > 1 && index + 1 == row_len,
            WordPosition::MiddleOfThree => row_len == 3 && index == 1,
        }
    }
}

/// Which spurious "1" to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropRule {
    /// A leading "1".
    Leading,
    /// A trailing "1".
    Trailing,
    /// A leading "1", else a trailing "1".
    LeadingOrTrailing,
    /// A "1" at a fixed character index.
    At(usize),
}

impl DropRule {
    /// Apply the rule, returning the shortened text if it fired.
    fn apply(&self, text: &str) -> Option<String> {
        let leading = || text.strip_prefix('1').map(str::to_string);
        let trailing = || text.strip_suffix('1').map(str::to_string);

        match self {
            DropRule::Leading => leading(),
            DropRule::Trailing => trailing(),
            DropRule::LeadingOrTrailing => leading().or_else(trailing),
            DropRule::At(index) => {
                if text.as_bytes().get(*index) == Some(&b'1') {
                    let mut shortened = text.to_string();
                    shortened.remove(*index);
                    Some(shortened)
                } else {
                    None
                }
            }
        }
    }
}

/// One row of the drop table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRule {
    /// Cleaned token lengths the rule applies to (empty: any length).
    #[serde(default)]
    pub lengths: Vec<usize>,
    /// Word position the rule applies to.
    pub position: WordPosition,
    /// Character to drop.
    pub drop: DropRule,
}

impl ArtifactRule {
    pub fn new(lengths: &[usize], position: WordPosition, drop: DropRule) -> Self {
        Self {
            lengths: lengths.to_vec(),
            position,
            drop,
        }
    }

    fn applies(&self, len: usize, index: usize, row_len: usize) -> bool {
        (self.lengths.is_empty() || self.lengths.contains(&len))
            && self.position.matches(index, row_len)
    }
}

/// Per-field cleanup applied to each word before it reaches the row buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFilter {
    /// Characters to keep.
    pub keep: CharClass,

    /// Words with fewer digits are dropped before clustering.
    #[serde(default)]
    pub min_digits: usize,

    /// Only words at this position contribute to the buffer.
    #[serde(default = "default_position")]
    pub keep_position: WordPosition,

    /// Ruling-line drop table, first firing rule wins.
    #[serde(default)]
    pub rules: Vec<ArtifactRule>,

    /// Cleaned lengths accepted into the buffer (empty: any length).
    #[serde(default)]
    pub accept_lengths: Vec<usize>,
}

fn default_position() -> WordPosition {
    WordPosition::Any
}

impl ArtifactFilter {
    /// Filter that only strips characters outside `keep`.
    pub fn new(keep: CharClass) -> Self {
        Self {
            keep,
            min_digits: 0,
            keep_position: WordPosition::Any,
            rules: Vec::new(),
            accept_lengths: Vec::new(),
        }
    }

    /// Date digits: odd lengths lose a separator "1" at either end, and a
    /// five-digit token loses a "1" sitting between month and day.
    pub fn for_dates() -> Self {
        Self {
            keep: CharClass::Digits,
            min_digits: 2,
            keep_position: WordPosition::Any,
            rules: vec![
                ArtifactRule::new(&[3, 5, 7, 9], WordPosition::Any, DropRule::LeadingOrTrailing),
                ArtifactRule::new(&[5], WordPosition::Any, DropRule::At(2)),
            ],
            accept_lengths: vec![2, 4, 6, 8],
        }
    }

    /// Charge digits: the cents column of a multi-word row ("$ 99 100")
    /// loses a leading "1", and a lone "1" between dollars and cents
    /// ("99 1 00") is dropped.
    pub fn for_currency() -> Self {
        Self {
            rules: vec![
                ArtifactRule::new(&[3], WordPosition::LastOfMany, DropRule::Leading),
                ArtifactRule::new(&[1], WordPosition::MiddleOfThree, DropRule::Leading),
            ],
            ..Self::new(CharClass::Digits)
        }
    }

    /// Quantities: only the first word of a row counts ("1 00" is one unit).
    pub fn for_quantity() -> Self {
        Self {
            keep_position: WordPosition::First,
            ..Self::new(CharClass::DigitsAndPoint)
        }
    }

    /// Identifiers and codes: uppercase, no punctuation, words space-joined.
    pub fn for_identifiers() -> Self {
        Self::new(CharClass::Text)
    }

    /// Whether a raw word takes part in extraction at all.
    pub fn admits(&self, content: &str) -> bool {
        self.min_digits == 0
            || content.chars().filter(|c| c.is_ascii_digit()).count() >= self.min_digits
    }

    /// Clean the word at `index` of a row with `row_len` words.
    ///
    /// Returns `None` when the word contributes nothing to the buffer.
    pub fn clean(&self, content: &str, index: usize, row_len: usize) -> Option<String> {
        if !self.keep_position.matches(index, row_len) {
            return None;
        }

        let mut text = self.keep.strip(content);

        for rule in &self.rules {
            if !rule.applies(text.len(), index, row_len) {
                continue;
            }
            if let Some(shortened) = rule.drop.apply(&text) {
                trace!("Dropped ruling-line artifact: '{}' -> '{}'", text, shortened);
                text = shortened;
                break;
            }
        }

        if !self.accept_lengths.is_empty() && !self.accept_lengths.contains(&text.len()) {
            return None;
        }

        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_separator_at_ends() {
        let filter = ArtifactFilter::for_dates();

        assert_eq!(filter.clean("102", 0, 1), Some("02".to_string()));
        assert_eq!(filter.clean("021", 0, 1), Some("02".to_string()));
        assert_eq!(filter.clean("1021424", 0, 1), Some("021424".to_string()));
    }

    #[test]
    fn test_date_separator_between_month_and_day() {
        let filter = ArtifactFilter::for_dates();

        assert_eq!(filter.clean("02114", 0, 1), Some("0214".to_string()));
        assert_eq!(filter.clean("02/114", 0, 1), Some("0214".to_string()));
    }

    #[test]
    fn test_date_only_one_character_dropped() {
        // Leading "1" wins; the trailing one stays and the odd length is rejected.
        let filter = ArtifactFilter::for_dates();
        assert_eq!(filter.clean("12341", 0, 1), Some("2341".to_string()));
        assert_eq!(filter.clean("11111", 0, 1), Some("1111".to_string()));
    }

    #[test]
    fn test_date_rejects_odd_leftovers() {
        let filter = ArtifactFilter::for_dates();

        assert_eq!(filter.clean("234", 0, 1), None);
        assert_eq!(filter.clean("2", 0, 1), None);
        assert_eq!(filter.clean("2024", 0, 1), Some("2024".to_string()));
    }

    #[test]
    fn test_date_min_digits() {
        let filter = ArtifactFilter::for_dates();

        assert!(filter.admits("02"));
        assert!(!filter.admits("/1"));
        assert!(!filter.admits("DATE"));
    }

    #[test]
    fn test_currency_middle_of_three() {
        let filter = ArtifactFilter::for_currency();

        let cleaned: String = ["99", "1", "00"]
            .iter()
            .enumerate()
            .filter_map(|(i, w)| filter.clean(w, i, 3))
            .collect();
        assert_eq!(cleaned, "9900");
    }

    #[test]
    fn test_currency_middle_dollars_are_kept() {
        let filter = ArtifactFilter::for_currency();

        assert_eq!(filter.clean("150", 1, 3), Some("150".to_string()));
        assert_eq!(filter.clean("12", 1, 3), Some("12".to_string()));
        assert_eq!(filter.clean("1", 1, 3), Some(String::new()));
    }

    #[test]
    fn test_currency_last_of_many() {
        let filter = ArtifactFilter::for_currency();

        assert_eq!(filter.clean("100", 2, 3), Some("00".to_string()));
        assert_eq!(filter.clean("100", 1, 2), Some("00".to_string()));
        // A lone word is left alone: "100" may well be $1.00.
        assert_eq!(filter.clean("100", 0, 1), Some("100".to_string()));
        assert_eq!(filter.clean("$", 0, 3), Some(String::new()));
    }

    #[test]
    fn test_quantity_keeps_first_word_only() {
        let filter = ArtifactFilter::for_quantity();

        assert_eq!(filter.clean("1.", 0, 2), Some("1.".to_string()));
        assert_eq!(filter.clean("00", 1, 2), None);
    }

    #[test]
    fn test_identifier_cleanup() {
        let filter = ArtifactFilter::for_identifiers();

        assert_eq!(filter.clean("w12-34", 0, 1), Some("W1234".to_string()));
        assert_eq!(CharClass::Text.separator(), " ");
        assert_eq!(CharClass::Digits.separator(), "");
    }

    #[test]
    fn test_filter_deserializes_from_table() {
        let json = r#"{
            "keep": "digits",
            "rules": [{"lengths": [3], "position": "last_of_many", "drop": "leading"},
                      {"position": "any", "drop": {"at": 2}}]
        }"#;
        let filter: ArtifactFilter = serde_json::from_str(json).unwrap();

        assert_eq!(filter.rules.len(), 2);
        assert_eq!(filter.rules[1].drop, DropRule::At(2));
        assert_eq!(filter.keep_position, WordPosition::Any);
    }
}
