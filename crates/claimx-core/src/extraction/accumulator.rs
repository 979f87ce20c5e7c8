//! Row accumulation: walks clustered words and emits one value per row.
//!
//! Two vertical thresholds drive the walk. A jump larger than
//! `line_threshold` closes the current row; a jump larger than
//! `max_row_gap` means the words have left the field's region (OCR picked
//! up something from a neighboring block) and the walk stops for good.

use tracing::{debug, info, warn};

use crate::models::record::Record;
use crate::ocr::{Rows, Word};

use super::policy::FieldPolicy;
use super::rules::normalize_date_text;
use super::DateFallback;

/// Accumulator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    /// No word seen yet.
    Idle,
    /// Buffering words of the current row.
    Accumulating,
    /// Input exhausted.
    Done,
    /// Stopped early on a vertical jump larger than `max_row_gap`.
    Aborted,
}

impl AccumulatorState {
    /// Both terminal states are normal termination.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AccumulatorState::Done | AccumulatorState::Aborted)
    }
}

/// Outcome of one accumulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulated {
    /// Emitted values, keyed `<field>_<row>`.
    pub record: Record,
    /// Terminal state.
    pub state: AccumulatorState,
    /// Words consumed before termination.
    pub words_visited: usize,
}

/// Row state machine for one field.
pub struct RowFieldAccumulator<'a> {
    policy: &'a FieldPolicy,
    fallback: Option<&'a dyn DateFallback>,
    max_rows: usize,
    confidence: f32,
    state: AccumulatorState,
    row_index: usize,
    buffer: String,
    previous_top: Option<f32>,
    words_visited: usize,
    record: Record,
}

impl<'a> RowFieldAccumulator<'a> {
    pub fn new(policy: &'a FieldPolicy) -> Self {
        Self {
            policy,
            fallback: None,
            max_rows: policy.max_rows,
            confidence: 1.0,
            state: AccumulatorState::Idle,
            row_index: 0,
            buffer: String::new(),
            previous_top: None,
            words_visited: 0,
            record: Record::new(),
        }
    }

    /// Escalate validator rejections to a fallback collaborator.
    pub fn with_fallback(mut self, fallback: Option<&'a dyn DateFallback>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Override the policy's cardinality ceiling.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Detection confidence, only used in log lines.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Current state.
    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Feed every word of the clustered rows, then flush.
    pub fn run(mut self, rows: Rows<'_>) -> Accumulated {
        'rows: for row in rows {
            let row_len = row.len();
            for (index, word) in row.words().iter().enumerate() {
                if !self.push(word, index, row_len) {
                    break 'rows;
                }
            }
        }
        self.finish()
    }

    /// Feed one word, `index` being its position in a row of `row_len`.
    ///
    /// Returns `false` once the accumulator has aborted; later words are
    /// never considered.
    pub fn push(&mut self, word: &Word, index: usize, row_len: usize) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = AccumulatorState::Accumulating;

        let top = word.top();
        if let Some(previous_top) = self.previous_top {
            let gap = (top - previous_top).abs();

            if gap > self.policy.max_row_gap {
                debug!(
                    "{}: vertical gap {:.3} exceeds {:.3}, stopping before '{}'",
                    self.policy.name, gap, self.policy.max_row_gap, word.content
                );
                self.state = AccumulatorState::Aborted;
                return false;
            }

            if gap > self.policy.line_threshold {
                if self.row_index < self.max_rows {
                    self.emit_row();
                }
                self.buffer.clear();
            }
        }

        self.words_visited += 1;
        if let Some(cleaned) = self.policy.filter.clean(&word.content, index, row_len) {
            if !self.buffer.is_empty() && !cleaned.is_empty() {
                self.buffer.push_str(self.policy.filter.keep.separator());
            }
            self.buffer.push_str(&cleaned);
        }
        self.previous_top = Some(top);

        true
    }

    /// Flush the trailing row and return what was emitted.
    pub fn finish(mut self) -> Accumulated {
        // No word follows the last row, so it never sees a boundary.
        if self.row_index < self.max_rows && !self.buffer.is_empty() {
            self.emit_row();
        }
        if self.state != AccumulatorState::Aborted {
            self.state = AccumulatorState::Done;
        }

        Accumulated {
            record: self.record,
            state: self.state,
            words_visited: self.words_visited,
        }
    }

    fn emit_row(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);

        match self.accept(&buffer) {
            Some(value) => {
                self.row_index += 1;
                info!(
                    "{}_{} ({:.2}) = {}",
                    self.policy.name, self.row_index, self.confidence, value
                );
                self.record.set(&self.policy.name, self.row_index, value);
            }
            None => debug!("{}: row buffer '{}' rejected", self.policy.name, buffer),
        }
    }

    /// Format, validate, and if needed escalate once to the fallback.
    fn accept(&self, buffer: &str) -> Option<String> {
        let formatted = self.policy.formatter.format(buffer)?;

        let Some(validator) = &self.policy.validator else {
            return Some(formatted);
        };
        if validator.is_valid(&formatted) {
            return Some(formatted);
        }

        let fallback = self.fallback?;
        info!("{}: '{}' failed validation, asking fallback", self.policy.name, formatted);

        match fallback.infer_date(&formatted).as_deref().and_then(normalize_date_text) {
            Some(inferred) if validator.is_valid(&inferred) => {
                info!("{}: fallback inferred {}", self.policy.name, inferred);
                Some(inferred)
            }
            other => {
                warn!("{}: fallback reply {:?} rejected", self.policy.name, other);
                None
            }
        }
    }
}
