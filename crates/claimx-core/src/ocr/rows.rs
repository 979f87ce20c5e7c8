//! Row segmentation: groups loose OCR words into visual rows.
//!
//! Words are sorted by their top coordinate and swept once. A word joins
//! the open row while its top lies within `line_threshold` of the top of
//! the row's *first* word; the reference never moves, so a long slanted
//! row cannot drift into the next one.

use std::cmp::Ordering;

use super::Word;

/// A horizontal cluster of words, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    words: Vec<&'a Word>,
}

impl<'a> Row<'a> {
    /// Words of the row, left to right.
    pub fn words(&self) -> &[&'a Word] {
        &self.words
    }

    /// Number of words in the row.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Rows produced by the clusterer are never empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Top of the reference (first-placed) word.
    pub fn top(&self) -> f32 {
        self.words
            .iter()
            .map(|w| w.top())
            .fold(f32::INFINITY, f32::min)
    }

    /// Word contents joined with a single space.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Groups words into rows by vertical proximity.
#[derive(Debug, Clone, Copy)]
pub struct RowClusterer {
    line_threshold: f32,
}

impl RowClusterer {
    /// Create a clusterer with the given same-row tolerance.
    pub fn new(line_threshold: f32) -> Self {
        Self { line_threshold }
    }

    /// Cluster `words` into rows.
    ///
    /// The input order is irrelevant: words are re-sorted by (top, left,
    /// content), so any permutation of the same words yields the same rows.
    pub fn cluster<'a>(&self, words: &'a [Word]) -> Rows<'a> {
        let mut sorted: Vec<&'a Word> = words.iter().collect();
        sorted.sort_by(|a, b| by_top(a, b));

        Rows {
            sorted,
            position: 0,
            line_threshold: self.line_threshold,
        }
    }
}

fn by_top(a: &Word, b: &Word) -> Ordering {
    a.top()
        .total_cmp(&b.top())
        .then_with(|| a.left().total_cmp(&b.left()))
        .then_with(|| a.content.cmp(&b.content))
}

fn by_left(a: &Word, b: &Word) -> Ordering {
    a.left()
        .total_cmp(&b.left())
        .then_with(|| a.top().total_cmp(&b.top()))
        .then_with(|| a.content.cmp(&b.content))
}

/// Lazy sequence of rows over a sorted word list.
///
/// A clone snapshots the current position. Calling `cluster` again always
/// starts from the first row.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    sorted: Vec<&'a Word>,
    position: usize,
    line_threshold: f32,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = *self.sorted.get(self.position)?;
        let reference = first.top();

        let end = self.sorted[self.position..]
            .iter()
            .position(|w| (w.top() - reference).abs() >= self.line_threshold)
            .map(|offset| self.position + offset)
            .unwrap_or(self.sorted.len());

        let mut words = self.sorted[self.position..end].to_vec();
        words.sort_by(|a, b| by_left(a, b));
        self.position = end;

        Some(Row { words })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sorted.len() - self.position;
        (remaining.min(1), Some(remaining))
    }
}
