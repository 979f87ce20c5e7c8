//! Extraction quality against hand-labelled ground truth.
//!
//! Both tables share the output layout: the file name first, then one
//! column per field slot. Each cell is scored with the word error rate of
//! the extracted text against the labelled text.

use std::collections::HashMap;

use strsim::generic_levenshtein;

/// Placeholder compared in place of an empty cell, so that two empty
/// cells match and an empty cell against a value counts one error.
const EMPTY_CELL: &str = "-";

/// Word-level error rate: edit distance over words divided by the number
/// of reference words.
pub fn word_error_rate(reference: &str, hypothesis: &str) -> f64 {
    let reference: Vec<&str> = reference.split_whitespace().collect();
    let hypothesis: Vec<&str> = hypothesis.split_whitespace().collect();

    if reference.is_empty() {
        return if hypothesis.is_empty() { 0.0 } else { 1.0 };
    }

    generic_levenshtein(&reference, &hypothesis) as f64 / reference.len() as f64
}

/// Scores of one evaluated file.
#[derive(Debug, Clone, PartialEq)]
pub struct RowEvaluation {
    pub file_name: String,
    /// Sum of the cell rates.
    pub sum: f64,
    /// Rate per column, in result column order.
    pub rates: Vec<f64>,
    /// Whether the file was present in the ground truth.
    pub labelled: bool,
}

/// Evaluation of a results table.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Value columns (file name column excluded).
    pub columns: Vec<String>,
    pub rows: Vec<RowEvaluation>,
}

impl EvaluationReport {
    /// Output header: `fileName`, `sum`, then the value columns.
    pub fn header(&self) -> Vec<String> {
        ["fileName", "sum"]
            .iter()
            .map(|s| s.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    /// Output rows matching `header`.
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                std::iter::once(row.file_name.clone())
                    .chain(std::iter::once(format!("{:.4}", row.sum)))
                    .chain(row.rates.iter().map(|r| format!("{:.4}", r)))
                    .collect()
            })
            .collect()
    }

    /// Fraction of files whose cell matched exactly, per column.
    pub fn column_accuracy(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let exact = self
                    .rows
                    .iter()
                    .filter(|row| row.rates.get(col) == Some(&0.0))
                    .count();
                let accuracy = if self.rows.is_empty() {
                    0.0
                } else {
                    exact as f64 / self.rows.len() as f64
                };
                (name.clone(), accuracy)
            })
            .collect()
    }

    /// Mean of the per-file sums.
    pub fn mean_sum(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.rows.iter().map(|r| r.sum).sum::<f64>() / self.rows.len() as f64
    }
}

/// Score `results` against `ground_truth`.
///
/// `header` is the results header (file name column first); both tables
/// are data rows only. Files absent from the ground truth are compared
/// against empty cells.
pub fn evaluate(
    header: &[String],
    ground_truth: &[Vec<String>],
    results: &[Vec<String>],
) -> EvaluationReport {
    let truth: HashMap<&str, &[String]> = ground_truth
        .iter()
        .filter_map(|row| row.split_first())
        .map(|(name, cells)| (name.as_str(), cells))
        .collect();

    let columns: Vec<String> = header.iter().skip(1).cloned().collect();

    let rows = results
        .iter()
        .filter_map(|row| row.split_first())
        .map(|(file_name, cells)| {
            let expected = truth.get(file_name.as_str()).copied();
            let rates: Vec<f64> = (0..columns.len())
                .map(|col| {
                    let reference = expected
                        .and_then(|cells| cells.get(col))
                        .map(String::as_str)
                        .unwrap_or_default();
                    let hypothesis = cells.get(col).map(String::as_str).unwrap_or_default();
                    word_error_rate(or_placeholder(reference), or_placeholder(hypothesis))
                })
                .collect();

            RowEvaluation {
                file_name: file_name.clone(),
                sum: rates.iter().sum(),
                rates,
                labelled: expected.is_some(),
            }
        })
        .collect();

    EvaluationReport { columns, rows }
}

fn or_placeholder(cell: &str) -> &str {
    if cell.trim().is_empty() {
        EMPTY_CELL
    } else {
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_word_error_rate() {
        assert_eq!(word_error_rate("99.00", "99.00"), 0.0);
        assert_eq!(word_error_rate("99.00", "9.00"), 1.0);
        assert_eq!(word_error_rate("W1 2345", "W1 2345 X"), 0.5);
        assert_eq!(word_error_rate("a b c d", "a c d"), 0.25);
        assert_eq!(word_error_rate("", ""), 0.0);
    }

    #[test]
    fn test_empty_cells_compare_as_placeholder() {
        let header = row(&["fileName", "charges_1", "charges_2"]);
        let truth = vec![row(&["a.pdf", "99.00", ""])];
        let results = vec![row(&["a.pdf", "99.00", ""])];

        let report = evaluate(&header, &truth, &results);
        assert_eq!(report.rows[0].rates, vec![0.0, 0.0]);
        assert_eq!(report.rows[0].sum, 0.0);
    }

    #[test]
    fn test_missing_value_counts_as_error() {
        let header = row(&["fileName", "charges_1", "qty_1"]);
        let truth = vec![row(&["a.pdf", "99.00", "1"]), row(&["b.pdf", "5.00", "2"])];
        let results = vec![row(&["a.pdf", "", "1"]), row(&["b.pdf", "5.00", "2"])];

        let report = evaluate(&header, &truth, &results);
        assert_eq!(report.rows[0].sum, 1.0);
        assert_eq!(
            report.column_accuracy(),
            vec![("charges_1".to_string(), 0.5), ("qty_1".to_string(), 1.0)]
        );
        assert_eq!(report.mean_sum(), 0.5);
    }

    #[test]
    fn test_unlabelled_file() {
        let header = row(&["fileName", "qty_1"]);
        let report = evaluate(&header, &[], &[row(&["x.pdf", "1"])]);

        assert!(!report.rows[0].labelled);
        assert_eq!(report.rows[0].rates, vec![1.0]);
    }

    #[test]
    fn test_report_layout() {
        let header = row(&["fileName", "qty_1"]);
        let report = evaluate(&header, &[row(&["a.pdf", "1"])], &[row(&["a.pdf", "1"])]);

        assert_eq!(report.header(), row(&["fileName", "sum", "qty_1"]));
        assert_eq!(report.records(), vec![row(&["a.pdf", "0.0000", "0.0000"])]);
    }
}
