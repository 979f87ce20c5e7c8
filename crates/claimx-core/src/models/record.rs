//! Extracted field values keyed by `<field>_<row>`.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extraction::rules::DateValidator;

/// Mapping from `<field>_<row>` (1-based) to a canonical value.
///
/// A missing key means the slot could not be extracted; `row_values`
/// renders it as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for row `row` (1-based) of `field`.
    pub fn key(field: &str, row: usize) -> String {
        format!("{}_{}", field, row)
    }

    /// Set row `row` (1-based) of `field`.
    pub fn set(&mut self, field: &str, row: usize, value: impl Into<String>) {
        self.values.insert(Self::key(field, row), value.into());
    }

    /// Value stored under a full key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of row `row` (1-based) of `field`.
    pub fn value(&self, field: &str, row: usize) -> Option<&str> {
        self.get(&Self::key(field, row))
    }

    /// Number of extracted values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Rows of `field` that hold a value, as `(row, value)` in row order.
    pub fn rows(&self, field: &str) -> Vec<(usize, &str)> {
        let prefix = format!("{}_", field);
        let mut rows: Vec<(usize, &str)> = self
            .values
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix)
                    .and_then(|row| row.parse::<usize>().ok())
                    .map(|row| (row, v.as_str()))
            })
            .collect();
        rows.sort_by_key(|(row, _)| *row);
        rows
    }

    /// Currency value of a row, parsed as a decimal.
    pub fn amount(&self, field: &str, row: usize) -> Option<Decimal> {
        self.value(field, row).and_then(|v| Decimal::from_str(v).ok())
    }

    /// Merge another fragment into this record. Fragments are expected to
    /// be disjoint; on a clash the incoming value wins.
    pub fn merge(&mut self, other: Record) {
        for (key, value) in other.values {
            if let Some(previous) = self.values.insert(key.clone(), value) {
                warn!("Record key {} overwritten (was '{}')", key, previous);
            }
        }
    }

    /// Values for the given columns, empty strings for unset slots.
    pub fn row_values(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|c| self.get(c).unwrap_or_default().to_string())
            .collect()
    }

    /// Cross-field consistency checks. Returns human-readable warnings.
    ///
    /// Service dates are read with `dates`, so two-digit years resolve the
    /// same way they did when the values were accepted.
    pub fn validate(&self, dates: &DateValidator) -> Vec<String> {
        let mut issues = Vec::new();

        // Line charges should add up to the total
        let charges: Vec<Decimal> = self
            .rows("charges")
            .into_iter()
            .filter_map(|(_, v)| Decimal::from_str(v).ok())
            .collect();
        if let Some(total) = self.amount("total_charges", 1).filter(|_| !charges.is_empty()) {
            let sum: Decimal = charges.iter().sum();
            if sum != total {
                issues.push(format!(
                    "Sum of charges ({}) does not match total charges ({})",
                    sum, total
                ));
            }
        }

        // Service period must not end before it starts
        for (row, start) in self.rows("startservdate") {
            let Some(end) = self.value("endservdate", row) else {
                continue;
            };
            if let (Some(start_date), Some(end_date)) = (dates.parse(start), dates.parse(end)) {
                if end_date < start_date {
                    issues.push(format!(
                        "Service line {} ends ({}) before it starts ({})",
                        row, end, start
                    ));
                }
            }
        }

        for (row, qty) in self.rows("qty") {
            if qty.parse::<u64>().ok() == Some(0) {
                issues.push(format!("Service line {} has zero quantity", row));
            }
        }

        issues
    }
}
