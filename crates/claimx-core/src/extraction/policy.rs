//! Field policies and the static registry that resolves them by name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::models::config::{ClaimxConfig, FieldConfig};

use super::rules::{ArtifactFilter, DateValidator, Formatter};

/// Kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Calendar date (`MM/DD/YY` or `MM/DD/YYYY`).
    Date,
    /// Currency amount (`D.DD`).
    Currency,
    /// Integer quantity.
    Quantity,
    /// Insured's ID.
    InsuredId,
    /// CPT/HCPCS procedure code.
    ProcedureCode,
}

impl FieldKind {
    /// Artifact filter table for the kind.
    pub fn filter(&self) -> ArtifactFilter {
        match self {
            FieldKind::Date => ArtifactFilter::for_dates(),
            FieldKind::Currency => ArtifactFilter::for_currency(),
            FieldKind::Quantity => ArtifactFilter::for_quantity(),
            FieldKind::InsuredId | FieldKind::ProcedureCode => ArtifactFilter::for_identifiers(),
        }
    }

    /// Formatter for the kind.
    pub fn formatter(&self) -> Formatter {
        match self {
            FieldKind::Date => Formatter::Date,
            FieldKind::Currency => Formatter::Currency,
            FieldKind::Quantity => Formatter::Quantity,
            FieldKind::InsuredId => Formatter::InsuredId,
            FieldKind::ProcedureCode => Formatter::ProcedureCode,
        }
    }

    /// Whether values of this kind go through date plausibility.
    pub fn is_date(&self) -> bool {
        matches!(self, FieldKind::Date)
    }
}

/// Default age ceiling for date fields without an explicit one.
pub const DEFAULT_MAX_YEARS_OLD: u32 = 10;

/// Everything the accumulator needs to extract one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPolicy {
    /// Field name, prefix of the output keys.
    pub name: String,
    /// Value kind.
    pub kind: FieldKind,
    /// Max vertical distance between words of the same row.
    pub line_threshold: f32,
    /// Max vertical jump before accumulation stops.
    pub max_row_gap: f32,
    /// Cardinality ceiling.
    pub max_rows: usize,
    /// Word cleanup.
    pub filter: ArtifactFilter,
    /// Buffer to canonical value.
    pub formatter: Formatter,
    /// Optional acceptance check.
    pub validator: Option<DateValidator>,
}

impl FieldPolicy {
    /// Policy for `kind` with the kind's filter, formatter and validator.
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        line_threshold: f32,
        max_row_gap: f32,
        max_rows: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            line_threshold,
            max_row_gap,
            max_rows,
            filter: kind.filter(),
            formatter: kind.formatter(),
            validator: kind
                .is_date()
                .then(|| DateValidator::new(DEFAULT_MAX_YEARS_OLD)),
        }
    }

    /// Build from configuration; `pivot` is the two-digit year window.
    pub fn from_config(config: &FieldConfig, pivot: i32) -> Result<Self, PolicyError> {
        let mut policy = Self::new(
            config.name.clone(),
            config.kind,
            config.line_threshold,
            config.max_row_gap,
            config.max_rows,
        );

        if let Some(filter) = &config.artifacts {
            policy.filter = filter.clone();
        }
        if config.kind.is_date() {
            let years = config.max_years_old.unwrap_or(DEFAULT_MAX_YEARS_OLD);
            policy.validator =
                Some(DateValidator::new(years).with_two_digit_year_pivot(pivot));
        }

        policy.check()?;
        Ok(policy)
    }

    pub fn with_validator(mut self, validator: Option<DateValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Reject policies that cannot work.
    pub fn check(&self) -> Result<(), PolicyError> {
        for (name, value) in [
            ("line_threshold", self.line_threshold),
            ("max_row_gap", self.max_row_gap),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PolicyError::InvalidThreshold {
                    field: self.name.clone(),
                    name,
                    value,
                });
            }
        }

        if self.max_rows == 0 {
            return Err(PolicyError::ZeroCardinality(self.name.clone()));
        }

        if self.max_row_gap < self.line_threshold {
            return Err(PolicyError::GapBelowLineThreshold {
                field: self.name.clone(),
                line_threshold: self.line_threshold,
                max_row_gap: self.max_row_gap,
            });
        }

        Ok(())
    }
}

/// Field name to policy lookup, resolved once when configuration loads.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, FieldPolicy>,
    order: Vec<String>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every configured field into a checked policy.
    pub fn from_config(config: &ClaimxConfig) -> Result<Self, PolicyError> {
        let mut registry = Self::new();
        for field in &config.fields {
            registry.register(FieldPolicy::from_config(
                field,
                config.extraction.two_digit_year_pivot,
            )?)?;
        }
        Ok(registry)
    }

    /// Add or replace a policy.
    pub fn register(&mut self, policy: FieldPolicy) -> Result<(), PolicyError> {
        policy.check()?;
        if !self.policies.contains_key(&policy.name) {
            self.order.push(policy.name.clone());
        }
        self.policies.insert(policy.name.clone(), policy);
        Ok(())
    }

    /// Policy for a field name.
    pub fn get(&self, name: &str) -> Result<&FieldPolicy, PolicyError> {
        self.policies
            .get(name)
            .ok_or_else(|| PolicyError::UnknownField(name.to_string()))
    }

    /// Policies in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldPolicy> {
        self.order.iter().filter_map(|name| self.policies.get(name))
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_from_default_config() {
        let registry = PolicyRegistry::from_config(&ClaimxConfig::default()).unwrap();

        assert_eq!(registry.len(), 8);
        let birth = registry.get("birth_date").unwrap();
        assert_eq!(birth.formatter, Formatter::Date);
        assert_eq!(birth.validator.unwrap().max_years_old(), 110);

        let charges = registry.get("charges").unwrap();
        assert_eq!(charges.max_rows, 6);
        assert!(charges.validator.is_none());
        assert_eq!(registry.iter().next().unwrap().name, "insured_id");
    }

    #[test]
    fn test_unknown_field() {
        let registry = PolicyRegistry::new();
        assert_eq!(
            registry.get("nope").unwrap_err(),
            PolicyError::UnknownField("nope".to_string())
        );
    }

    #[test]
    fn test_invalid_thresholds_fail_fast() {
        let policy = FieldPolicy::new("charges", FieldKind::Currency, 0.0, 1.5, 6);
        assert!(matches!(policy.check(), Err(PolicyError::InvalidThreshold { .. })));

        let policy = FieldPolicy::new("charges", FieldKind::Currency, f32::NAN, 1.5, 6);
        assert!(policy.check().is_err());

        let policy = FieldPolicy::new("charges", FieldKind::Currency, 0.2, 1.5, 0);
        assert_eq!(policy.check(), Err(PolicyError::ZeroCardinality("charges".to_string())));

        let policy = FieldPolicy::new("charges", FieldKind::Currency, 2.0, 1.5, 6);
        assert!(matches!(policy.check(), Err(PolicyError::GapBelowLineThreshold { .. })));
    }

    #[test]
    fn test_config_artifact_override() {
        let mut config = FieldConfig::new("charges", FieldKind::Currency, 20.0, 200.0, 6);
        config.artifacts = Some(ArtifactFilter::for_quantity());

        let policy = FieldPolicy::from_config(&config, 0).unwrap();
        assert_eq!(policy.filter, ArtifactFilter::for_quantity());
        assert_eq!(policy.formatter, Formatter::Currency);
    }
}
