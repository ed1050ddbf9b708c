//! Entry calculation
//!
//! Computes every field of an entry in display order, the way the
//! data-entry page and the branch export show them.
//!
//! # Example
//!
//! ```rust
//! use branch_report::prelude::*;
//!
//! let template = ReportTemplate::monthly_report();
//! let mut entry = Entry::new("entry-1", "branch-1");
//! entry.set_value("revenue", 1000.0).unwrap();
//! entry.set_value("expenses", 600.0).unwrap();
//!
//! let calculated = entry.calculate(&template);
//! assert_eq!(calculated.value("C"), Some(400.0));
//! assert_eq!(calculated.stats.formula_count, 2);
//! ```

use ahash::AHashMap;
use branch_report_core::{key_values, Entry, ReportTemplate, TemplateField};
use branch_report_formula::{
    evaluate_formula_outcome, DependencyGraph, FormulaError, FormulaOutcome,
};

/// Options for entry calculation
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    /// Emit a row (without value) for each section header
    pub include_sections: bool,
    /// Feed computed values of formula fields into the formulas that read
    /// them, evaluating inputs first. When off, formulas read only the
    /// stored values of their inputs.
    pub recompute_formula_inputs: bool,
    /// Round displayed values to this many decimal places
    pub round_to: Option<u32>,
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalculationStats {
    /// Number of value and formula fields calculated
    pub field_count: usize,
    /// Number of formula fields among them
    pub formula_count: usize,
    /// Formula fields shown as 0 because their formula is malformed or
    /// circular
    pub soft_failures: usize,
    /// Required fields without a stored value
    pub missing_inputs: usize,
}

/// One displayed field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalculatedRow {
    pub field_id: String,
    pub key: Option<String>,
    pub label: String,
    pub formula: Option<String>,
    /// `None` for section headers
    pub value: Option<f64>,
    pub is_section: bool,
    /// Value is a stand-in for a malformed or circular formula
    pub soft_failed: bool,
}

/// Every field of an entry with its displayed value
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalculatedEntry {
    pub rows: Vec<CalculatedRow>,
    pub stats: CalculationStats,
}

impl CalculatedEntry {
    /// Displayed value of the field with `key`
    pub fn value(&self, key: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.as_deref() == Some(key))
            .and_then(|r| r.value)
    }
}

/// Extension trait for [`Entry`] to add calculation methods
pub trait EntryCalculationExt {
    /// Calculate all fields with default options
    fn calculate(&self, template: &ReportTemplate) -> CalculatedEntry;

    /// Calculate all fields with custom options
    fn calculate_with_options(
        &self,
        template: &ReportTemplate,
        options: &CalculationOptions,
    ) -> CalculatedEntry;
}

impl EntryCalculationExt for Entry {
    fn calculate(&self, template: &ReportTemplate) -> CalculatedEntry {
        self.calculate_with_options(template, &CalculationOptions::default())
    }

    fn calculate_with_options(
        &self,
        template: &ReportTemplate,
        options: &CalculationOptions,
    ) -> CalculatedEntry {
        let mut values = key_values(template, self);
        let mut computed = if options.recompute_formula_inputs {
            evaluate_formulas(template, &mut values)
        } else {
            AHashMap::new()
        };
        let mut result = CalculatedEntry::default();

        for field in template.active_fields() {
            if field.is_section() {
                if options.include_sections {
                    result.rows.push(row(field, None, false));
                }
                continue;
            }

            result.stats.field_count += 1;
            if field.is_required() && self.value(&field.id).is_none() {
                result.stats.missing_inputs += 1;
            }

            let outcome = match &field.formula {
                Some(formula) => {
                    result.stats.formula_count += 1;
                    computed
                        .remove(&field.id)
                        .unwrap_or_else(|| evaluate_formula_outcome(formula, &values))
                }
                None => FormulaOutcome::Computed(self.value(&field.id).unwrap_or(0.0)),
            };

            let soft_failed = outcome.is_soft_failure();
            if soft_failed {
                result.stats.soft_failures += 1;
            }
            let value = round(outcome.value(), options.round_to);
            result.rows.push(row(field, Some(value), soft_failed));
        }

        if result.stats.soft_failures > 0 {
            tracing::warn!(
                entry = %self.id,
                template = %template.id,
                soft_failures = result.stats.soft_failures,
                "some formula fields could not be evaluated and show 0"
            );
        }

        result
    }
}

/// Evaluate every active formula field after the formulas it reads.
///
/// Each result is written back into `values` under the field's key so later
/// formulas see it. Fields on a circular reference soft-fail. Outcomes are
/// keyed by field id.
pub(crate) fn evaluate_formulas(
    template: &ReportTemplate,
    values: &mut AHashMap<String, f64>,
) -> AHashMap<String, FormulaOutcome> {
    let mut graph = DependencyGraph::new();
    let mut by_key: AHashMap<&str, &TemplateField> = AHashMap::new();
    for field in template.active_fields() {
        if let (Some(key), Some(formula)) = (&field.key, &field.formula) {
            graph.add_formula(key.as_str(), formula);
            by_key.insert(key.as_str(), field);
        }
    }

    let order = graph.evaluation_order();
    let mut outcomes = AHashMap::new();
    for key in &order.ordered {
        let Some(field) = by_key.get(key.as_str()) else {
            continue;
        };
        let formula = field.formula.as_deref().unwrap_or_default();
        let outcome = evaluate_formula_outcome(formula, &*values);
        values.insert(key.clone(), outcome.value());
        outcomes.insert(field.id.clone(), outcome);
    }
    for key in &order.circular {
        if let Some(field) = by_key.get(key.as_str()) {
            tracing::debug!(field = %field.id, key = %key, "circular formula, using 0");
            let error = FormulaError::CircularReference(key.clone());
            outcomes.insert(field.id.clone(), FormulaOutcome::SoftFailed(error));
        }
    }
    outcomes
}

fn row(field: &TemplateField, value: Option<f64>, soft_failed: bool) -> CalculatedRow {
    CalculatedRow {
        field_id: field.id.clone(),
        key: field.key.clone(),
        label: field.label.clone(),
        formula: field.formula.clone(),
        value,
        is_section: field.is_section(),
        soft_failed,
    }
}

/// Round to `places` decimals for display
pub(crate) fn round(value: f64, places: Option<u32>) -> f64 {
    match places {
        Some(places) => {
            let factor = 10f64.powi(places.min(15) as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}
