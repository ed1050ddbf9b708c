//! Field values for display
//!
//! Formula fields are computed from the stored values of the template's
//! keyed fields. Fields that have not been filled in count as `0`, so a
//! half-finished entry still shows running totals.

use crate::entry::Entry;
use crate::field::TemplateField;
use crate::template::ReportTemplate;
use ahash::AHashMap;
use branch_report_formula::{evaluate_formula_outcome, FormulaOutcome};

/// Stored values of every active keyed field, keyed by field key
pub fn key_values(template: &ReportTemplate, entry: &Entry) -> AHashMap<String, f64> {
    template
        .active_fields()
        .filter_map(|f| {
            let key = f.key.as_ref()?;
            Some((key.clone(), entry.value(&f.id).unwrap_or(0.0)))
        })
        .collect()
}

/// Value of `field` for `entry`, keeping soft formula failures visible.
///
/// Non-formula fields are never soft failures.
pub fn calculate_field_outcome(
    template: &ReportTemplate,
    entry: &Entry,
    field: &TemplateField,
) -> FormulaOutcome {
    match &field.formula {
        Some(formula) => evaluate_formula_outcome(formula, &key_values(template, entry)),
        None => FormulaOutcome::Computed(entry.value(&field.id).unwrap_or(0.0)),
    }
}

/// Value of `field` for `entry`: computed for formula fields, stored otherwise
pub fn calculate_field(template: &ReportTemplate, entry: &Entry, field: &TemplateField) -> f64 {
    calculate_field_outcome(template, entry, field).value()
}
