//! Period summaries across branches
//!
//! Entered fields are summed over all entries; formula fields are then
//! evaluated against those totals, inputs first, so a margin row shows the
//! margin of the totals rather than a sum of margins.

use crate::calculation::evaluate_formulas;
use ahash::AHashMap;
use branch_report_core::{Entry, EntryStatus, ReportTemplate};

/// Totals for one field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SummaryRow {
    pub field_id: String,
    pub key: Option<String>,
    pub label: String,
    pub total: f64,
}

/// Totals of a period over its entries
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PeriodSummary {
    pub rows: Vec<SummaryRow>,
    pub entry_count: usize,
    pub draft: usize,
    pub submitted: usize,
    pub locked: usize,
}

impl PeriodSummary {
    /// Total of the field with `key`
    pub fn total(&self, key: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.as_deref() == Some(key))
            .map(|r| r.total)
    }
}

/// Sum a period's entries field by field
pub fn summarize<'a, I>(template: &ReportTemplate, entries: I) -> PeriodSummary
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut summary = PeriodSummary::default();
    let mut totals: AHashMap<String, f64> = AHashMap::new();

    for entry in entries {
        summary.entry_count += 1;
        match entry.status {
            EntryStatus::Draft => summary.draft += 1,
            EntryStatus::Submitted => summary.submitted += 1,
            EntryStatus::Locked => summary.locked += 1,
        }

        for field in template.active_fields().filter(|f| f.formula.is_none()) {
            let value = entry.value(&field.id).unwrap_or(0.0);
            *totals.entry(field.id.clone()).or_insert(0.0) += value;
        }
    }

    let mut by_key: AHashMap<String, f64> = template
        .active_fields()
        .filter(|f| f.formula.is_none())
        .filter_map(|f| {
            let key = f.key.clone()?;
            Some((key, totals.get(&f.id).copied().unwrap_or(0.0)))
        })
        .collect();

    let computed = evaluate_formulas(template, &mut by_key);

    for field in template.active_fields().filter(|f| !f.is_section()) {
        let total = match computed.get(&field.id) {
            Some(outcome) => outcome.value(),
            None => totals.get(&field.id).copied().unwrap_or(0.0),
        };

        summary.rows.push(SummaryRow {
            field_id: field.id.clone(),
            key: field.key.clone(),
            label: field.label.clone(),
            total,
        });
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use branch_report_core::NewField;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, revenue: f64, expenses: f64) -> Entry {
        let mut entry = Entry::new(id, format!("branch-{id}"));
        entry.set_value("revenue", revenue).unwrap();
        entry.set_value("expenses", expenses).unwrap();
        entry
    }

    #[test]
    fn test_summarize_totals() {
        let template = ReportTemplate::monthly_report();
        let mut locked = entry("2", 3000.0, 2000.0);
        locked.submit(&template, "u").unwrap();
        locked.confirm().unwrap();
        let entries = vec![entry("1", 1000.0, 600.0), locked];

        let summary = summarize(&template, &entries);
        assert_eq!(summary.entry_count, 2);
        assert_eq!(summary.draft, 1);
        assert_eq!(summary.locked, 1);
        assert_eq!(summary.total("A"), Some(4000.0));
        assert_eq!(summary.total("B"), Some(2600.0));
        assert_eq!(summary.total("C"), Some(1400.0));
        // Margin of totals, not a sum of margins
        assert_eq!(summary.total("D"), Some(1400.0 / 4000.0));
    }

    #[test]
    fn test_summarize_formula_shown_before_its_input() {
        let mut template = ReportTemplate::monthly_report();
        let double = template
            .add_field(NewField::value("Double Profit", "E").with_formula("C * 2"))
            .unwrap()
            .id
            .clone();
        template.reorder(&[(double.as_str(), 0)]).unwrap();
        let entries = vec![entry("1", 1000.0, 600.0)];

        let summary = summarize(&template, &entries);
        assert_eq!(summary.rows[0].key.as_deref(), Some("E"));
        assert_eq!(summary.total("E"), Some(800.0));
        assert_eq!(summary.total("C"), Some(400.0));
    }

    #[test]
    fn test_summarize_circular_formulas_are_zero() {
        let mut template = ReportTemplate::monthly_report();
        template
            .add_field(NewField::value("Double Profit", "E").with_formula("C * 2"))
            .unwrap();
        template
            .update_formula("profit", Some("E + 1".into()))
            .unwrap();
        let entries = vec![entry("1", 1000.0, 600.0)];

        let summary = summarize(&template, &entries);
        assert_eq!(summary.total("C"), Some(0.0));
        assert_eq!(summary.total("E"), Some(0.0));
        assert_eq!(summary.total("D"), Some(0.4));
    }

    #[test]
    fn test_summarize_no_entries() {
        let template = ReportTemplate::monthly_report();
        let entries: Vec<Entry> = Vec::new();
        let summary = summarize(&template, &entries);
        assert_eq!(summary.entry_count, 0);
        assert_eq!(summary.rows.len(), 4);
        assert!(summary.rows.iter().all(|r| r.total == 0.0));
    }
}
