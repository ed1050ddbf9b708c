//! Report templates
//!
//! A template is an ordered list of fields. All edits go through methods
//! that enforce the authoring rules, so a template never holds a formula
//! that references a key it does not define.
//!
//! ## Example
//!
//! ```rust
//! use branch_report_core::{NewField, ReportTemplate};
//!
//! let mut template = ReportTemplate::new("t1", "Monthly Report");
//! template.add_field(NewField::value("Revenue", "A")).unwrap();
//! template.add_field(NewField::value("Expenses", "B")).unwrap();
//! template
//!     .add_field(NewField::value("Profit", "C").with_formula("A - B"))
//!     .unwrap();
//!
//! // Unknown keys are rejected before they reach the template
//! let err = template
//!     .add_field(NewField::value("Margin", "D").with_formula("C / Z"))
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "Unknown field: Z");
//! ```

use crate::error::{Error, Result};
use crate::field::{non_blank, normalize_key, NewField, TemplateField};
use ahash::AHashSet;
use branch_report_formula::{referenced_variables, validate_formula_variables};

/// A numeric report template
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    fields: Vec<TemplateField>,
}

/// A top-level field and the fields grouped under it
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    pub field: &'a TemplateField,
    pub children: Vec<&'a TemplateField>,
}

impl ReportTemplate {
    /// Create an empty template
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Build a template from already-stored fields, checking every formula.
    ///
    /// Fields are validated in order against the whole template, so a
    /// formula may reference a field stored after it.
    pub fn from_fields(
        id: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<TemplateField>,
    ) -> Result<Self> {
        let template = Self {
            id: id.into(),
            name: name.into(),
            fields,
        };
        template.check()?;
        Ok(template)
    }

    /// The seeded "Monthly Report" template
    pub fn monthly_report() -> Self {
        let fields = vec![
            TemplateField::new("revenue", "Revenue", "A").with_order(1),
            TemplateField::new("expenses", "Expenses", "B").with_order(2),
            TemplateField::new("profit", "Profit", "C")
                .with_formula("A - B")
                .with_order(3),
            TemplateField::new("profit-margin", "Profit Margin", "D")
                .with_formula("(A - B) / A")
                .with_order(4),
        ];
        Self {
            id: "monthly-report".to_string(),
            name: "Monthly Report".to_string(),
            fields,
        }
    }

    /// Re-check the authoring rules over every stored field
    pub fn check(&self) -> Result<()> {
        let mut seen = AHashSet::new();
        for field in &self.fields {
            if field.label.trim().is_empty() {
                return Err(Error::LabelRequired);
            }
            if let Some(key) = &field.key {
                if normalize_key(key)? != *key {
                    return Err(Error::InvalidKey(key.clone()));
                }
                if !seen.insert(key.as_str()) {
                    return Err(Error::DuplicateKey(key.clone()));
                }
            }
            if let Some(parent_id) = &field.parent_id {
                if field.key.is_none() {
                    return Err(Error::KeyRequired);
                }
                self.check_parent(parent_id)?;
            }
            if let Some(formula) = &field.formula {
                if field.is_section() {
                    return Err(Error::SectionFormula);
                }
                let available = self.keys_except(Some(&field.id));
                validate_formula_variables(formula, &available)?;
            }
        }
        Ok(())
    }

    /// All fields in storage order
    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    /// Fields sorted by display order
    pub fn fields_ordered(&self) -> Vec<&TemplateField> {
        let mut fields: Vec<&TemplateField> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    /// Active fields sorted by display order
    pub fn active_fields(&self) -> impl Iterator<Item = &TemplateField> {
        self.fields_ordered().into_iter().filter(|f| f.is_active)
    }

    /// Look up a field by id
    pub fn field(&self, id: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Look up a field by key
    pub fn field_by_key(&self, key: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.key.as_deref() == Some(key))
    }

    /// Keys of active fields; the names a formula may reference
    pub fn available_keys(&self) -> AHashSet<String> {
        self.keys_except(None)
    }

    /// Top-level fields, each with its children in display order
    pub fn sections(&self) -> Vec<Section<'_>> {
        let ordered = self.fields_ordered();
        ordered
            .iter()
            .filter(|f| f.parent_id.is_none())
            .map(|&field| Section {
                field,
                children: ordered
                    .iter()
                    .copied()
                    .filter(|c| c.parent_id.as_deref() == Some(field.id.as_str()))
                    .collect(),
            })
            .collect()
    }

    /// Add a field.
    ///
    /// The label must be non-blank, child fields need a key, keys must be
    /// unique identifiers, and a formula may only reference keys of other
    /// fields in this template. The new field is placed last.
    pub fn add_field(&mut self, new: NewField) -> Result<&TemplateField> {
        let label = new.label.trim();
        if label.is_empty() {
            return Err(Error::LabelRequired);
        }

        let key = non_blank(new.key).map(|k| normalize_key(&k)).transpose()?;
        let parent_id = non_blank(new.parent_id);
        let formula = non_blank(new.formula);

        if let Some(parent_id) = &parent_id {
            if key.is_none() {
                return Err(Error::KeyRequired);
            }
            self.check_parent(parent_id)?;
        }
        if let Some(key) = &key {
            if self.field_by_key(key).is_some() {
                return Err(Error::DuplicateKey(key.clone()));
            }
        }
        if let Some(formula) = &formula {
            if key.is_none() {
                return Err(Error::SectionFormula);
            }
            validate_formula_variables(formula, &self.available_keys())?;
        }

        let order = self
            .fields
            .iter()
            .map(|f| f.order + 1)
            .max()
            .unwrap_or(0);
        let field = TemplateField {
            id: self.fresh_id(),
            label: label.to_string(),
            key,
            formula,
            parent_id,
            order,
            is_active: true,
        };
        tracing::debug!(template = %self.id, field = %field.id, "added template field");

        self.fields.push(field);
        Ok(&self.fields[self.fields.len() - 1])
    }

    /// Replace or clear a field's formula
    pub fn update_formula(&mut self, field_id: &str, formula: Option<String>) -> Result<()> {
        let formula = non_blank(formula);
        let field = self
            .field(field_id)
            .ok_or_else(|| Error::FieldNotFound(field_id.to_string()))?;

        if let Some(formula) = &formula {
            if field.key.is_none() {
                return Err(Error::SectionFormula);
            }
            validate_formula_variables(formula, &self.keys_except(Some(field_id)))?;
        }

        if let Some(field) = self.fields.iter_mut().find(|f| f.id == field_id) {
            field.formula = formula;
        }
        Ok(())
    }

    /// Remove a field that has no children and whose key no formula reads
    pub fn remove_field(&mut self, field_id: &str) -> Result<TemplateField> {
        let index = self
            .fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or_else(|| Error::FieldNotFound(field_id.to_string()))?;

        if self
            .fields
            .iter()
            .any(|f| f.parent_id.as_deref() == Some(field_id))
        {
            return Err(Error::HasChildren);
        }
        self.check_unreferenced(&self.fields[index])?;

        let removed = self.fields.remove(index);
        tracing::debug!(template = %self.id, field = %removed.id, "removed template field");
        Ok(removed)
    }

    /// Set the display order of several fields at once.
    ///
    /// Either every id is found and all orders are applied, or nothing
    /// changes.
    pub fn reorder(&mut self, orders: &[(&str, u32)]) -> Result<()> {
        if let Some((missing, _)) = orders.iter().find(|(id, _)| self.field(id).is_none()) {
            return Err(Error::FieldNotFound(missing.to_string()));
        }
        for (id, order) in orders {
            if let Some(field) = self.fields.iter_mut().find(|f| f.id == *id) {
                field.order = *order;
            }
        }
        Ok(())
    }

    /// Mark a field inactive. Rejected while another formula reads its key.
    pub fn deactivate(&mut self, field_id: &str) -> Result<()> {
        let field = self
            .field(field_id)
            .ok_or_else(|| Error::FieldNotFound(field_id.to_string()))?;
        self.check_unreferenced(field)?;

        if let Some(field) = self.fields.iter_mut().find(|f| f.id == field_id) {
            field.is_active = false;
        }
        Ok(())
    }

    fn check_unreferenced(&self, field: &TemplateField) -> Result<()> {
        let Some(key) = &field.key else {
            return Ok(());
        };
        let reader = self.fields.iter().find(|f| {
            f.id != field.id
                && f
                    .formula
                    .as_deref()
                    .is_some_and(|formula| referenced_variables(formula).contains(key))
        });
        match reader {
            Some(reader) => Err(Error::KeyReferenced {
                key: key.clone(),
                field: reader.label.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_parent(&self, parent_id: &str) -> Result<()> {
        match self.field(parent_id) {
            Some(parent) if parent.is_section() => Ok(()),
            _ => Err(Error::InvalidParent(parent_id.to_string())),
        }
    }

    fn keys_except(&self, field_id: Option<&str>) -> AHashSet<String> {
        self.fields
            .iter()
            .filter(|f| f.is_active && Some(f.id.as_str()) != field_id)
            .filter_map(|f| f.key.clone())
            .collect()
    }

    fn fresh_id(&self) -> String {
        (self.fields.len() + 1..)
            .map(|n| format!("{}-f{}", self.id, n))
            .find(|id| self.field(id).is_none())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branch_report_formula::FormulaError;
    use pretty_assertions::assert_eq;

    fn base() -> ReportTemplate {
        let mut t = ReportTemplate::new("t", "Monthly");
        t.add_field(NewField::value("Revenue", "A")).unwrap();
        t.add_field(NewField::value("Expenses", "B")).unwrap();
        t
    }

    #[test]
    fn test_add_field_assigns_id_and_order() {
        let t = base();
        let fields = t.fields();
        assert_eq!(fields[0].id, "t-f1");
        assert_eq!(fields[0].order, 0);
        assert_eq!(fields[1].id, "t-f2");
        assert_eq!(fields[1].order, 1);
    }

    #[test]
    fn test_add_formula_field() {
        let mut t = base();
        let profit = t
            .add_field(NewField::value("Profit", "C").with_formula("A - B"))
            .unwrap();
        assert_eq!(profit.formula.as_deref(), Some("A - B"));
    }

    #[test]
    fn test_reject_unknown_key_in_formula() {
        let mut t = base();
        let err = t
            .add_field(NewField::value("Profit", "C").with_formula("A - Z"))
            .unwrap_err();
        assert_eq!(err, Error::Formula(FormulaError::UnknownVariable("Z".into())));
        assert_eq!(t.fields().len(), 2);
    }

    #[test]
    fn test_reject_self_reference() {
        let mut t = base();
        assert!(t
            .add_field(NewField::value("Loop", "C").with_formula("C + 1"))
            .is_err());
    }

    #[test]
    fn test_label_and_key_rules() {
        let mut t = base();
        assert_eq!(
            t.add_field(NewField::value("  ", "X")).unwrap_err(),
            Error::LabelRequired
        );
        assert_eq!(
            t.add_field(NewField::value("Again", "A")).unwrap_err(),
            Error::DuplicateKey("A".into())
        );
        assert_eq!(
            t.add_field(NewField::value("Bad", "1x")).unwrap_err(),
            Error::InvalidKey("1x".into())
        );
    }

    #[test]
    fn test_blank_formula_is_none() {
        let mut t = base();
        let f = t
            .add_field(NewField::value("Other", "C").with_formula("   "))
            .unwrap();
        assert!(f.formula.is_none());
    }

    #[test]
    fn test_sections_and_children() {
        let mut t = ReportTemplate::new("t", "Sectioned");
        let income = t.add_field(NewField::section("Income")).unwrap().id.clone();
        t.add_field(NewField::value("Revenue", "A").with_parent(&income))
            .unwrap();
        t.add_field(NewField::value("Other", "B").with_parent(&income))
            .unwrap();
        t.add_field(NewField::value("Total", "T").with_formula("A + B"))
            .unwrap();

        let sections = t.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].field.label, "Income");
        let child_keys: Vec<_> = sections[0]
            .children
            .iter()
            .map(|c| c.key.as_deref().unwrap())
            .collect();
        assert_eq!(child_keys, vec!["A", "B"]);
        assert!(sections[1].children.is_empty());
    }

    #[test]
    fn test_child_requires_key_and_section_parent() {
        let mut t = ReportTemplate::new("t", "Sectioned");
        let income = t.add_field(NewField::section("Income")).unwrap().id.clone();
        assert_eq!(
            t.add_field(NewField::section("Nested").with_parent(&income))
                .unwrap_err(),
            Error::KeyRequired
        );

        let a = t.add_field(NewField::value("Revenue", "A")).unwrap().id.clone();
        assert_eq!(
            t.add_field(NewField::value("Sub", "S").with_parent(&a))
                .unwrap_err(),
            Error::InvalidParent(a)
        );
    }

    #[test]
    fn test_section_cannot_have_formula() {
        let mut t = base();
        assert_eq!(
            t.add_field(NewField::section("Totals").with_formula("A + B"))
                .unwrap_err(),
            Error::SectionFormula
        );
    }

    #[test]
    fn test_update_formula() {
        let mut t = base();
        let id = t
            .add_field(NewField::value("Profit", "C"))
            .unwrap()
            .id
            .clone();
        t.update_formula(&id, Some("A - B".into())).unwrap();
        assert_eq!(t.field(&id).unwrap().formula.as_deref(), Some("A - B"));

        assert!(t.update_formula(&id, Some("C * 2".into())).is_err());
        t.update_formula(&id, None).unwrap();
        assert!(t.field(&id).unwrap().formula.is_none());
        assert_eq!(
            t.update_formula("nope", None).unwrap_err(),
            Error::FieldNotFound("nope".into())
        );
    }

    #[test]
    fn test_remove_field() {
        let mut t = ReportTemplate::new("t", "Sectioned");
        let income = t.add_field(NewField::section("Income")).unwrap().id.clone();
        let a = t
            .add_field(NewField::value("Revenue", "A").with_parent(&income))
            .unwrap()
            .id
            .clone();

        assert_eq!(t.remove_field(&income).unwrap_err(), Error::HasChildren);
        assert_eq!(t.remove_field(&a).unwrap().key.as_deref(), Some("A"));
        assert!(t.remove_field(&income).is_ok());
        assert!(t.fields().is_empty());
    }

    #[test]
    fn test_remove_referenced_key_rejected() {
        let mut t = ReportTemplate::monthly_report();
        assert_eq!(
            t.remove_field("expenses").unwrap_err(),
            Error::KeyReferenced {
                key: "B".into(),
                field: "Profit".into(),
            }
        );
        assert_eq!(t.fields().len(), 4);
        assert!(t.check().is_ok());

        // Formula fields themselves can go, after which their inputs are free
        t.remove_field("profit-margin").unwrap();
        t.remove_field("profit").unwrap();
        t.remove_field("expenses").unwrap();
        assert!(t.check().is_ok());
        assert_eq!(t.fields().len(), 1);
    }

    #[test]
    fn test_deactivate_referenced_key_rejected() {
        let mut t = ReportTemplate::monthly_report();
        assert_eq!(
            t.deactivate("revenue").unwrap_err(),
            Error::KeyReferenced {
                key: "A".into(),
                field: "Profit".into(),
            }
        );
        assert!(t.field("revenue").unwrap().is_active);

        t.deactivate("profit-margin").unwrap();
        assert!(t.check().is_ok());
        assert_eq!(
            t.deactivate("nope").unwrap_err(),
            Error::FieldNotFound("nope".into())
        );
    }

    #[test]
    fn test_check_rejects_untrimmed_key() {
        let fields = vec![
            TemplateField::new("a", "Revenue", " A"),
            TemplateField::new("c", "Double", "C").with_formula("A * 2"),
        ];
        assert_eq!(
            ReportTemplate::from_fields("t", "Padded", fields).unwrap_err(),
            Error::InvalidKey(" A".into())
        );
    }

    #[test]
    fn test_reorder_is_all_or_nothing() {
        let mut t = base();
        assert!(t.reorder(&[("t-f1", 5), ("missing", 0)]).is_err());
        assert_eq!(t.field("t-f1").unwrap().order, 0);

        t.reorder(&[("t-f1", 5), ("t-f2", 1)]).unwrap();
        let labels: Vec<_> = t.fields_ordered().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Expenses", "Revenue"]);
    }

    #[test]
    fn test_deactivated_key_not_available() {
        let mut t = base();
        t.deactivate("t-f2").unwrap();
        assert!(!t.available_keys().contains("B"));
        assert!(t
            .add_field(NewField::value("Profit", "C").with_formula("A - B"))
            .is_err());
    }

    #[test]
    fn test_monthly_report_is_valid() {
        let t = ReportTemplate::monthly_report();
        assert!(t.check().is_ok());
        assert_eq!(t.fields().len(), 4);
        assert_eq!(
            t.field_by_key("D").unwrap().formula.as_deref(),
            Some("(A - B) / A")
        );
    }

    #[test]
    fn test_from_fields_rejects_bad_formula() {
        let fields = vec![
            TemplateField::new("a", "Revenue", "A"),
            TemplateField::new("c", "Profit", "C").with_formula("A - B"),
        ];
        assert!(ReportTemplate::from_fields("t", "Broken", fields).is_err());
    }
}
