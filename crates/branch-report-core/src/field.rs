//! Template fields
//!
//! A field is either a **section** (top level, no key, groups child fields)
//! or a **value field** identified by a key. Value fields with a formula are
//! computed from the other keys of the template instead of being entered.

use crate::error::{Error, Result};
use lazy_regex::regex_is_match;

/// A field of a report template
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TemplateField {
    /// Stable identifier; entry values are stored under it
    pub id: String,
    /// Display label
    pub label: String,
    /// Variable name used by formulas; `None` for sections
    #[cfg_attr(feature = "serde", serde(default))]
    pub key: Option<String>,
    /// Formula computing this field, e.g. `"A - B"`
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula: Option<String>,
    /// Section this field belongs to
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent_id: Option<String>,
    /// Display position within the template
    #[cfg_attr(feature = "serde", serde(default))]
    pub order: u32,
    /// Inactive fields are kept for history but skipped by calculation
    #[cfg_attr(feature = "serde", serde(default = "default_active"))]
    pub is_active: bool,
}

#[cfg(feature = "serde")]
fn default_active() -> bool {
    true
}

impl TemplateField {
    /// Create an active value field
    pub fn new(id: impl Into<String>, label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            key: Some(key.into()),
            formula: None,
            parent_id: None,
            order: 0,
            is_active: true,
        }
    }

    /// Create a section header
    pub fn section(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            key: None,
            formula: None,
            parent_id: None,
            order: 0,
            is_active: true,
        }
    }

    /// Builder: set the formula
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Builder: set the parent section
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Builder: set the display order
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Top-level field without a key
    pub fn is_section(&self) -> bool {
        self.parent_id.is_none() && self.key.is_none()
    }

    /// Field whose value comes from its formula
    pub fn is_computed(&self) -> bool {
        self.formula.is_some()
    }

    /// Field a branch user has to fill in before submitting
    pub fn is_required(&self) -> bool {
        self.is_active && !self.is_section() && !self.is_computed()
    }
}

/// Request to add a field to a template
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct NewField {
    pub label: String,
    pub key: Option<String>,
    pub formula: Option<String>,
    pub parent_id: Option<String>,
}

impl NewField {
    /// A value field with the given label and key
    pub fn value(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// A section header
    pub fn section(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Builder: set the formula
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Builder: set the parent section
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Trim a key and check it is a formula identifier
pub fn normalize_key(key: &str) -> Result<String> {
    let key = key.trim();
    if regex_is_match!(r"^[A-Za-z_][A-Za-z0-9_]*$", key) {
        Ok(key.to_string())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

/// Treat blank optional text as absent
pub(crate) fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
