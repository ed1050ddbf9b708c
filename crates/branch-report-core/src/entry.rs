//! Branch entries
//!
//! An entry holds one branch's values for one period, keyed by field id.
//! Its status moves `Draft → Submitted → Locked`; branch users submit and
//! withdraw, admins confirm (lock) and unlock.

use crate::error::{Error, Result};
use crate::field::TemplateField;
use crate::template::ReportTemplate;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum EntryStatus {
    /// Being filled in by the branch
    #[default]
    Draft,
    /// Handed in, waiting for an admin
    Submitted,
    /// Confirmed by an admin; values are frozen
    Locked,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Draft => "DRAFT",
            EntryStatus::Submitted => "SUBMITTED",
            EntryStatus::Locked => "LOCKED",
        };
        f.write_str(s)
    }
}

/// One branch's values for a period
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Entry {
    pub id: String,
    pub branch_id: String,
    pub status: EntryStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    values: AHashMap<String, f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub submitted_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub submitted_by: Option<String>,
}

impl Entry {
    /// Create an empty draft entry
    pub fn new(id: impl Into<String>, branch_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            branch_id: branch_id.into(),
            ..Self::default()
        }
    }

    /// Stored value of a field
    pub fn value(&self, field_id: &str) -> Option<f64> {
        self.values.get(field_id).copied()
    }

    /// All stored values keyed by field id
    pub fn values(&self) -> &AHashMap<String, f64> {
        &self.values
    }

    /// Whether values may still change
    pub fn is_editable(&self) -> bool {
        self.status != EntryStatus::Locked
    }

    /// Store a value for a field
    pub fn set_value(&mut self, field_id: impl Into<String>, value: f64) -> Result<()> {
        if !self.is_editable() {
            return Err(Error::Locked);
        }
        self.values.insert(field_id.into(), value);
        Ok(())
    }

    /// Store raw form input for a field; see [`parse_input`]
    pub fn set_input(&mut self, field_id: impl Into<String>, input: &str) -> Result<()> {
        let value = parse_input(input)?;
        self.set_value(field_id, value)
    }

    /// Remove a stored value
    pub fn clear_value(&mut self, field_id: &str) -> Result<Option<f64>> {
        if !self.is_editable() {
            return Err(Error::Locked);
        }
        Ok(self.values.remove(field_id))
    }

    /// Required fields of `template` that have no stored value, in display order
    pub fn missing_required<'t>(&self, template: &'t ReportTemplate) -> Vec<&'t TemplateField> {
        template
            .active_fields()
            .filter(|f| f.is_required() && !self.values.contains_key(&f.id))
            .collect()
    }

    /// Hand the entry in. Only drafts with every required value can be submitted.
    pub fn submit(&mut self, template: &ReportTemplate, user: impl Into<String>) -> Result<()> {
        if self.status != EntryStatus::Draft {
            return Err(Error::InvalidTransition {
                action: "submit",
                status: self.status,
            });
        }

        let missing = self.missing_required(template);
        if !missing.is_empty() {
            return Err(Error::MissingValues(
                missing.iter().map(|f| f.label.clone()).collect(),
            ));
        }

        self.status = EntryStatus::Submitted;
        self.submitted_at = Some(Utc::now());
        self.submitted_by = Some(user.into());
        tracing::info!(entry = %self.id, branch = %self.branch_id, "entry submitted");
        Ok(())
    }

    /// Return a submitted entry to draft
    pub fn withdraw(&mut self) -> Result<()> {
        if self.status == EntryStatus::Locked {
            return Err(Error::InvalidTransition {
                action: "withdraw",
                status: self.status,
            });
        }
        self.status = EntryStatus::Draft;
        self.submitted_at = None;
        self.submitted_by = None;
        tracing::info!(entry = %self.id, "entry withdrawn");
        Ok(())
    }

    /// Lock a submitted entry
    pub fn confirm(&mut self) -> Result<()> {
        self.transition("confirm", EntryStatus::Submitted, EntryStatus::Locked)
    }

    /// Reopen a locked entry for review
    pub fn unlock(&mut self) -> Result<()> {
        self.transition("unlock", EntryStatus::Locked, EntryStatus::Submitted)
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: EntryStatus,
        to: EntryStatus,
    ) -> Result<()> {
        if self.status != from {
            return Err(Error::InvalidTransition {
                action,
                status: self.status,
            });
        }
        self.status = to;
        tracing::info!(entry = %self.id, %from, %to, "entry {action}");
        Ok(())
    }
}

/// Read a form input as a number; an empty input is `0`
pub fn parse_input(input: &str) -> Result<f64> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0.0);
    }
    match input.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(Error::InvalidValue(input.to_string())),
    }
}
