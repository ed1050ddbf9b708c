//! Dependency ordering for formulas
//!
//! A formula may read the key of another formula. When computed values are
//! fed forward, each formula must run after the formulas it reads, whatever
//! order the fields are displayed in.

use crate::validator::referenced_variables;
use ahash::AHashMap;

/// Formula keys split into an evaluation order and circular leftovers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationOrder {
    /// Keys whose formula inputs all appear earlier in this list
    pub ordered: Vec<String>,
    /// Keys on a circular reference, or reading from one
    pub circular: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
    Circular,
}

/// Graph from formula keys to the variables their formulas read
///
/// Variables that are not themselves registered formulas are plain inputs
/// and impose no ordering.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Formula key → variables it references
    precedents: AHashMap<String, Vec<String>>,
    /// Formula keys in registration order
    keys: Vec<String>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the formula computing `key`, replacing any earlier one
    pub fn add_formula(&mut self, key: impl Into<String>, formula: &str) {
        let key = key.into();
        if !self.precedents.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.precedents.insert(key, referenced_variables(formula));
    }

    /// Variables read by the formula for `key`
    pub fn precedents(&self, key: &str) -> impl Iterator<Item = &str> + '_ {
        self.precedents
            .get(key)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    /// Order the registered formulas so each one follows its inputs.
    ///
    /// Independent formulas keep their registration order.
    ///
    /// # Example
    /// ```rust
    /// use branch_report_formula::DependencyGraph;
    ///
    /// let mut graph = DependencyGraph::new();
    /// graph.add_formula("E", "C * 2");
    /// graph.add_formula("C", "A - B");
    ///
    /// let order = graph.evaluation_order();
    /// assert_eq!(order.ordered, vec!["C", "E"]);
    /// assert!(order.circular.is_empty());
    /// ```
    pub fn evaluation_order(&self) -> EvaluationOrder {
        let mut marks: AHashMap<&str, Mark> = AHashMap::new();
        let mut order = EvaluationOrder::default();
        for key in &self.keys {
            self.visit(key, &mut marks, &mut order);
        }
        order
    }

    /// Depth-first visit; returns whether `key` can be evaluated
    fn visit<'a>(
        &'a self,
        key: &'a str,
        marks: &mut AHashMap<&'a str, Mark>,
        order: &mut EvaluationOrder,
    ) -> bool {
        let Some(precedents) = self.precedents.get(key) else {
            return true;
        };
        match marks.get(key) {
            Some(Mark::Done) => return true,
            Some(Mark::Visiting | Mark::Circular) => return false,
            None => {}
        }

        marks.insert(key, Mark::Visiting);
        let mut evaluable = true;
        for name in precedents {
            if !self.visit(name, marks, order) {
                evaluable = false;
            }
        }

        if evaluable {
            marks.insert(key, Mark::Done);
            order.ordered.push(key.to_string());
        } else {
            marks.insert(key, Mark::Circular);
            order.circular.push(key.to_string());
        }
        evaluable
    }
}
