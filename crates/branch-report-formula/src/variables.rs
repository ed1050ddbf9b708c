//! Variable lookup used during evaluation and validation
//!
//! The engine only needs to ask "what is the value of `name`?" and "is
//! `name` a known key?". These traits let callers pass whatever map they
//! already hold instead of copying into a dedicated type.

use ahash::{AHashMap, AHashSet};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::BuildHasher;

/// A table of numeric values keyed by variable name
pub trait Variables {
    /// Look up a variable; `None` when the name is not in the table
    fn get_value(&self, name: &str) -> Option<f64>;
}

impl<S: BuildHasher> Variables for HashMap<String, f64, S> {
    fn get_value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<S: BuildHasher> Variables for HashMap<&str, f64, S> {
    fn get_value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Variables for AHashMap<String, f64> {
    fn get_value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Variables for BTreeMap<String, f64> {
    fn get_value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Variables for [(&str, f64)] {
    fn get_value(&self, name: &str) -> Option<f64> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

impl<const N: usize> Variables for [(&str, f64); N] {
    fn get_value(&self, name: &str) -> Option<f64> {
        self.as_slice().get_value(name)
    }
}

impl<T: Variables + ?Sized> Variables for &T {
    fn get_value(&self, name: &str) -> Option<f64> {
        (**self).get_value(name)
    }
}

/// A set of legal variable names
pub trait KeySet {
    /// Whether `name` is a known key
    fn contains_key(&self, name: &str) -> bool;
}

impl<S: BuildHasher> KeySet for HashSet<String, S> {
    fn contains_key(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<S: BuildHasher> KeySet for HashSet<&str, S> {
    fn contains_key(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl KeySet for AHashSet<String> {
    fn contains_key(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl KeySet for BTreeSet<String> {
    fn contains_key(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl KeySet for [&str] {
    fn contains_key(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

impl<const N: usize> KeySet for [&str; N] {
    fn contains_key(&self, name: &str) -> bool {
        self.as_slice().contains_key(name)
    }
}

impl<T: KeySet + ?Sized> KeySet for &T {
    fn contains_key(&self, name: &str) -> bool {
        (**self).contains_key(name)
    }
}
