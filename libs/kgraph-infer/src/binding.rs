//! Variable bindings
//!
//! A [`Binding`] maps variable names (with their `?` sigil) to concrete
//! values. Entries are write-once: rebinding succeeds only when the new
//! value equals the existing one. The evaluator branches by cloning, so an
//! ancestor binding is never mutated by a sibling branch.

use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// A set of variable bindings; insertion-ordered for deterministic answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    vars: IndexMap<String, Value>,
}

impl Binding {
    /// Create an empty binding
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a value.
    ///
    /// Returns `true` if the binding is compatible: the variable was free,
    /// or already bound to an equal value. Returns `false` on conflict; the
    /// existing value is kept.
    pub fn bind(&mut self, var: &str, value: Value) -> bool {
        match self.vars.get(var) {
            Some(existing) => *existing == value,
            None => {
                self.vars.insert(var.to_string(), value);
                true
            }
        }
    }

    /// Get the value bound to a variable
    pub fn get(&self, var: &str) -> Option<&Value> {
        self.vars.get(var)
    }

    /// Check if a variable is bound
    pub fn contains(&self, var: &str) -> bool {
        self.vars.contains_key(var)
    }

    /// Iterate over (variable, value) pairs in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Snapshot of the bindings as a plain map
    pub fn as_map(&self) -> IndexMap<String, Value> {
        self.vars.clone()
    }

    /// Consume the binding into its underlying map
    pub fn into_map(self) -> IndexMap<String, Value> {
        self.vars
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, value)) in self.vars.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", var, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_is_write_once() {
        let mut binding = Binding::new();
        assert!(binding.bind("?x", Value::Int(1)));
        assert!(binding.bind("?x", Value::Int(1)));
        assert!(!binding.bind("?x", Value::Int(2)));
        assert_eq!(binding.get("?x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_clone_isolates_branches() {
        let mut base = Binding::new();
        base.bind("?x", Value::Int(1));

        let mut branch = base.clone();
        branch.bind("?y", Value::Int(2));

        assert!(!base.contains("?y"));
        assert!(branch.contains("?x"));
    }
}
