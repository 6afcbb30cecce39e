//! Predicate contract and registry
//!
//! Predicates are externally implemented relations. The engine hands them
//! the argument tuple as index-addressed slots - bound slots carry a value,
//! free slots are `None` - and the predicate answers with every candidate
//! assignment consistent with the bound slots. The engine then merges each
//! candidate back into the current binding, discarding candidates that
//! conflict with already-bound variables.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

/// One candidate assignment: argument index to concrete value.
pub type OutputMap = HashMap<usize, Value>;

/// An externally implemented relation.
pub trait Predicate: Send + Sync {
    /// Number of argument slots, when fixed.
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Names of annotations a parameterised predicate understands.
    fn annotations(&self) -> Vec<String> {
        Vec::new()
    }

    /// Enumerate all satisfying assignments of the argument tuple.
    ///
    /// `input` has one slot per argument: `Some(value)` for arguments that
    /// are bound (or literal) at the call site, `None` for free variables.
    fn eval_impl(&self, input: &[Option<Value>]) -> Result<Vec<OutputMap>>;
}

/// Registry mapping predicate names to implementations.
///
/// Read-only during evaluation; an unknown name at a call site is a hard
/// error.
#[derive(Default, Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Arc<dyn Predicate>>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate under the given name, replacing any previous
    /// registration.
    pub fn register(&mut self, name: impl Into<String>, predicate: Arc<dyn Predicate>) {
        self.predicates.insert(name.into(), predicate);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Predicate>> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
