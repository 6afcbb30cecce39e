//! Recursive query evaluator
//!
//! `eval(node, binding)` produces every binding under which the node holds,
//! in depth-first source order. The evaluator never mutates the incoming
//! binding: each alternative derives from a clone, so sibling branches stay
//! independent and negation/aggregation bodies cannot leak bindings.
//!
//! Unbound values are `None` at the resolution boundary. A branch that
//! needs a ground value and does not get one is pruned silently; type
//! errors and unknown predicates abort the whole query.

use std::cmp::Ordering;
use std::collections::HashSet;

use indexmap::IndexSet;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::ast::{AggregateOp, ArithOp, AstNode};
use crate::binding::Binding;
use crate::compare::{compare_values, value_ordering};
use crate::error::{Error, Result};
use crate::predicate::PredicateRegistry;
use crate::value::{Value, ValueMap};

pub(crate) struct Evaluator<'a> {
    registry: &'a PredicateRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a PredicateRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate a node under a binding, returning all satisfying bindings.
    pub fn eval(&self, node: &AstNode, binding: &Binding) -> Result<Vec<Binding>> {
        match node {
            AstNode::And(terms) => self.eval_and(terms, binding),
            AstNode::Or(branches) => {
                let mut results = Vec::new();
                for branch in branches {
                    results.extend(self.eval(branch, binding)?);
                }
                Ok(results)
            }
            AstNode::Not(inner) => {
                // Bindings made inside the negation do not escape
                if self.eval(inner, binding)?.is_empty() {
                    Ok(vec![binding.clone()])
                } else {
                    Ok(Vec::new())
                }
            }
            AstNode::Group(inner) => self.eval(inner, binding),
            AstNode::Predicate { name, args } => self.eval_predicate(name, args, binding),
            AstNode::Unify { lhs, rhs } => {
                let mut derived = binding.clone();
                if self.unify(&mut derived, lhs, rhs)? {
                    Ok(vec![derived])
                } else {
                    Ok(Vec::new())
                }
            }
            AstNode::Equal { lhs, rhs } => {
                let (Some(left), Some(right)) =
                    (self.resolve(lhs, binding)?, self.resolve(rhs, binding)?)
                else {
                    return Ok(Vec::new());
                };
                if left == right {
                    Ok(vec![binding.clone()])
                } else {
                    Ok(Vec::new())
                }
            }
            AstNode::Compare { lhs, op, rhs } => {
                let (Some(left), Some(right)) =
                    (self.resolve(lhs, binding)?, self.resolve(rhs, binding)?)
                else {
                    return Ok(Vec::new());
                };
                if compare_values(&left, &right, *op)? {
                    Ok(vec![binding.clone()])
                } else {
                    Ok(Vec::new())
                }
            }
            AstNode::MathAssign { var, expr } => match self.eval_arith(expr, binding)? {
                Some(value) => {
                    let mut derived = binding.clone();
                    if derived.bind(var, value) {
                        Ok(vec![derived])
                    } else {
                        Ok(Vec::new())
                    }
                }
                None => Ok(Vec::new()),
            },
            AstNode::In { lhs, rhs } => self.eval_in(lhs, rhs, binding),
            AstNode::Subset { lhs, rhs } => self.eval_subset(lhs, rhs, binding),
            AstNode::Aggregate { op, var, body } => {
                // Statement-position aggregates are computed for their side
                // conditions only; the value is discarded.
                self.eval_aggregate(*op, var, body, binding)?;
                Ok(vec![binding.clone()])
            }
            // Standalone atoms, strings, and typed scalars hold trivially
            AstNode::Var(_)
            | AstNode::Literal(_)
            | AstNode::List(_)
            | AstNode::Map(_)
            | AstNode::Arith { .. } => Ok(vec![binding.clone()]),
        }
    }

    /// Conjunction fold: each term filters and extends the binding set.
    fn eval_and(&self, terms: &[AstNode], binding: &Binding) -> Result<Vec<Binding>> {
        let mut bindings = vec![binding.clone()];
        for term in terms {
            let mut next = Vec::new();
            for current in &bindings {
                next.extend(self.eval(term, current)?);
            }
            bindings = next;
            if bindings.is_empty() {
                break;
            }
        }
        Ok(bindings)
    }

    fn eval_predicate(
        &self,
        name: &str,
        args: &[AstNode],
        binding: &Binding,
    ) -> Result<Vec<Binding>> {
        let Some(predicate) = self.registry.get(name) else {
            return Err(Error::UnknownPredicate(name.to_string()));
        };

        let mut input: SmallVec<[Option<Value>; 8]> = SmallVec::with_capacity(args.len());
        for arg in args {
            match arg {
                AstNode::Var(var) => input.push(binding.get(var).cloned()),
                other => input.push(self.resolve(other, binding)?),
            }
        }

        tracing::trace!(predicate = name, slots = input.len(), "dispatching predicate");
        let outputs = predicate.eval_impl(&input)?;

        let mut results = Vec::new();
        'outputs: for output in outputs {
            let mut derived = binding.clone();
            for (i, arg) in args.iter().enumerate() {
                if let AstNode::Var(var) = arg {
                    if let Some(value) = output.get(&i) {
                        if !derived.bind(var, value.clone()) {
                            // Candidate conflicts with an existing binding
                            continue 'outputs;
                        }
                    }
                }
            }
            results.push(derived);
        }
        Ok(results)
    }

    /// Reduce a value-position node to a concrete value; `None` marks an
    /// unbound result.
    fn resolve(&self, node: &AstNode, binding: &Binding) -> Result<Option<Value>> {
        match node {
            AstNode::Var(name) => Ok(binding.get(name).cloned()),
            AstNode::Literal(value) => Ok(Some(value.clone())),
            AstNode::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match self.resolve(item, binding)? {
                        Some(value) => values.push(value),
                        None => return Ok(None),
                    }
                }
                Ok(Some(Value::List(values)))
            }
            AstNode::Map(pairs) => {
                let mut map = ValueMap::new();
                for (key_node, value_node) in pairs {
                    let (Some(key), Some(value)) = (
                        self.resolve(key_node, binding)?,
                        self.resolve(value_node, binding)?,
                    ) else {
                        return Ok(None);
                    };
                    // Duplicate keys: last write wins
                    map.insert(key, value);
                }
                Ok(Some(Value::Map(map)))
            }
            AstNode::Aggregate { op, var, body } => self.eval_aggregate(*op, var, body, binding),
            AstNode::Arith { .. } => self.eval_arith(node, binding),
            AstNode::Group(inner) => self.resolve(inner, binding),
            // Statement forms carry no value
            _ => Ok(None),
        }
    }

    /// Unification of two value positions: a free variable on exactly one
    /// side binds to the other side's value; two unbound sides succeed
    /// without recording anything; two ground sides must be structurally
    /// equal.
    fn unify(&self, binding: &mut Binding, lhs: &AstNode, rhs: &AstNode) -> Result<bool> {
        let left = self.resolve(lhs, binding)?;
        let right = self.resolve(rhs, binding)?;

        match (left, right) {
            (None, Some(value)) => Ok(match lhs {
                AstNode::Var(name) => binding.bind(name, value),
                _ => false,
            }),
            (Some(value), None) => Ok(match rhs {
                AstNode::Var(name) => binding.bind(name, value),
                _ => false,
            }),
            (None, None) => Ok(true),
            (Some(left), Some(right)) => Ok(left == right),
        }
    }

    fn eval_arith(&self, node: &AstNode, binding: &Binding) -> Result<Option<Value>> {
        match node {
            AstNode::Arith { op, lhs, rhs } => {
                let (Some(left), Some(right)) = (
                    self.eval_arith(lhs, binding)?,
                    self.eval_arith(rhs, binding)?,
                ) else {
                    return Ok(None);
                };
                apply_arith(*op, &left, &right)
            }
            AstNode::Var(name) => Ok(binding.get(name).cloned()),
            AstNode::Literal(value) => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    fn eval_in(&self, lhs: &AstNode, rhs: &AstNode, binding: &Binding) -> Result<Vec<Binding>> {
        // A literal map on the right keeps duplicate keys visible to the
        // entry-matching cases below.
        if let AstNode::Map(pairs) = rhs {
            let mut entries = Vec::with_capacity(pairs.len());
            for (key_node, value_node) in pairs {
                let (Some(key), Some(value)) = (
                    self.resolve(key_node, binding)?,
                    self.resolve(value_node, binding)?,
                ) else {
                    return Ok(Vec::new());
                };
                entries.push((key, value));
            }
            return self.eval_in_map_entries(lhs, &entries, binding);
        }

        match self.resolve(rhs, binding)? {
            Some(Value::Map(map)) => {
                let entries: Vec<(Value, Value)> =
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                self.eval_in_map_entries(lhs, &entries, binding)
            }
            Some(Value::List(items)) => match lhs {
                AstNode::Var(name) if !binding.contains(name) => Ok(items
                    .into_iter()
                    .map(|item| {
                        let mut derived = binding.clone();
                        derived.bind(name, item);
                        derived
                    })
                    .collect()),
                _ => match self.resolve(lhs, binding)? {
                    Some(value) => {
                        if items.contains(&value) {
                            Ok(vec![binding.clone()])
                        } else {
                            Ok(Vec::new())
                        }
                    }
                    None => Ok(Vec::new()),
                },
            },
            _ => Ok(Vec::new()),
        }
    }

    fn eval_in_map_entries(
        &self,
        lhs: &AstNode,
        entries: &[(Value, Value)],
        binding: &Binding,
    ) -> Result<Vec<Binding>> {
        match lhs {
            // Free variable: one binding per entry, bound to the singleton map
            AstNode::Var(name) if !binding.contains(name) => Ok(entries
                .iter()
                .map(|(key, value)| {
                    let mut sub = ValueMap::new();
                    sub.insert(key.clone(), value.clone());
                    let mut derived = binding.clone();
                    derived.bind(name, Value::Map(sub));
                    derived
                })
                .collect()),
            // Single-pair map literal: match the pattern against each entry
            AstNode::Map(pattern) => {
                if pattern.len() != 1 {
                    return Ok(Vec::new());
                }
                let (pattern_key, pattern_value) = &pattern[0];
                let mut results = Vec::new();
                for (key, value) in entries {
                    let mut derived = binding.clone();
                    if self.match_component(&mut derived, pattern_key, key)?
                        && self.match_component(&mut derived, pattern_value, value)?
                    {
                        results.push(derived);
                    }
                }
                Ok(results)
            }
            // Ground value: succeeds when it equals some entry value
            _ => match self.resolve(lhs, binding)? {
                Some(value) => {
                    if entries.iter().any(|(_, entry_value)| *entry_value == value) {
                        Ok(vec![binding.clone()])
                    } else {
                        Ok(Vec::new())
                    }
                }
                None => Ok(Vec::new()),
            },
        }
    }

    /// Match one pattern component (key or value position) against a
    /// candidate: variables bind or check, anything else must resolve and
    /// compare equal.
    fn match_component(
        &self,
        derived: &mut Binding,
        pattern: &AstNode,
        candidate: &Value,
    ) -> Result<bool> {
        match pattern {
            AstNode::Var(name) => Ok(derived.bind(name, candidate.clone())),
            other => match self.resolve(other, derived)? {
                Some(value) => Ok(value == *candidate),
                None => Ok(false),
            },
        }
    }

    fn eval_subset(&self, lhs: &AstNode, rhs: &AstNode, binding: &Binding) -> Result<Vec<Binding>> {
        match self.resolve(rhs, binding)? {
            Some(Value::List(right_items)) => {
                let Some(Value::List(left_items)) = self.resolve(lhs, binding)? else {
                    return Ok(Vec::new());
                };
                let right_set: HashSet<&Value> = right_items.iter().collect();
                if left_items.iter().all(|item| right_set.contains(item)) {
                    Ok(vec![binding.clone()])
                } else {
                    Ok(Vec::new())
                }
            }
            Some(Value::Map(right_map)) => match lhs {
                // Free variable: enumerate every non-empty sub-map
                AstNode::Var(name) if !binding.contains(name) => {
                    let entries: Vec<(&Value, &Value)> = right_map.iter().collect();
                    let n = entries.len();
                    let mut results = Vec::new();
                    for mask in 1_usize..(1 << n) {
                        let mut sub = ValueMap::new();
                        for (j, (key, value)) in entries.iter().enumerate() {
                            if mask & (1 << j) != 0 {
                                sub.insert((*key).clone(), (*value).clone());
                            }
                        }
                        let mut derived = binding.clone();
                        derived.bind(name, Value::Map(sub));
                        results.push(derived);
                    }
                    Ok(results)
                }
                // Map literal: try every same-size combination of entries
                AstNode::Map(pattern) => {
                    let size = pattern.len();
                    if right_map.len() < size {
                        return Ok(Vec::new());
                    }
                    let entries: Vec<(&Value, &Value)> = right_map.iter().collect();
                    let mut results = Vec::new();
                    for combo in entries.iter().cloned().combinations(size) {
                        if let Some(derived) = self.unify_map_pattern(binding, pattern, &combo)? {
                            results.push(derived);
                        }
                    }
                    Ok(results)
                }
                // Ground map: plain containment
                _ => match self.resolve(lhs, binding)? {
                    Some(Value::Map(left_map)) => {
                        let contained = left_map
                            .iter()
                            .all(|(key, value)| right_map.get(key) == Some(value));
                        if contained {
                            Ok(vec![binding.clone()])
                        } else {
                            Ok(Vec::new())
                        }
                    }
                    _ => Ok(Vec::new()),
                },
            },
            _ => Ok(Vec::new()),
        }
    }

    /// Unify a map-literal pattern against a candidate entry set, trying
    /// every alignment of pattern pairs to entries until one fits.
    fn unify_map_pattern(
        &self,
        binding: &Binding,
        pattern: &[(AstNode, AstNode)],
        candidate: &[(&Value, &Value)],
    ) -> Result<Option<Binding>> {
        for perm in candidate.iter().permutations(candidate.len()) {
            let mut derived = binding.clone();
            let mut matched = true;
            for ((pattern_key, pattern_value), entry) in pattern.iter().zip(perm) {
                let (key, value) = *entry;
                if !(self.match_component(&mut derived, pattern_key, key)?
                    && self.match_component(&mut derived, pattern_value, value)?)
                {
                    matched = false;
                    break;
                }
            }
            if matched {
                return Ok(Some(derived));
            }
        }
        Ok(None)
    }

    /// Evaluate an aggregation to its value (or `None` when undefined).
    /// The body runs under a clone of the binding, so the aggregate
    /// variable never leaks outward.
    fn eval_aggregate(
        &self,
        op: AggregateOp,
        var: &str,
        body: &[AstNode],
        binding: &Binding,
    ) -> Result<Option<Value>> {
        let scope = binding.clone();
        let sub_bindings = if body.len() == 1 {
            self.eval(&body[0], &scope)?
        } else {
            self.eval_and(body, &scope)?
        };

        let values: Vec<Value> = sub_bindings
            .iter()
            .filter_map(|b| b.get(var).cloned())
            .collect();

        Ok(match op {
            AggregateOp::Collection => Some(Value::List(values)),
            AggregateOp::Count => Some(Value::Int(values.len() as i64)),
            AggregateOp::Set => {
                let set: IndexSet<Value> = values.into_iter().collect();
                Some(Value::List(set.into_iter().collect()))
            }
            AggregateOp::Sum => numeric_sum(&values),
            AggregateOp::Average => {
                if values.is_empty() {
                    None
                } else {
                    numeric_sum(&values).and_then(|total| {
                        total
                            .as_f64()
                            .map(|sum| Value::Float(sum / values.len() as f64))
                    })
                }
            }
            AggregateOp::Min => extremum(&values, Ordering::Less)?,
            AggregateOp::Max => extremum(&values, Ordering::Greater)?,
        })
    }
}

/// Apply an arithmetic operator. Integer pairs stay integral (overflow
/// widens to float); division always produces a float, and division by
/// zero is an unbound result that prunes the branch.
fn apply_arith(op: ArithOp, left: &Value, right: &Value) -> Result<Option<Value>> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(match op {
            ArithOp::Add => a
                .checked_add(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 + *b as f64)),
            ArithOp::Sub => a
                .checked_sub(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 - *b as f64)),
            ArithOp::Mul => a
                .checked_mul(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 * *b as f64)),
            ArithOp::Div => {
                if *b == 0 {
                    return Ok(None);
                }
                Value::Float(*a as f64 / *b as f64)
            }
        })),
        _ => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                let offender = if left.is_number() { right } else { left };
                return Err(Error::TypeMismatch(format!(
                    "arithmetic on non-numeric value: {}",
                    offender.type_name()
                )));
            };
            Ok(Some(match op {
                ArithOp::Add => Value::Float(a + b),
                ArithOp::Sub => Value::Float(a - b),
                ArithOp::Mul => Value::Float(a * b),
                ArithOp::Div => {
                    if b == 0.0 {
                        return Ok(None);
                    }
                    Value::Float(a / b)
                }
            }))
        }
    }
}

/// Numeric sum; an empty input sums to integer zero, any non-numeric value
/// makes the whole aggregate unbound.
fn numeric_sum(values: &[Value]) -> Option<Value> {
    let mut acc = Value::Int(0);
    for value in values {
        acc = match (&acc, value) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 + *b as f64)),
            (Value::Int(a), Value::Float(b)) => Value::Float(*a as f64 + b),
            (Value::Float(a), Value::Int(b)) => Value::Float(a + *b as f64),
            (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            _ => return None,
        };
    }
    Some(acc)
}

/// Minimum/maximum per natural ordering; an empty input is unbound, and
/// ill-typed or unorderable values are as fatal here as in a direct
/// comparison.
fn extremum(values: &[Value], keep: Ordering) -> Result<Option<Value>> {
    let mut iter = values.iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let mut best = first.clone();
    for value in iter {
        if value_ordering(value, &best)? == keep {
            best = value.clone();
        }
    }
    Ok(Some(best))
}
