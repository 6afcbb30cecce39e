//! Filtering over a fixed candidate set
//!
//! The simplest useful predicate: a relation given extensionally as a list
//! of tuples. Evaluation keeps every candidate consistent with the bound
//! input slots; free slots enumerate.

use kgraph_infer::{OutputMap, Predicate, Result, Value};

/// Predicate backed by a fixed list of candidate tuples.
///
/// All tuples must share one arity. A bound input slot filters candidates
/// by equality on that position; the surviving candidates are returned in
/// construction order.
pub struct FilterPredicate {
    data: Vec<Vec<Value>>,
}

impl FilterPredicate {
    pub fn new(data: Vec<Vec<Value>>) -> Self {
        debug_assert!(
            data.windows(2).all(|w| w[0].len() == w[1].len()),
            "candidate tuples must share one arity"
        );
        Self { data }
    }

    /// Convenience constructor for unary relations.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(values.into_iter().map(|v| vec![v]).collect())
    }
}

impl Predicate for FilterPredicate {
    fn arity(&self) -> Option<usize> {
        self.data.first().map(Vec::len)
    }

    fn eval_impl(&self, input: &[Option<Value>]) -> Result<Vec<OutputMap>> {
        let mut results = Vec::new();

        for candidate in &self.data {
            let consistent = candidate.iter().enumerate().all(|(i, value)| {
                match input.get(i).and_then(Option::as_ref) {
                    Some(bound) => bound == value,
                    None => true,
                }
            });
            if consistent {
                results.push(
                    candidate
                        .iter()
                        .cloned()
                        .enumerate()
                        .collect::<OutputMap>(),
                );
            }
        }

        tracing::trace!(candidates = self.data.len(), matched = results.len(), "filter predicate");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> FilterPredicate {
        FilterPredicate::new(vec![
            vec![Value::Str("Alice".into()), Value::Int(25)],
            vec![Value::Str("Bob".into()), Value::Int(35)],
            vec![Value::Str("Charlie".into()), Value::Int(40)],
        ])
    }

    #[test]
    fn test_all_slots_free_enumerates() {
        let outputs = people().eval_impl(&[None, None]).unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0][&0], Value::Str("Alice".into()));
        assert_eq!(outputs[0][&1], Value::Int(25));
    }

    #[test]
    fn test_bound_slot_filters() {
        let outputs = people()
            .eval_impl(&[Some(Value::Str("Bob".into())), None])
            .unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0][&1], Value::Int(35));
    }

    #[test]
    fn test_ground_test() {
        let hit = people()
            .eval_impl(&[Some(Value::Str("Bob".into())), Some(Value::Int(35))])
            .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = people()
            .eval_impl(&[Some(Value::Str("Bob".into())), Some(Value::Int(36))])
            .unwrap();
        assert!(miss.is_empty());
    }
}
