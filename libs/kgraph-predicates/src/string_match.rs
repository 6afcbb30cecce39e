//! Fuzzy string lookup over a fixed corpus
//!
//! Arity 3: `(query, id, score)`. Given a bound query string, ranks the
//! indexed corpus by character-trigram similarity and emits `(query, id,
//! score)` tuples for the best matches. The `top_k` and `min_score` knobs
//! correspond to the predicate's advertised annotations.

use std::collections::HashSet;

use kgraph_infer::{OutputMap, Predicate, Result, Value};

const DEFAULT_TOP_K: usize = 10;

/// Predicate matching a query string against an `(id, text)` corpus.
pub struct StringMatchPredicate {
    entries: Vec<(Value, String)>,
    index: Vec<HashSet<[char; 3]>>,
    top_k: usize,
    min_score: f64,
}

impl StringMatchPredicate {
    pub fn new(entries: Vec<(Value, String)>) -> Self {
        let index = entries.iter().map(|(_, text)| trigrams(text)).collect();
        Self {
            entries,
            index,
            top_k: DEFAULT_TOP_K,
            min_score: 0.0,
        }
    }

    /// Keep at most `top_k` matches.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Drop matches scoring below `min_score` (0-100 scale).
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }
}

impl Predicate for StringMatchPredicate {
    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn annotations(&self) -> Vec<String> {
        vec!["top_k".into(), "min_score".into()]
    }

    fn eval_impl(&self, input: &[Option<Value>]) -> Result<Vec<OutputMap>> {
        // The query slot must be ground; otherwise there is nothing to rank.
        let Some(Some(Value::Str(query))) = input.first() else {
            return Ok(Vec::new());
        };

        let query_grams = trigrams(query);
        let mut scored: Vec<(usize, f64)> = self
            .index
            .iter()
            .enumerate()
            .map(|(i, grams)| (i, similarity(&query_grams, grams)))
            .filter(|(_, score)| *score >= self.min_score)
            .collect();

        // Ties resolve by corpus order for deterministic answers
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        tracing::trace!(query = %query, matches = scored.len(), "string match predicate");

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let (id, _) = &self.entries[i];
                let mut output = OutputMap::new();
                output.insert(0, Value::Str(query.clone()));
                output.insert(1, id.clone());
                output.insert(2, Value::Float((score * 10_000.0).round() / 10_000.0));
                output
            })
            .collect())
    }
}

/// Character trigrams of the lowercased, padded text.
fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let padded: Vec<char> = std::iter::repeat(' ')
        .take(2)
        .chain(text.to_lowercase().chars())
        .chain(std::iter::repeat(' ').take(2))
        .collect();
    padded.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

/// Jaccard similarity of two trigram sets, scaled to 0-100.
fn similarity(a: &HashSet<[char; 3]>, b: &HashSet<[char; 3]>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    100.0 * intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> StringMatchPredicate {
        StringMatchPredicate::new(vec![
            (Value::Str("p1".into()), "Michael Jordan".into()),
            (Value::Str("p2".into()), "Michael Johnson".into()),
            (Value::Str("p3".into()), "Larry Bird".into()),
        ])
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let outputs = corpus()
            .eval_impl(&[Some(Value::Str("Michael Jordan".into())), None, None])
            .unwrap();
        assert_eq!(outputs[0][&1], Value::Str("p1".into()));
        assert_eq!(outputs[0][&2], Value::Float(100.0));
    }

    #[test]
    fn test_min_score_filters() {
        let outputs = corpus()
            .with_min_score(90.0)
            .eval_impl(&[Some(Value::Str("Larry Bird".into())), None, None])
            .unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0][&1], Value::Str("p3".into()));
    }

    #[test]
    fn test_top_k_truncates() {
        let outputs = corpus()
            .with_top_k(1)
            .eval_impl(&[Some(Value::Str("Michael".into())), None, None])
            .unwrap();
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_unbound_query_yields_nothing() {
        let outputs = corpus().eval_impl(&[None, None, None]).unwrap();
        assert!(outputs.is_empty());
    }
}
