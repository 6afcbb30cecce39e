//! Answer sets
//!
//! Collects the bindings a top-level query produced, together with the
//! overall verdict. The verdict is `Unknown` only before evaluation; a
//! completed run reports `Yes` exactly when at least one answer exists.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::binding::Binding;
use crate::value::Value;

/// Overall outcome of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Yes,
    No,
    #[default]
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Yes => "Yes",
            Verdict::No => "No",
            Verdict::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Ordered collection of answers for a query.
#[derive(Debug, Clone, Default)]
pub struct AnswerSet {
    results: Vec<IndexMap<String, Value>>,
    verdict: Verdict,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, binding: Binding) {
        self.results.push(binding.into_map());
    }

    pub(crate) fn set_verdict(&mut self, verdict: Verdict) {
        self.verdict = verdict;
    }

    /// The answers, in production order.
    pub fn results(&self) -> &[IndexMap<String, Value>] {
        &self.results
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// JSON rendering: `{"verdict": ..., "answers": [...]}`.
    pub fn to_json(&self) -> serde_json::Value {
        let answers: Vec<serde_json::Value> = self
            .results
            .iter()
            .map(|answer| {
                let mut obj = serde_json::Map::new();
                for (var, value) in answer {
                    obj.insert(var.clone(), value.to_json());
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::json!({
            "verdict": self.verdict.to_string(),
            "answers": answers,
        })
    }
}

impl fmt::Display for AnswerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Evaluation: {}, Answers: [", self.verdict)?;
        for (i, answer) in self.results.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{{")?;
            for (j, (var, value)) in answer.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", var, value)?;
            }
            write!(f, "}}")?;
        }
        write!(f, "]")
    }
}
