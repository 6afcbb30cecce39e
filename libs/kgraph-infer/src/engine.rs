//! Main inference engine
//!
//! Ties the pipeline together: parse -> evaluate -> answer set. The engine
//! owns the predicate registry and is otherwise stateless; evaluation is
//! strictly sequential and runs to completion or to the first fatal error.

use crate::answer::{AnswerSet, Verdict};
use crate::ast::AstNode;
use crate::binding::Binding;
use crate::error::Result;
use crate::eval::Evaluator;
use crate::parser;
use crate::predicate::PredicateRegistry;
use crate::unparse;

/// KGraph query engine over a registry of predicates.
pub struct Engine {
    registry: PredicateRegistry,
}

impl Engine {
    /// Create an engine with the given predicate registry.
    pub fn new(registry: PredicateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Parse a query without evaluating it.
    pub fn parse(&self, query: &str) -> Result<AstNode> {
        parser::parse_query(query)
    }

    /// Render an AST back to query text.
    pub fn unparse(&self, node: &AstNode) -> String {
        unparse::unparse(node)
    }

    /// Parse and evaluate a query against the registry.
    pub fn execute(&self, query: &str) -> Result<AnswerSet> {
        tracing::debug!(query, "executing query");
        let ast = parser::parse_query(query)?;
        self.execute_ast(&ast)
    }

    /// Evaluate an already-parsed query.
    pub fn execute_ast(&self, ast: &AstNode) -> Result<AnswerSet> {
        let evaluator = Evaluator::new(&self.registry);
        let results = evaluator.eval(ast, &Binding::new())?;

        let mut answers = AnswerSet::new();
        answers.set_verdict(if results.is_empty() {
            Verdict::No
        } else {
            Verdict::Yes
        });
        for binding in results {
            answers.push(binding);
        }

        tracing::debug!(verdict = %answers.verdict(), answers = answers.len(), "query complete");
        Ok(answers)
    }
}
