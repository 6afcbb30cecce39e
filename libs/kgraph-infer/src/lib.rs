//! KGraphInfer - logic-query engine for a knowledge-graph DSL
//!
//! A query is a conjunctive/disjunctive expression over predicate calls,
//! equalities, arithmetic, collection membership and subset tests, and
//! aggregation sub-queries. The engine parses the query and evaluates it
//! against a registry of externally implemented predicates, producing an
//! ordered answer set of variable bindings plus a yes/no verdict.
//!
//! # Pipeline
//!
//! ```text
//! Query String
//!      |
//!   Parser -> AST  (unparser renders back to text)
//!      |
//! Evaluator(AST, empty binding) -> bindings
//!      |
//! AnswerSet (results + verdict)
//! ```
//!
//! # Example
//!
//! ```rust
//! use kgraph_infer::{Engine, PredicateRegistry, Verdict};
//!
//! let engine = Engine::new(PredicateRegistry::new());
//! let answers = engine.execute("?x = 1, ?y is ?x + 1, ?y == 2.").unwrap();
//! assert_eq!(answers.verdict(), Verdict::Yes);
//! ```

pub mod answer;
pub mod ast;
pub mod binding;
mod compare;
pub mod engine;
pub mod error;
mod eval;
pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod rewrite;
mod temporal;
pub mod token;
pub mod unparse;
pub mod value;

// Re-export main types
pub use answer::{AnswerSet, Verdict};
pub use ast::{AggregateOp, ArithOp, AstNode, CompareOp};
pub use binding::Binding;
pub use engine::Engine;
pub use error::{Error, Result};
pub use parser::{parse_query, Parser};
pub use predicate::{OutputMap, Predicate, PredicateRegistry};
pub use rewrite::rewrite_predicates;
pub use unparse::unparse;
pub use value::{Value, ValueMap};
