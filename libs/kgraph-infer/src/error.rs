//! Error types for the KGraph inference engine

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by parsing and evaluation.
///
/// Branch-level failures (unbound variables, division by zero) are not
/// errors: they prune the current branch and simply produce fewer answers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown predicate: {0}")]
    UnknownPredicate(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("invalid literal: {0}")]
    ParseValue(String),
}
