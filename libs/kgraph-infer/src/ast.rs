//! Abstract syntax tree for KGraph queries
//!
//! The node set mirrors the query grammar: logical combinators, atomic
//! statements (predicate calls, unification, comparison, membership,
//! subset, arithmetic assignment, aggregation), arithmetic expressions,
//! and value positions (variables, literals, collection literals).
//!
//! Parser output is a pure tree: no shared nodes, no cycles. `Group` wraps
//! every parenthesised expression so the unparser can reproduce the shape.

use crate::value::Value;

/// AST node for a parsed query or any of its sub-expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// Conjunction: `a, b, c`
    And(Vec<AstNode>),

    /// Disjunction: `a; b; c`
    Or(Vec<AstNode>),

    /// Negation as failure: `not(expr)`
    Not(Box<AstNode>),

    /// Parenthesised expression; semantically transparent.
    Group(Box<AstNode>),

    /// Predicate call: `name(arg1, arg2, ...)`
    Predicate { name: String, args: Vec<AstNode> },

    /// Unification: `lhs = rhs` where the left side is a variable.
    Unify { lhs: Box<AstNode>, rhs: Box<AstNode> },

    /// Equality test: `lhs = rhs` for any other left side.
    Equal { lhs: Box<AstNode>, rhs: Box<AstNode> },

    /// Comparison: `lhs op rhs`
    Compare {
        lhs: Box<AstNode>,
        op: CompareOp,
        rhs: Box<AstNode>,
    },

    /// Arithmetic assignment: `?v is expr`
    MathAssign { var: String, expr: Box<AstNode> },

    /// Membership test: `lhs in rhs`
    In { lhs: Box<AstNode>, rhs: Box<AstNode> },

    /// Subset test: `lhs subset rhs`.
    ///
    /// With an unbound variable on the left and a map of size n on the
    /// right this enumerates all 2^n - 1 non-empty sub-maps.
    Subset { lhs: Box<AstNode>, rhs: Box<AstNode> },

    /// Aggregation: `op{ ?v | body }`
    Aggregate {
        op: AggregateOp,
        var: String,
        body: Vec<AstNode>,
    },

    /// Arithmetic expression: `lhs op rhs`
    Arith {
        op: ArithOp,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
    },

    /// Variable reference, including the `?` sigil (e.g. `?x`).
    Var(String),

    /// Concrete literal value.
    Literal(Value),

    /// List literal: `[a, b, c]`
    List(Vec<AstNode>),

    /// Map literal: `[k1 = v1, k2 = v2]`. Duplicate keys are tolerated
    /// here; evaluation is last-write-wins.
    Map(Vec<(AstNode, AstNode)>),
}

impl AstNode {
    pub fn is_var(&self) -> bool {
        matches!(self, AstNode::Var(_))
    }

    /// Variable name if this node is a variable reference.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            AstNode::Var(name) => Some(name),
            _ => None,
        }
    }
}

/// Comparison operator: `<` `<=` `>` `>=` `==` `!=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
        }
    }

    /// True for the four ordering operators.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }
}

/// Arithmetic operator: `+` `-` `*` `/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }

    /// Binding strength for the unparser: multiplicative over additive.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            ArithOp::Add | ArithOp::Sub => 1,
            ArithOp::Mul | ArithOp::Div => 2,
        }
    }
}

/// Aggregation operator in `op{ ?v | body }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Collection,
    Set,
    Count,
    Sum,
    Average,
    Min,
    Max,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Collection => "collection",
            AggregateOp::Set => "set",
            AggregateOp::Count => "count",
            AggregateOp::Sum => "sum",
            AggregateOp::Average => "average",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }
}
