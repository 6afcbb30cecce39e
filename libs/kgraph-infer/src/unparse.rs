//! Unparser - deterministic AST to DSL text
//!
//! Produces a valid query string for any AST the parser can emit. Comments
//! and original whitespace are not reproduced, but the result re-parses to
//! an equal AST: `Group` nodes keep their parentheses, arithmetic is
//! re-parenthesised from precedence, and strings are re-quoted.

use crate::ast::AstNode;
use crate::value::Value;

/// Render a full query: expression body plus the `.` terminator.
pub fn unparse(node: &AstNode) -> String {
    format!("{}.", render(node))
}

/// Render an expression without the terminator.
pub fn render(node: &AstNode) -> String {
    match node {
        AstNode::And(terms) => join_rendered(terms, ", "),
        AstNode::Or(branches) => join_rendered(branches, "; "),
        AstNode::Not(inner) => format!("not({})", render(inner)),
        AstNode::Group(inner) => format!("({})", render(inner)),
        AstNode::Predicate { name, args } => {
            format!("{}({})", name, join_rendered(args, ", "))
        }
        AstNode::Unify { lhs, rhs } | AstNode::Equal { lhs, rhs } => {
            format!("{} = {}", render(lhs), render(rhs))
        }
        AstNode::Compare { lhs, op, rhs } => {
            format!("{} {} {}", render(lhs), op.as_str(), render(rhs))
        }
        AstNode::MathAssign { var, expr } => format!("{} is {}", var, render(expr)),
        AstNode::In { lhs, rhs } => format!("{} in {}", render(lhs), render(rhs)),
        AstNode::Subset { lhs, rhs } => {
            format!("{} subset {}", render(lhs), render(rhs))
        }
        AstNode::Aggregate { op, var, body } => {
            format!("{}{{ {} | {} }}", op.as_str(), var, join_rendered(body, ", "))
        }
        AstNode::Arith { op, lhs, rhs } => {
            let precedence = op.precedence();
            let left = if arith_precedence(lhs) < precedence {
                format!("({})", render(lhs))
            } else {
                render(lhs)
            };
            // Right operands at the same level need parentheses to survive
            // left-associative re-parsing.
            let right = if arith_precedence(rhs) <= precedence {
                format!("({})", render(rhs))
            } else {
                render(rhs)
            };
            format!("{} {} {}", left, op.as_str(), right)
        }
        AstNode::Var(name) => name.clone(),
        AstNode::Literal(value) => render_literal(value),
        AstNode::List(items) => format!("[{}]", join_rendered(items, ", ")),
        AstNode::Map(pairs) => {
            let rendered: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{} = {}", render(k), render(v)))
                .collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

fn join_rendered(nodes: &[AstNode], separator: &str) -> String {
    nodes.iter().map(render).collect::<Vec<_>>().join(separator)
}

/// Effective arithmetic precedence; non-arithmetic operands never need
/// parentheses.
fn arith_precedence(node: &AstNode) -> u8 {
    match node {
        AstNode::Arith { op, .. } => op.precedence(),
        _ => u8::MAX,
    }
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{:?}", f),
        Value::Bool(true) => "true".into(),
        Value::Bool(false) => "false".into(),
        Value::Str(s) => quote_string(s),
        Value::Atom(name) => name.clone(),
        Value::Date(s) => format!("'{}'^Date", escape_single(s)),
        Value::DateTime(s) => format!("'{}'^DateTime", escape_single(s)),
        Value::Time(s) => format!("'{}'^Time", escape_single(s)),
        Value::Duration(s) => format!("'{}'^Duration", escape_single(s)),
        Value::Uri(s) => format!("'{}'^URI", escape_single(s)),
        Value::Currency { amount, code } => {
            format!("'{}'^Currency({})", escape_single(amount), code)
        }
        Value::Unit { amount, unit } => {
            format!("'{}'^Unit('{}')", escape_single(amount), unit)
        }
        Value::Geo { lat, lon } => format!("'{:?},{:?}'^GeoLocation", lat, lon),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(render_literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Map(entries) => {
            let rendered: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{} = {}", render_literal(k), render_literal(v)))
                .collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

/// Quote a string value. Multi-line content prefers the verbatim
/// triple-quoted form when it can be represented there.
fn quote_string(s: &str) -> String {
    let multi_line = s.contains('\n') || s.contains('\r');
    if multi_line && !s.contains("\"\"\"") && !s.ends_with('"') {
        format!("\"\"\"{}\"\"\"", s)
    } else {
        format!("'{}'", escape_single(s))
    }
}

fn escape_single(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
