//! Structural AST rewriter
//!
//! Walks an AST bottom-up, reconstructing every node, and hands each
//! predicate call (with already-rewritten arguments) to a caller-supplied
//! callback that may replace it. Useful for normalising or validating
//! predicate names before evaluation.

use crate::ast::AstNode;

/// Rewrite a tree, invoking `transform` on every predicate node.
///
/// All other nodes are reconstructed with rewritten children; the input
/// tree is left untouched.
pub fn rewrite_predicates<F>(node: &AstNode, transform: &mut F) -> AstNode
where
    F: FnMut(AstNode) -> AstNode,
{
    match node {
        AstNode::Predicate { name, args } => {
            let new_args = args
                .iter()
                .map(|arg| rewrite_predicates(arg, transform))
                .collect();
            transform(AstNode::Predicate {
                name: name.clone(),
                args: new_args,
            })
        }
        AstNode::And(terms) => AstNode::And(rewrite_all(terms, transform)),
        AstNode::Or(branches) => AstNode::Or(rewrite_all(branches, transform)),
        AstNode::Not(inner) => AstNode::Not(Box::new(rewrite_predicates(inner, transform))),
        AstNode::Group(inner) => AstNode::Group(Box::new(rewrite_predicates(inner, transform))),
        AstNode::Unify { lhs, rhs } => AstNode::Unify {
            lhs: Box::new(rewrite_predicates(lhs, transform)),
            rhs: Box::new(rewrite_predicates(rhs, transform)),
        },
        AstNode::Equal { lhs, rhs } => AstNode::Equal {
            lhs: Box::new(rewrite_predicates(lhs, transform)),
            rhs: Box::new(rewrite_predicates(rhs, transform)),
        },
        AstNode::Compare { lhs, op, rhs } => AstNode::Compare {
            lhs: Box::new(rewrite_predicates(lhs, transform)),
            op: *op,
            rhs: Box::new(rewrite_predicates(rhs, transform)),
        },
        AstNode::MathAssign { var, expr } => AstNode::MathAssign {
            var: var.clone(),
            expr: Box::new(rewrite_predicates(expr, transform)),
        },
        AstNode::In { lhs, rhs } => AstNode::In {
            lhs: Box::new(rewrite_predicates(lhs, transform)),
            rhs: Box::new(rewrite_predicates(rhs, transform)),
        },
        AstNode::Subset { lhs, rhs } => AstNode::Subset {
            lhs: Box::new(rewrite_predicates(lhs, transform)),
            rhs: Box::new(rewrite_predicates(rhs, transform)),
        },
        AstNode::Aggregate { op, var, body } => AstNode::Aggregate {
            op: *op,
            var: var.clone(),
            body: rewrite_all(body, transform),
        },
        AstNode::Arith { op, lhs, rhs } => AstNode::Arith {
            op: *op,
            lhs: Box::new(rewrite_predicates(lhs, transform)),
            rhs: Box::new(rewrite_predicates(rhs, transform)),
        },
        AstNode::List(items) => AstNode::List(rewrite_all(items, transform)),
        AstNode::Map(pairs) => AstNode::Map(
            pairs
                .iter()
                .map(|(k, v)| {
                    (
                        rewrite_predicates(k, transform),
                        rewrite_predicates(v, transform),
                    )
                })
                .collect(),
        ),
        AstNode::Var(_) | AstNode::Literal(_) => node.clone(),
    }
}

fn rewrite_all<F>(nodes: &[AstNode], transform: &mut F) -> Vec<AstNode>
where
    F: FnMut(AstNode) -> AstNode,
{
    nodes
        .iter()
        .map(|node| rewrite_predicates(node, transform))
        .collect()
}
