//! Tests for the structural AST rewriter

use kgraph_infer::ast::AstNode;
use kgraph_infer::parser::parse_query;
use kgraph_infer::rewrite::rewrite_predicates;
use kgraph_infer::unparse::unparse;

#[test]
fn test_rewrite_normalises_predicate_names() {
    let ast = parse_query("Person(?x), not(Enemy(?x); ally(?x)).").unwrap();

    let rewritten = rewrite_predicates(&ast, &mut |node| {
        let AstNode::Predicate { name, args } = node else {
            unreachable!("callback only sees predicate nodes");
        };
        AstNode::Predicate {
            name: name.to_lowercase(),
            args,
        }
    });

    assert_eq!(unparse(&rewritten), "person(?x), not(enemy(?x); ally(?x)).");
}

#[test]
fn test_rewrite_reaches_predicates_in_aggregate_bodies() {
    let ast = parse_query("?c = count{ ?p | Person(?p) }.").unwrap();

    let mut seen = Vec::new();
    let _ = rewrite_predicates(&ast, &mut |node| {
        if let AstNode::Predicate { ref name, .. } = node {
            seen.push(name.clone());
        }
        node
    });

    assert_eq!(seen, vec!["Person".to_string()]);
}

#[test]
fn test_rewrite_identity_preserves_tree() {
    let queries = [
        "?x = ?y, person(?x, 'john', 3), ?age > 18.",
        "?S subset ['a' = 1, 'b' = 2].",
        "?t is (?v + 1) * 2; not(p(?t)).",
    ];
    for query in queries {
        let ast = parse_query(query).unwrap();
        let rewritten = rewrite_predicates(&ast, &mut |node| node);
        assert_eq!(ast, rewritten);
    }
}

#[test]
fn test_rewrite_can_replace_predicate_with_other_node() {
    let ast = parse_query("check(?x), ?x > 1.").unwrap();

    // Replace the predicate call with a unification
    let rewritten = rewrite_predicates(&ast, &mut |node| {
        let AstNode::Predicate { args, .. } = node else {
            return node;
        };
        AstNode::Unify {
            lhs: Box::new(args[0].clone()),
            rhs: Box::new(AstNode::Literal(kgraph_infer::Value::Int(2))),
        }
    });

    assert_eq!(unparse(&rewritten), "?x = 2, ?x > 1.");
}
