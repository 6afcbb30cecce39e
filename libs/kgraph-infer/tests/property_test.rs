//! Property-based tests using QuickCheck
//!
//! Generates parser-shaped ASTs and checks that unparsing and re-parsing
//! yields the same tree. The generator only produces shapes the parser
//! itself can emit (flattened conjunctions, no nested predicate calls),
//! which is exactly the round-trip contract.

use quickcheck::{Arbitrary, Gen, QuickCheck};

use kgraph_infer::ast::{AggregateOp, ArithOp, AstNode, CompareOp};
use kgraph_infer::parser::parse_query;
use kgraph_infer::unparse::unparse;
use kgraph_infer::value::Value;

const VARS: &[&str] = &["?x", "?y", "?z", "?total", "?rec"];
const ATOMS: &[&str] = &["a", "b", "c", "happy", "topic"];
const NAMES: &[&str] = &["person", "get_property", "edge", "friend_of"];
const STRINGS: &[&str] = &["alpha", "beta", "with space", "it's", "multi\nline"];

fn pick<T: Clone>(g: &mut Gen, items: &[T]) -> T {
    g.choose(items).expect("non-empty pool").clone()
}

fn gen_var(g: &mut Gen) -> AstNode {
    AstNode::Var(pick(g, VARS).to_string())
}

fn gen_scalar_literal(g: &mut Gen) -> AstNode {
    let value = match u8::arbitrary(g) % 10 {
        0 => Value::Int(i64::from(i16::arbitrary(g))),
        1 => Value::Float(f64::from(i16::arbitrary(g)) / 4.0),
        2 => Value::Bool(bool::arbitrary(g)),
        3 => Value::Atom(pick(g, ATOMS).to_string()),
        4 => Value::Date("2023-02-18".into()),
        5 => Value::Time("14:30".into()),
        6 => Value::Uri("urn:example:1".into()),
        7 => Value::Currency {
            amount: "10.00".into(),
            code: "USD".into(),
        },
        8 => Value::Geo {
            lat: 40.5,
            lon: -74.25,
        },
        _ => Value::Str(pick(g, STRINGS).to_string()),
    };
    AstNode::Literal(value)
}

fn gen_value(g: &mut Gen, depth: usize) -> AstNode {
    if depth == 0 {
        return if bool::arbitrary(g) {
            gen_var(g)
        } else {
            gen_scalar_literal(g)
        };
    }
    match u8::arbitrary(g) % 6 {
        0 => gen_var(g),
        1 | 2 => gen_scalar_literal(g),
        3 => {
            let len = usize::arbitrary(g) % 3;
            AstNode::List((0..len).map(|_| gen_value(g, depth - 1)).collect())
        }
        4 => {
            let len = 1 + usize::arbitrary(g) % 2;
            AstNode::Map(
                (0..len)
                    .map(|_| {
                        let key = if bool::arbitrary(g) {
                            AstNode::Literal(Value::Str(pick(g, STRINGS).to_string()))
                        } else {
                            gen_var(g)
                        };
                        (key, gen_value(g, depth - 1))
                    })
                    .collect(),
            )
        }
        _ => gen_arith(g, depth - 1),
    }
}

fn gen_arith(g: &mut Gen, depth: usize) -> AstNode {
    if depth == 0 {
        return if bool::arbitrary(g) {
            gen_var(g)
        } else {
            AstNode::Literal(Value::Int(i64::from(i16::arbitrary(g))))
        };
    }
    let op = pick(g, &[ArithOp::Add, ArithOp::Sub, ArithOp::Mul, ArithOp::Div]);
    AstNode::Arith {
        op,
        lhs: Box::new(gen_arith(g, depth - 1)),
        rhs: Box::new(gen_arith(g, depth - 1)),
    }
}

fn gen_comparable(g: &mut Gen) -> AstNode {
    match u8::arbitrary(g) % 3 {
        0 => gen_var(g),
        1 => AstNode::Literal(Value::Int(i64::from(i16::arbitrary(g)))),
        _ => AstNode::Literal(Value::Str(pick(g, STRINGS).to_string())),
    }
}

fn gen_statement(g: &mut Gen, depth: usize) -> AstNode {
    let choice = if depth == 0 {
        u8::arbitrary(g) % 6
    } else {
        u8::arbitrary(g) % 9
    };
    match choice {
        0 => AstNode::Unify {
            lhs: Box::new(gen_var(g)),
            rhs: Box::new(gen_value(g, depth)),
        },
        1 => AstNode::Equal {
            lhs: Box::new(AstNode::Literal(Value::Str(pick(g, STRINGS).to_string()))),
            rhs: Box::new(gen_value(g, depth)),
        },
        2 => {
            let op = pick(
                g,
                &[
                    CompareOp::LessThan,
                    CompareOp::LessThanOrEqual,
                    CompareOp::GreaterThan,
                    CompareOp::GreaterThanOrEqual,
                    CompareOp::Equal,
                    CompareOp::NotEqual,
                ],
            );
            AstNode::Compare {
                lhs: Box::new(gen_comparable(g)),
                op,
                rhs: Box::new(gen_comparable(g)),
            }
        }
        3 => {
            let len = 1 + usize::arbitrary(g) % 3;
            AstNode::In {
                lhs: Box::new(if bool::arbitrary(g) {
                    gen_var(g)
                } else {
                    gen_scalar_literal(g)
                }),
                rhs: Box::new(AstNode::List(
                    (0..len).map(|_| gen_scalar_literal(g)).collect(),
                )),
            }
        }
        4 => {
            let args = (0..usize::arbitrary(g) % 3)
                .map(|_| {
                    if bool::arbitrary(g) {
                        gen_var(g)
                    } else {
                        gen_scalar_literal(g)
                    }
                })
                .collect();
            AstNode::Predicate {
                name: pick(g, NAMES).to_string(),
                args,
            }
        }
        5 => AstNode::MathAssign {
            var: pick(g, VARS).to_string(),
            expr: Box::new(gen_arith(g, depth)),
        },
        6 => AstNode::Not(Box::new(gen_statement(g, depth - 1))),
        7 => AstNode::Group(Box::new(gen_and(g, depth - 1))),
        _ => AstNode::Aggregate {
            op: pick(
                g,
                &[
                    AggregateOp::Collection,
                    AggregateOp::Set,
                    AggregateOp::Count,
                    AggregateOp::Sum,
                    AggregateOp::Average,
                    AggregateOp::Min,
                    AggregateOp::Max,
                ],
            ),
            var: pick(g, VARS).to_string(),
            body: vec![gen_and(g, depth - 1)],
        },
    }
}

fn gen_and(g: &mut Gen, depth: usize) -> AstNode {
    let len = 1 + usize::arbitrary(g) % 3;
    let terms: Vec<AstNode> = (0..len).map(|_| gen_statement(g, depth)).collect();
    if terms.len() == 1 {
        terms.into_iter().next().expect("non-empty")
    } else {
        AstNode::And(terms)
    }
}

fn gen_query(g: &mut Gen) -> AstNode {
    let len = 1 + usize::arbitrary(g) % 2;
    let branches: Vec<AstNode> = (0..len).map(|_| gen_and(g, 2)).collect();
    if branches.len() == 1 {
        branches.into_iter().next().expect("non-empty")
    } else {
        AstNode::Or(branches)
    }
}

#[derive(Clone, Debug)]
struct QueryAst(AstNode);

impl Arbitrary for QueryAst {
    fn arbitrary(g: &mut Gen) -> Self {
        QueryAst(gen_query(g))
    }
}

/// Property: parse(unparse(ast)) == ast for parser-shaped ASTs
#[test]
fn prop_unparse_parse_round_trip() {
    fn property(query: QueryAst) -> bool {
        let rendered = unparse(&query.0);
        match parse_query(&rendered) {
            Ok(reparsed) => reparsed == query.0,
            Err(_) => false,
        }
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(property as fn(QueryAst) -> bool);
}

/// Property: unparsing is deterministic
#[test]
fn prop_unparse_deterministic() {
    fn property(query: QueryAst) -> bool {
        unparse(&query.0) == unparse(&query.0)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(property as fn(QueryAst) -> bool);
}

/// Property: a second round trip is a fixed point of the first
#[test]
fn prop_round_trip_fixed_point() {
    fn property(query: QueryAst) -> bool {
        let once = unparse(&query.0);
        let Ok(reparsed) = parse_query(&once) else {
            return false;
        };
        unparse(&reparsed) == once
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(QueryAst) -> bool);
}
