//! End-to-end tests: adapters driving the engine's predicate contract

use std::sync::Arc;

use kgraph_infer::{Engine, PredicateRegistry, Value, Verdict};
use kgraph_predicates::{FilterPredicate, StringMatchPredicate};

fn s(text: &str) -> Value {
    Value::Str(text.into())
}

fn engine() -> Engine {
    let mut registry = PredicateRegistry::new();
    registry.register(
        "person",
        Arc::new(FilterPredicate::from_values([
            s("Alice"),
            s("Bob"),
            s("Charlie"),
        ])),
    );
    registry.register(
        "get_property",
        Arc::new(FilterPredicate::new(vec![
            vec![s("Alice"), s("age"), Value::Int(25)],
            vec![s("Bob"), s("age"), Value::Int(35)],
            vec![s("Charlie"), s("age"), Value::Int(40)],
        ])),
    );
    registry.register(
        "name_match",
        Arc::new(StringMatchPredicate::new(vec![
            (s("q1"), "Michael Jordan".into()),
            (s("q2"), "Michael Johnson".into()),
            (s("q3"), "Larry Bird".into()),
        ])),
    );
    Engine::new(registry)
}

#[test]
fn test_filter_predicate_enumerates_and_filters() {
    let answers = engine()
        .execute("person(?X), get_property(?X, 'age', ?V), ?V >= 35.")
        .unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers.results()[0].get("?X"), Some(&s("Bob")));
    assert_eq!(answers.results()[1].get("?X"), Some(&s("Charlie")));
}

#[test]
fn test_filter_predicate_ground_test() {
    assert_eq!(
        engine()
            .execute("get_property('Bob', 'age', 35).")
            .unwrap()
            .verdict(),
        Verdict::Yes
    );
    assert_eq!(
        engine()
            .execute("get_property('Bob', 'age', 36).")
            .unwrap()
            .verdict(),
        Verdict::No
    );
}

#[test]
fn test_string_match_binds_id_and_score() {
    let answers = engine()
        .execute("name_match('Michael Jordan', ?Id, ?Score), ?Score >= 99.0.")
        .unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers.results()[0].get("?Id"), Some(&s("q1")));
}

#[test]
fn test_string_match_ranks_fuzzy_hits() {
    let answers = engine()
        .execute("name_match('Micheal Jordan', ?Id, ?Score), ?Score > 50.0.")
        .unwrap();
    assert!(!answers.is_empty());
    assert_eq!(answers.results()[0].get("?Id"), Some(&s("q1")));
}

#[test]
fn test_string_match_requires_bound_query() {
    let answers = engine().execute("name_match(?Q, ?Id, ?Score).").unwrap();
    assert_eq!(answers.verdict(), Verdict::No);
}
