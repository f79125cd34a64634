//! Property-based checks of the intersection laws.
//!
//! Schemas are drawn from a small keyword vocabulary whose merges are exact,
//! so every successful intersection can be compared against the conjunction
//! of its inputs on a fixed set of instances. Top-level contradictions must
//! reject every instance; a contradiction inside `properties` only proves the
//! property itself unsatisfiable.

use proptest::prelude::*;
use schema_intersect::intersect_schema;
use serde_json::{json, Map, Value};

fn keyword() -> impl Strategy<Value = (&'static str, Value)> {
    prop_oneof![
        prop::sample::select(vec!["string", "number", "integer", "object", "null"])
            .prop_map(|t| ("type", json!(t))),
        (-3i64..3).prop_map(|n| ("minimum", json!(n))),
        (-3i64..3).prop_map(|n| ("maximum", json!(n))),
        (1u64..4).prop_map(|n| ("multipleOf", json!(n))),
        prop::sample::subsequence(vec![json!(1), json!(2), json!("a"), json!(null)], 1..=3)
            .prop_map(|members| ("enum", Value::Array(members))),
        prop::sample::subsequence(vec!["a", "b", "c"], 1..=2)
            .prop_map(|names| ("required", json!(names))),
        prop::sample::select(vec!["^a", "b", "c$"]).prop_map(|p| ("pattern", json!(p))),
        prop::sample::select(vec!["string", "integer"])
            .prop_map(|t| ("properties", json!({"a": {"type": t}}))),
        prop::sample::select(vec!["Pet", "A pet"]).prop_map(|t| ("title", json!(t))),
    ]
}

fn schema() -> impl Strategy<Value = Value> {
    prop::collection::vec(keyword(), 0..4).prop_map(|pairs| {
        Value::Object(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect::<Map<String, Value>>(),
        )
    })
}

fn samples() -> Vec<Value> {
    vec![
        json!(null),
        json!(-2),
        json!(0),
        json!(1),
        json!(2),
        json!(3),
        json!(1.5),
        json!("a"),
        json!("abc"),
        json!("bc"),
        json!("xc"),
        json!([]),
        json!({}),
        json!({"a": "s"}),
        json!({"a": 1, "b": 2, "c": 3}),
        json!({"b": 1}),
    ]
}

fn accepts(schema: &Value, instance: &Value) -> bool {
    jsonschema::validator_for(schema)
        .unwrap_or_else(|e| panic!("invalid schema {schema}: {e}"))
        .is_valid(instance)
}

/// Both sides type the `a` property differently.
fn nested_conflict(a: &Value, b: &Value) -> bool {
    let property_type = |schema: &Value| schema.pointer("/properties/a/type").cloned();
    matches!(
        (property_type(a), property_type(b)),
        (Some(x), Some(y)) if x != y
    )
}

proptest! {
    #[test]
    fn accept_is_identity(a in schema()) {
        prop_assert_eq!(intersect_schema(&a, &json!(true)).unwrap(), a.clone());
        prop_assert_eq!(intersect_schema(&json!({}), &a).unwrap(), a);
    }

    #[test]
    fn reject_absorbs(a in schema()) {
        prop_assert_eq!(intersect_schema(&a, &json!(false)).unwrap(), json!(false));
        prop_assert_eq!(intersect_schema(&json!({"not": {}}), &a).unwrap(), json!(false));
    }

    #[test]
    fn idempotent(a in schema()) {
        prop_assert_eq!(intersect_schema(&a, &a).unwrap(), a);
    }

    #[test]
    fn result_is_the_conjunction(a in schema(), b in schema()) {
        let ab = intersect_schema(&a, &b);
        let ba = intersect_schema(&b, &a);
        prop_assert_eq!(ab.is_ok(), ba.is_ok());

        for instance in samples() {
            let both = accepts(&a, &instance) && accepts(&b, &instance);
            match (&ab, &ba) {
                (Ok(ab), Ok(ba)) => {
                    prop_assert_eq!(accepts(ab, &instance), both, "{} on {}", ab, instance);
                    prop_assert_eq!(accepts(ba, &instance), both, "{} on {}", ba, instance);
                }
                (Err(e), _) | (_, Err(e)) => {
                    prop_assert!(e.is_empty_intersection(), "unexpected error: {}", e);
                    if !nested_conflict(&a, &b) {
                        prop_assert!(!both, "{} satisfies both {} and {}", instance, a, b);
                    }
                }
            }
        }
    }
}
