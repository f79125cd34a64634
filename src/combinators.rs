//! Intersection of `anyOf` / `oneOf` lists.

use serde_json::Value;

use crate::error::IntersectError;
use crate::intersect::Scope;
use crate::keyword::expect_array;
use crate::schema::json_equal;

/// Append `b` to `a`, skipping elements already present.
pub(crate) fn concat_unique(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut out = a.to_vec();
    for item in b {
        if !out.iter().any(|existing| json_equal(existing, item)) {
            out.push(item.clone());
        }
    }
    out
}

fn is_subset(small: &[Value], large: &[Value]) -> bool {
    small
        .iter()
        .all(|item| large.iter().any(|other| json_equal(item, other)))
}

/// Intersect two `anyOf` (or `oneOf`) arrays.
///
/// Only three shapes are handled: one list is a subset of the other, the
/// lists are permutations of each other (a subset both ways), or one list
/// has a single element that can be distributed over the other. Anything
/// else would need a cross product of alternatives and is rejected as not
/// supported.
pub(crate) fn distribute(
    scope: Scope,
    keyword: &str,
    a: &Value,
    b: &Value,
) -> Result<Value, IntersectError> {
    let left = expect_array(keyword, a)?;
    let right = expect_array(keyword, b)?;

    if is_subset(left, right) {
        return Ok(a.clone());
    }
    if is_subset(right, left) {
        return Ok(b.clone());
    }

    let (single, many) = match (left.as_slice(), right.as_slice()) {
        ([single], _) => (single, right),
        (_, [single]) => (single, left),
        _ => return Err(IntersectError::not_supported(keyword, a, b)),
    };

    many.iter()
        .map(|alternative| scope.intersect(single, alternative))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subset_ignores_number_representation() {
        let a = json!([{"const": 1}, {"const": 2}]);
        let b = json!([{"const": 2.0}]);
        assert_eq!(distribute(Scope::default(), "anyOf", &a, &b).unwrap(), b);
        assert_eq!(
            concat_unique(&[json!(1)], &[json!(1.0), json!(2)]),
            vec![json!(1), json!(2)]
        );
    }

    #[test]
    fn subset_wins() {
        let a = json!([{"type": "string"}]);
        let b = json!([{"type": "string"}, {"type": "number"}]);
        assert_eq!(distribute(Scope::default(), "anyOf", &a, &b).unwrap(), a);
        assert_eq!(distribute(Scope::default(), "anyOf", &b, &a).unwrap(), a);
    }

    #[test]
    fn permutations_are_equivalent() {
        let a = json!([{"type": "string"}, {"type": "number"}]);
        let b = json!([{"type": "number"}, {"type": "string"}]);
        assert_eq!(distribute(Scope::default(), "oneOf", &a, &b).unwrap(), a);
    }

    #[test]
    fn singleton_distributes() {
        let a = json!([{"minimum": 0}]);
        let b = json!([{"type": "integer"}, {"type": "number", "maximum": 10}]);
        assert_eq!(
            distribute(Scope::default(), "anyOf", &a, &b).unwrap(),
            json!([
                {"minimum": 0, "type": "integer"},
                {"minimum": 0, "type": "number", "maximum": 10}
            ])
        );
    }

    #[test]
    fn unrelated_lists_are_not_supported() {
        let a = json!([{"type": "string"}, {"type": "number"}]);
        let b = json!([{"type": "boolean"}, {"type": "null"}]);
        let err = distribute(Scope::default(), "oneOf", &a, &b).unwrap_err();
        assert!(err.is_not_supported());
    }

    #[test]
    fn distribution_surfaces_empty_intersection() {
        let a = json!([{"const": 1}]);
        let b = json!([{"const": 2}, {"const": 3}]);
        let err = distribute(Scope::default(), "anyOf", &a, &b).unwrap_err();
        assert!(err.is_empty_intersection());
    }

    #[test]
    fn concat_unique_skips_duplicates() {
        let out = concat_unique(&[json!(1), json!(2)], &[json!(2), json!(3)]);
        assert_eq!(out, vec![json!(1), json!(2), json!(3)]);
    }
}
