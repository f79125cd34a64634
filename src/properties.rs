//! Property-space merging: `properties`, `patternProperties` and
//! `additionalProperties` of two schemas being intersected.
//!
//! A property name is constrained on the other side by, in order of
//! priority, a same-named entry in `properties`, every matching
//! `patternProperties` regex (unanchored), or `additionalProperties`.
//! Pattern keys use ECMA-262 style syntax, so look-around and backreferences
//! are accepted.

use fancy_regex::Regex;
use serde_json::{Map, Value};

use crate::error::IntersectError;
use crate::intersect::Scope;

/// Merged `properties` and `patternProperties`; `None` when empty.
#[derive(Debug, Default)]
pub(crate) struct PropertySpace {
    pub properties: Option<Map<String, Value>>,
    pub pattern_properties: Option<Map<String, Value>>,
}

/// One side's view of the property space.
struct Side<'a> {
    properties: Option<&'a Map<String, Value>>,
    patterns: Option<&'a Map<String, Value>>,
    additional: Option<&'a Value>,
}

impl<'a> Side<'a> {
    fn of(schema: &'a Map<String, Value>) -> Result<Self, IntersectError> {
        Ok(Self {
            properties: schema_map(schema, "properties")?,
            patterns: schema_map(schema, "patternProperties")?,
            additional: schema.get("additionalProperties"),
        })
    }

    fn compiled_patterns(&self) -> Result<Vec<(Regex, &'a Value)>, IntersectError> {
        self.patterns
            .into_iter()
            .flatten()
            .map(|(pattern, schema)| {
                Regex::new(pattern)
                    .map(|re| (re, schema))
                    .map_err(|source| IntersectError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect()
    }
}

fn schema_map<'a>(
    schema: &'a Map<String, Value>,
    keyword: &str,
) -> Result<Option<&'a Map<String, Value>>, IntersectError> {
    match schema.get(keyword) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(IntersectError::invalid(keyword, "object", other)),
    }
}

/// Merge the property spaces of two keyword maps.
pub(crate) fn merge(
    scope: Scope,
    a: &Map<String, Value>,
    b: &Map<String, Value>,
) -> Result<PropertySpace, IntersectError> {
    let left = Side::of(a)?;
    let right = Side::of(b)?;

    let properties = merge_named(scope, left.properties, right.properties, &left, &right)?;
    let pattern_properties = merge_named(scope, left.patterns, right.patterns, &left, &right)?;

    Ok(PropertySpace {
        properties: (!properties.is_empty()).then_some(properties),
        pattern_properties: (!pattern_properties.is_empty()).then_some(pattern_properties),
    })
}

/// Merge two name-keyed schema maps, constraining each entry by the other
/// side's same-named entry, matching patterns, or additional properties.
fn merge_named(
    scope: Scope,
    left_named: Option<&Map<String, Value>>,
    right_named: Option<&Map<String, Value>>,
    left: &Side<'_>,
    right: &Side<'_>,
) -> Result<Map<String, Value>, IntersectError> {
    let empty = Map::new();
    let left_named = left_named.unwrap_or(&empty);
    let right_named = right_named.unwrap_or(&empty);

    let mut merged = Map::new();

    if !left_named.is_empty() {
        let patterns = right.compiled_patterns()?;
        for (name, schema) in left_named {
            let schema = constrain(scope, name, schema, right_named, &patterns, right.additional)?;
            merged.insert(name.clone(), schema);
        }
    }

    let unmatched: Vec<_> = right_named
        .iter()
        .filter(|(name, _)| !left_named.contains_key(*name))
        .collect();
    if !unmatched.is_empty() {
        let patterns = left.compiled_patterns()?;
        for (name, schema) in unmatched {
            let schema = constrain(scope, name, schema, &empty, &patterns, left.additional)?;
            merged.insert(name.clone(), schema);
        }
    }

    Ok(merged)
}

fn constrain(
    scope: Scope,
    name: &str,
    schema: &Value,
    other_named: &Map<String, Value>,
    other_patterns: &[(Regex, &Value)],
    other_additional: Option<&Value>,
) -> Result<Value, IntersectError> {
    if let Some(other) = other_named.get(name) {
        return scope.intersect(schema, other);
    }

    let mut matched = Vec::new();
    for (re, other) in other_patterns {
        // Matching only fails when the backtracking limit is hit
        let hit = re.is_match(name).map_err(|_| {
            IntersectError::not_supported(
                "patternProperties",
                &Value::String(re.as_str().to_string()),
                &Value::String(name.to_string()),
            )
        })?;
        if hit {
            matched.push(*other);
        }
    }
    if !matched.is_empty() {
        return matched
            .into_iter()
            .try_fold(schema.clone(), |acc, other| scope.intersect(&acc, other));
    }

    match other_additional {
        Some(additional) => scope.intersect(schema, additional),
        None => Ok(schema.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merge_values(a: Value, b: Value) -> Result<PropertySpace, IntersectError> {
        merge(
            Scope::default(),
            a.as_object().unwrap(),
            b.as_object().unwrap(),
        )
    }

    #[test]
    fn same_named_properties_intersect() {
        let space = merge_values(
            json!({"properties": {"n": {"maximum": 10}}}),
            json!({"properties": {"n": {"minimum": 5}, "m": {"type": "string"}}}),
        )
        .unwrap();
        assert_eq!(
            Value::Object(space.properties.unwrap()),
            json!({"n": {"maximum": 10, "minimum": 5}, "m": {"type": "string"}})
        );
        assert!(space.pattern_properties.is_none());
    }

    #[test]
    fn named_property_meets_pattern() {
        let space = merge_values(
            json!({"properties": {"n": {"maximum": 10}}}),
            json!({"patternProperties": {"n": {"minimum": 5}}}),
        )
        .unwrap();
        assert_eq!(
            Value::Object(space.properties.unwrap()),
            json!({"n": {"maximum": 10, "minimum": 5}})
        );
        assert_eq!(
            Value::Object(space.pattern_properties.unwrap()),
            json!({"n": {"minimum": 5}})
        );
    }

    #[test]
    fn patterns_are_unanchored_and_all_matches_apply() {
        let space = merge_values(
            json!({"properties": {"user_id": {"type": "string"}}}),
            json!({"patternProperties": {
                "_id$": {"minLength": 3},
                "^user": {"maxLength": 8},
                "^x-": {"type": "number"}
            }}),
        )
        .unwrap();
        assert_eq!(
            Value::Object(space.properties.unwrap()),
            json!({"user_id": {"type": "string", "minLength": 3, "maxLength": 8}})
        );
    }

    #[test]
    fn lookaround_pattern_keys_are_matched() {
        let space = merge_values(
            json!({"properties": {"name": {"maxLength": 3}, "x-id": {"type": "integer"}}}),
            json!({"patternProperties": {"^(?!x-)": {"type": "string"}}}),
        )
        .unwrap();
        assert_eq!(
            Value::Object(space.properties.unwrap()),
            json!({"name": {"maxLength": 3, "type": "string"}, "x-id": {"type": "integer"}})
        );
    }

    #[test]
    fn additional_properties_apply_when_nothing_else_matches() {
        let space = merge_values(
            json!({"properties": {"a": {"type": "string"}}, "additionalProperties": false}),
            json!({"properties": {"b": {"type": "number"}}}),
        )
        .unwrap();
        // b is forbidden on the left; keep it as false rather than dropping it
        assert_eq!(
            Value::Object(space.properties.unwrap()),
            json!({"a": {"type": "string"}, "b": false})
        );
    }

    #[test]
    fn pattern_keys_merge_against_each_other() {
        let space = merge_values(
            json!({"patternProperties": {"^s_": {"type": "string"}}}),
            json!({
                "patternProperties": {"^s_": {"minLength": 1}, "^n_": {"type": "number"}},
                "additionalProperties": {"description": "extra"}
            }),
        )
        .unwrap();
        assert!(space.properties.is_none());
        assert_eq!(
            Value::Object(space.pattern_properties.unwrap()),
            json!({
                "^s_": {"type": "string", "minLength": 1},
                "^n_": {"type": "number"}
            })
        );
    }

    #[test]
    fn empty_maps_are_omitted() {
        let space = merge_values(json!({"properties": {}}), json!({"type": "object"})).unwrap();
        assert!(space.properties.is_none());
        assert!(space.pattern_properties.is_none());
    }

    #[test]
    fn invalid_pattern_key_errors() {
        let err = merge_values(
            json!({"properties": {"a": {}}}),
            json!({"patternProperties": {"(": {}}}),
        )
        .unwrap_err();
        assert!(matches!(err, IntersectError::InvalidPattern { pattern, .. } if pattern == "("));
    }

    #[test]
    fn non_object_properties_error() {
        let err = merge_values(json!({"properties": []}), json!({})).unwrap_err();
        assert!(matches!(err, IntersectError::InvalidValue { expected: "object", .. }));
    }
}
