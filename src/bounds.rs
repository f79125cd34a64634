//! Exclusive bound forms.
//!
//! Draft 4 (OpenAPI 2.0 / 3.0) writes `{"maximum": 5, "exclusiveMaximum": true}`,
//! later drafts write `{"exclusiveMaximum": 5}`. Intersection works on the
//! numeric form and converts back when either input used booleans.

use serde_json::{Map, Value};

use crate::error::IntersectError;
use crate::keyword::expect_number;

#[derive(Clone, Copy)]
struct Bound {
    exclusive: &'static str,
    inclusive: &'static str,
    upper: bool,
}

const BOUNDS: [Bound; 2] = [
    Bound {
        exclusive: "exclusiveMaximum",
        inclusive: "maximum",
        upper: true,
    },
    Bound {
        exclusive: "exclusiveMinimum",
        inclusive: "minimum",
        upper: false,
    },
];

/// Rewrite boolean exclusive bounds to numeric form.
///
/// Returns whether any boolean form was present.
pub(crate) fn to_numeric(map: &mut Map<String, Value>) -> Result<bool, IntersectError> {
    let mut legacy = false;
    for bound in BOUNDS {
        match map.get(bound.exclusive) {
            Some(Value::Bool(true)) => {
                legacy = true;
                match map.remove(bound.inclusive) {
                    Some(limit) => {
                        expect_number(bound.inclusive, &limit)?;
                        map.insert(bound.exclusive.to_string(), limit);
                    }
                    // exclusive flag without a bound constrains nothing
                    None => {
                        map.remove(bound.exclusive);
                    }
                }
            }
            Some(Value::Bool(false)) => {
                legacy = true;
                map.remove(bound.exclusive);
            }
            Some(other) => {
                expect_number(bound.exclusive, other)?;
            }
            None => {}
        }
    }
    Ok(legacy)
}

/// Drop exclusive bounds made redundant by an inclusive one and, for
/// draft 4 output, restore the boolean form.
pub(crate) fn finish(map: &mut Map<String, Value>, legacy: bool) -> Result<(), IntersectError> {
    for bound in BOUNDS {
        let Some(exclusive) = map.get(bound.exclusive) else {
            continue;
        };
        let exclusive_limit = expect_number(bound.exclusive, exclusive)?;

        if let Some(inclusive) = map.get(bound.inclusive) {
            let inclusive_limit = expect_number(bound.inclusive, inclusive)?;
            let binding = if bound.upper {
                exclusive_limit <= inclusive_limit
            } else {
                exclusive_limit >= inclusive_limit
            };
            if !binding {
                map.remove(bound.exclusive);
                continue;
            }
        }

        if legacy {
            if let Some(limit) = map.remove(bound.exclusive) {
                map.insert(bound.inclusive.to_string(), limit);
                map.insert(bound.exclusive.to_string(), Value::Bool(true));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn boolean_form_becomes_numeric() {
        let mut map = object(json!({"maximum": 5, "exclusiveMaximum": true, "minimum": 1}));
        assert!(to_numeric(&mut map).unwrap());
        assert_eq!(Value::Object(map), json!({"exclusiveMaximum": 5, "minimum": 1}));
    }

    #[test]
    fn false_flag_is_dropped() {
        let mut map = object(json!({"minimum": 1, "exclusiveMinimum": false}));
        assert!(to_numeric(&mut map).unwrap());
        assert_eq!(Value::Object(map), json!({"minimum": 1}));
    }

    #[test]
    fn numeric_form_is_untouched() {
        let mut map = object(json!({"exclusiveMinimum": 0}));
        assert!(!to_numeric(&mut map).unwrap());
        assert_eq!(Value::Object(map), json!({"exclusiveMinimum": 0}));
    }

    #[test]
    fn invalid_exclusive_value_errors() {
        let mut map = object(json!({"exclusiveMinimum": "0"}));
        assert!(matches!(
            to_numeric(&mut map),
            Err(IntersectError::InvalidValue { .. })
        ));
    }

    #[test]
    fn non_binding_exclusive_is_dropped() {
        let mut map = object(json!({"maximum": 3, "exclusiveMaximum": 5}));
        finish(&mut map, false).unwrap();
        assert_eq!(Value::Object(map), json!({"maximum": 3}));

        let mut map = object(json!({"minimum": 3, "exclusiveMinimum": 1}));
        finish(&mut map, false).unwrap();
        assert_eq!(Value::Object(map), json!({"minimum": 3}));
    }

    #[test]
    fn binding_exclusive_restored_to_boolean_form() {
        let mut map = object(json!({"maximum": 5, "exclusiveMaximum": 5}));
        finish(&mut map, true).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"maximum": 5, "exclusiveMaximum": true})
        );

        let mut map = object(json!({"exclusiveMinimum": 2}));
        finish(&mut map, true).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"minimum": 2, "exclusiveMinimum": true})
        );
    }
}
