//! Schema model shared by the intersection engine and the flattening passes.

use serde_json::{Map, Number, Value};

use crate::error::IntersectError;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON value equality where numbers compare by value, so `1` equals `1.0`.
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, v)| y.get(key).is_some_and(|w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// A JSON Schema: either a boolean literal or a keyword map.
///
/// `Bool(true)` accepts every instance (same as `{}`), `Bool(false)` rejects
/// every instance (same as `{"not": {}}`). Keyword values are kept as untyped
/// JSON and checked for shape by the keyword that owns them.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Bool(bool),
    Object(Map<String, Value>),
}

impl Schema {
    /// The schema matching everything.
    pub const ACCEPT: Schema = Schema::Bool(true);
    /// The schema matching nothing.
    pub const REJECT: Schema = Schema::Bool(false);

    /// Read a schema out of a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `IntersectError::InvalidSchema` for anything that is not a
    /// boolean or an object.
    pub fn from_value(value: &Value) -> Result<Self, IntersectError> {
        match value {
            Value::Bool(b) => Ok(Schema::Bool(*b)),
            Value::Object(map) => Ok(Schema::Object(map.clone())),
            other => Err(IntersectError::InvalidSchema {
                actual: json_type_name(other).to_string(),
            }),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Schema::Bool(b) => Value::Bool(b),
            Schema::Object(map) => Value::Object(map),
        }
    }

    /// True for `true` and `{}`.
    pub fn is_accept(&self) -> bool {
        match self {
            Schema::Bool(b) => *b,
            Schema::Object(map) => map.is_empty(),
        }
    }

    /// True for `false` and `{"not": {}}` / `{"not": true}`.
    pub fn is_reject(&self) -> bool {
        match self {
            Schema::Bool(b) => !*b,
            Schema::Object(map) => {
                map.len() == 1
                    && map
                        .get("not")
                        .and_then(|not| Schema::from_value(not).ok())
                        .is_some_and(|not| not.is_accept())
            }
        }
    }

    /// Keyword map view; boolean schemas have no keywords.
    pub fn keywords(&self) -> Option<&Map<String, Value>> {
        match self {
            Schema::Object(map) => Some(map),
            Schema::Bool(_) => None,
        }
    }
}

impl From<Schema> for Value {
    fn from(schema: Schema) -> Self {
        schema.into_value()
    }
}

impl TryFrom<&Value> for Schema {
    type Error = IntersectError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Schema::from_value(value)
    }
}
