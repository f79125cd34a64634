//! Schema intersection: a single schema equivalent to the conjunction of two.

use serde_json::{Map, Value};

use crate::bounds;
use crate::error::IntersectError;
use crate::keyword::{expect_bool, Keyword, Rule};
use crate::properties;
use crate::schema::{json_equal, Schema};

/// Default limit on schema nesting followed by a single intersection.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Intersect two schemas with the default configuration.
///
/// Returns a schema accepting exactly the instances accepted by both inputs.
/// Inputs are never modified.
///
/// # Errors
///
/// - `IntersectError::EmptyIntersection` when no instance can satisfy both
/// - `IntersectError::NotSupported` when no sound merge is known
/// - `IntersectError::InvalidValue` / `InvalidSchema` for malformed input
pub fn intersect_schema(a: &Value, b: &Value) -> Result<Value, IntersectError> {
    Intersector::new().intersect(a, b)
}

/// Configurable entry point to the intersection engine.
#[derive(Debug, Clone, Copy)]
pub struct Intersector {
    max_depth: usize,
}

impl Default for Intersector {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Intersector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `DepthExceeded` instead of recursing deeper than `limit`.
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// Intersect two schemas.
    ///
    /// # Errors
    ///
    /// See [`intersect_schema`].
    pub fn intersect(&self, a: &Value, b: &Value) -> Result<Value, IntersectError> {
        Scope {
            depth: 0,
            limit: self.max_depth,
        }
        .intersect(a, b)
    }

    /// Intersect any number of schemas, left to right. No schemas gives `true`.
    ///
    /// # Errors
    ///
    /// See [`intersect_schema`].
    pub fn intersect_all<'a, I>(&self, schemas: I) -> Result<Value, IntersectError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        schemas
            .into_iter()
            .try_fold(Value::Bool(true), |acc, schema| self.intersect(&acc, schema))
    }
}

/// Recursion state threaded through keyword rules.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    depth: usize,
    limit: usize,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            depth: 0,
            limit: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Scope {
    /// Intersect two subschemas one level deeper.
    pub(crate) fn intersect(self, a: &Value, b: &Value) -> Result<Value, IntersectError> {
        if self.depth >= self.limit {
            return Err(IntersectError::DepthExceeded { limit: self.limit });
        }
        let inner = Scope {
            depth: self.depth + 1,
            ..self
        };
        intersect_values(inner, a, b)
    }
}

fn intersect_values(scope: Scope, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let left = Schema::from_value(a)?;
    let right = Schema::from_value(b)?;

    if left.is_reject() || right.is_reject() {
        return Ok(Value::Bool(false));
    }
    if right.is_accept() {
        return Ok(a.clone());
    }
    if left.is_accept() || json_equal(a, b) {
        return Ok(b.clone());
    }

    match (left, right) {
        (Schema::Object(left), Schema::Object(right)) => {
            intersect_objects(scope, left, right).map(Value::Object)
        }
        // a boolean schema is always accept or reject
        _ => Ok(Value::Bool(true)),
    }
}

fn intersect_objects(
    scope: Scope,
    mut left: Map<String, Value>,
    mut right: Map<String, Value>,
) -> Result<Map<String, Value>, IntersectError> {
    let left_legacy = bounds::to_numeric(&mut left)?;
    let right_legacy = bounds::to_numeric(&mut right)?;

    let space = properties::merge(scope, &left, &right)?;

    let mut merged = left.clone();
    merged.remove("properties");
    merged.remove("patternProperties");
    if let Some(properties) = space.properties {
        merged.insert("properties".to_string(), Value::Object(properties));
    }
    if let Some(patterns) = space.pattern_properties {
        merged.insert("patternProperties".to_string(), Value::Object(patterns));
    }

    for (name, value) in &right {
        let keyword = Keyword::from_name(name);
        let rule = keyword.rule();
        if matches!(rule, Rule::PropertySpace) {
            continue;
        }

        let Some(existing) = merged.get(name) else {
            merged.insert(name.clone(), value.clone());
            continue;
        };
        if json_equal(existing, value) {
            continue;
        }

        match rule {
            Rule::Merge(merge) => {
                let combined = merge(scope, keyword.name(), existing, value)?;
                merged.insert(name.clone(), combined);
            }
            Rule::Ignore | Rule::Derived => {
                merged.remove(name);
            }
            Rule::Unsupported => {
                return Err(IntersectError::not_supported(name, existing, value));
            }
            Rule::PropertySpace => {}
        }
    }

    derive_deprecated(&mut merged, &left, &right)?;
    derive_nullable(&mut merged, &left, &right)?;
    bounds::finish(&mut merged, left_legacy || right_legacy)?;

    Ok(merged)
}

fn flag(map: &Map<String, Value>, keyword: &str) -> Result<Option<bool>, IntersectError> {
    map.get(keyword).map(|v| expect_bool(keyword, v)).transpose()
}

/// Deprecated only when both sources are.
fn derive_deprecated(
    merged: &mut Map<String, Value>,
    left: &Map<String, Value>,
    right: &Map<String, Value>,
) -> Result<(), IntersectError> {
    let both = flag(left, "deprecated")? == Some(true) && flag(right, "deprecated")? == Some(true);
    if both {
        merged.insert("deprecated".to_string(), Value::Bool(true));
    } else {
        merged.remove("deprecated");
    }
    Ok(())
}

/// Nullable only when both sides admit `null`.
fn derive_nullable(
    merged: &mut Map<String, Value>,
    left: &Map<String, Value>,
    right: &Map<String, Value>,
) -> Result<(), IntersectError> {
    let left_flag = flag(left, "nullable")?;
    let right_flag = flag(right, "nullable")?;
    if left_flag.is_none() && right_flag.is_none() {
        return Ok(());
    }

    if admits_null(left, left_flag) && admits_null(right, right_flag) {
        merged.insert("nullable".to_string(), Value::Bool(true));
    } else {
        merged.remove("nullable");
    }
    Ok(())
}

fn admits_null(schema: &Map<String, Value>, nullable: Option<bool>) -> bool {
    if nullable == Some(true) {
        return true;
    }
    match schema.get("type") {
        None => nullable.is_none(),
        Some(Value::String(t)) => t == "null",
        Some(Value::Array(types)) => types.iter().any(|t| t == "null"),
        Some(_) => false,
    }
}
