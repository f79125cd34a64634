//! Keyword intersection table.
//!
//! Every keyword the engine knows is a [`Keyword`] variant; anything else is
//! [`Keyword::Other`]. [`Keyword::rule`] maps each keyword to the way two
//! differing values of it are combined.

use serde_json::{Map, Number, Value};

use crate::combinators::{concat_unique, distribute};
use crate::error::IntersectError;
use crate::intersect::Scope;
use crate::schema::json_equal;

/// JSON Schema / OpenAPI schema keywords known to the intersection engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    AllOf,
    AnyOf,
    OneOf,
    Not,
    Const,
    Enum,
    Type,
    Title,
    Description,
    Deprecated,
    Nullable,
    ReadOnly,
    WriteOnly,
    UniqueItems,
    Maximum,
    ExclusiveMaximum,
    Minimum,
    ExclusiveMinimum,
    MaxItems,
    MinItems,
    MaxLength,
    MinLength,
    MaxProperties,
    MinProperties,
    MultipleOf,
    Pattern,
    Required,
    DependentRequired,
    Properties,
    PatternProperties,
    AdditionalProperties,
    PropertyNames,
    Items,
    Examples,
    Example,
    Comment,
    ExternalDocs,
    Format,
    Ref,
    Default,
    /// Any keyword without a dedicated variant, including `x-` extensions.
    Other(String),
}

/// How two differing values of a keyword are combined.
#[derive(Clone, Copy)]
pub(crate) enum Rule {
    /// Binary conjunction of the two values.
    Merge(MergeFn),
    /// Annotation: dropped when the two sides disagree.
    Ignore,
    /// Handled by the property-space merger.
    PropertySpace,
    /// Computed from both inputs after the keyword pass.
    Derived,
    /// No sound merge is known.
    Unsupported,
}

pub(crate) type MergeFn = fn(Scope, &str, &Value, &Value) -> Result<Value, IntersectError>;

impl Keyword {
    pub fn from_name(name: &str) -> Self {
        match name {
            "allOf" => Keyword::AllOf,
            "anyOf" => Keyword::AnyOf,
            "oneOf" => Keyword::OneOf,
            "not" => Keyword::Not,
            "const" => Keyword::Const,
            "enum" => Keyword::Enum,
            "type" => Keyword::Type,
            "title" => Keyword::Title,
            "description" => Keyword::Description,
            "deprecated" => Keyword::Deprecated,
            "nullable" => Keyword::Nullable,
            "readOnly" => Keyword::ReadOnly,
            "writeOnly" => Keyword::WriteOnly,
            "uniqueItems" => Keyword::UniqueItems,
            "maximum" => Keyword::Maximum,
            "exclusiveMaximum" => Keyword::ExclusiveMaximum,
            "minimum" => Keyword::Minimum,
            "exclusiveMinimum" => Keyword::ExclusiveMinimum,
            "maxItems" => Keyword::MaxItems,
            "minItems" => Keyword::MinItems,
            "maxLength" => Keyword::MaxLength,
            "minLength" => Keyword::MinLength,
            "maxProperties" => Keyword::MaxProperties,
            "minProperties" => Keyword::MinProperties,
            "multipleOf" => Keyword::MultipleOf,
            "pattern" => Keyword::Pattern,
            "required" => Keyword::Required,
            "dependentRequired" => Keyword::DependentRequired,
            "properties" => Keyword::Properties,
            "patternProperties" => Keyword::PatternProperties,
            "additionalProperties" => Keyword::AdditionalProperties,
            "propertyNames" => Keyword::PropertyNames,
            "items" => Keyword::Items,
            "examples" => Keyword::Examples,
            "example" => Keyword::Example,
            "$comment" => Keyword::Comment,
            "externalDocs" => Keyword::ExternalDocs,
            "format" => Keyword::Format,
            "$ref" => Keyword::Ref,
            "default" => Keyword::Default,
            other => Keyword::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Keyword::AllOf => "allOf",
            Keyword::AnyOf => "anyOf",
            Keyword::OneOf => "oneOf",
            Keyword::Not => "not",
            Keyword::Const => "const",
            Keyword::Enum => "enum",
            Keyword::Type => "type",
            Keyword::Title => "title",
            Keyword::Description => "description",
            Keyword::Deprecated => "deprecated",
            Keyword::Nullable => "nullable",
            Keyword::ReadOnly => "readOnly",
            Keyword::WriteOnly => "writeOnly",
            Keyword::UniqueItems => "uniqueItems",
            Keyword::Maximum => "maximum",
            Keyword::ExclusiveMaximum => "exclusiveMaximum",
            Keyword::Minimum => "minimum",
            Keyword::ExclusiveMinimum => "exclusiveMinimum",
            Keyword::MaxItems => "maxItems",
            Keyword::MinItems => "minItems",
            Keyword::MaxLength => "maxLength",
            Keyword::MinLength => "minLength",
            Keyword::MaxProperties => "maxProperties",
            Keyword::MinProperties => "minProperties",
            Keyword::MultipleOf => "multipleOf",
            Keyword::Pattern => "pattern",
            Keyword::Required => "required",
            Keyword::DependentRequired => "dependentRequired",
            Keyword::Properties => "properties",
            Keyword::PatternProperties => "patternProperties",
            Keyword::AdditionalProperties => "additionalProperties",
            Keyword::PropertyNames => "propertyNames",
            Keyword::Items => "items",
            Keyword::Examples => "examples",
            Keyword::Example => "example",
            Keyword::Comment => "$comment",
            Keyword::ExternalDocs => "externalDocs",
            Keyword::Format => "format",
            Keyword::Ref => "$ref",
            Keyword::Default => "default",
            Keyword::Other(name) => name,
        }
    }

    pub(crate) fn rule(&self) -> Rule {
        match self {
            Keyword::AllOf => Rule::Merge(merge_all_of),
            Keyword::AnyOf | Keyword::OneOf => Rule::Merge(distribute),
            Keyword::Not => Rule::Merge(merge_not),
            Keyword::Const => Rule::Merge(merge_const),
            Keyword::Enum => Rule::Merge(merge_enum),
            Keyword::Type => Rule::Merge(merge_type),
            Keyword::Title | Keyword::Description => Rule::Merge(merge_text),
            Keyword::ReadOnly | Keyword::WriteOnly | Keyword::UniqueItems => {
                Rule::Merge(merge_or)
            }
            Keyword::Maximum
            | Keyword::ExclusiveMaximum
            | Keyword::MaxItems
            | Keyword::MaxLength
            | Keyword::MaxProperties => Rule::Merge(merge_min),
            Keyword::Minimum
            | Keyword::ExclusiveMinimum
            | Keyword::MinItems
            | Keyword::MinLength
            | Keyword::MinProperties => Rule::Merge(merge_max),
            Keyword::MultipleOf => Rule::Merge(merge_multiple_of),
            Keyword::Pattern => Rule::Merge(merge_pattern),
            Keyword::Required => Rule::Merge(merge_required),
            Keyword::DependentRequired => Rule::Merge(merge_dependent_required),
            Keyword::AdditionalProperties | Keyword::PropertyNames => {
                Rule::Merge(merge_subschema)
            }
            Keyword::Items => Rule::Merge(merge_items),
            Keyword::Examples => Rule::Merge(merge_examples),
            Keyword::Properties | Keyword::PatternProperties => Rule::PropertySpace,
            Keyword::Deprecated | Keyword::Nullable => Rule::Derived,
            Keyword::Example | Keyword::Comment | Keyword::ExternalDocs => Rule::Ignore,
            Keyword::Format | Keyword::Ref | Keyword::Default | Keyword::Other(_) => {
                Rule::Unsupported
            }
        }
    }
}

// --- Shape helpers ---

pub(crate) fn expect_array<'a>(
    keyword: &str,
    value: &'a Value,
) -> Result<&'a Vec<Value>, IntersectError> {
    value
        .as_array()
        .ok_or_else(|| IntersectError::invalid(keyword, "array", value))
}

pub(crate) fn expect_bool(keyword: &str, value: &Value) -> Result<bool, IntersectError> {
    value
        .as_bool()
        .ok_or_else(|| IntersectError::invalid(keyword, "boolean", value))
}

fn expect_object<'a>(
    keyword: &str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, IntersectError> {
    value
        .as_object()
        .ok_or_else(|| IntersectError::invalid(keyword, "object", value))
}

fn expect_str<'a>(keyword: &str, value: &'a Value) -> Result<&'a str, IntersectError> {
    value
        .as_str()
        .ok_or_else(|| IntersectError::invalid(keyword, "string", value))
}

pub(crate) fn expect_number(keyword: &str, value: &Value) -> Result<f64, IntersectError> {
    value
        .as_f64()
        .ok_or_else(|| IntersectError::invalid(keyword, "number", value))
}

fn expect_schema(keyword: &str, value: &Value) -> Result<(), IntersectError> {
    if value.is_boolean() || value.is_object() {
        Ok(())
    } else {
        Err(IntersectError::invalid(keyword, "schema", value))
    }
}

fn string_list<'a>(keyword: &str, value: &'a Value) -> Result<Vec<&'a str>, IntersectError> {
    expect_array(keyword, value)?
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| IntersectError::invalid(keyword, "array of strings", value))
        })
        .collect()
}

fn union_names(first: Vec<&str>, second: Vec<&str>) -> Value {
    let mut names: Vec<&str> = Vec::with_capacity(first.len() + second.len());
    for name in first.into_iter().chain(second) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Value::Array(names.into_iter().map(|n| Value::String(n.to_string())).collect())
}

// --- Merge rules ---

fn merge_all_of(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let a = expect_array(keyword, a)?;
    let b = expect_array(keyword, b)?;
    for schema in a.iter().chain(b) {
        expect_schema(keyword, schema)?;
    }
    Ok(Value::Array(concat_unique(a, b)))
}

fn merge_examples(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let a = expect_array(keyword, a)?;
    let b = expect_array(keyword, b)?;
    Ok(Value::Array(concat_unique(a, b)))
}

/// `not A` and `not B` is `not (A or B)`.
fn merge_not(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    expect_schema(keyword, a)?;
    expect_schema(keyword, b)?;
    let mut not = Map::new();
    not.insert("anyOf".to_string(), Value::Array(vec![a.clone(), b.clone()]));
    Ok(Value::Object(not))
}

fn merge_const(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    if json_equal(a, b) {
        return Ok(a.clone());
    }
    Err(IntersectError::empty(keyword, a, b))
}

fn merge_enum(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let left = expect_array(keyword, a)?;
    let right = expect_array(keyword, b)?;
    if left.iter().chain(right).any(|v| v.is_array() || v.is_object()) {
        return Err(IntersectError::not_supported(keyword, a, b));
    }

    let common: Vec<Value> = left
        .iter()
        .filter(|v| right.iter().any(|r| json_equal(v, r)))
        .cloned()
        .collect();
    if common.is_empty() {
        return Err(IntersectError::empty(keyword, a, b));
    }
    Ok(Value::Array(common))
}

fn merge_type(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let left = type_set(keyword, a)?;
    let right = type_set(keyword, b)?;

    let mut common: Vec<&str> = Vec::new();
    for ty in &left {
        let kept = if right.contains(ty) {
            Some(*ty)
        } else if (*ty == "integer" && right.contains(&"number"))
            || (*ty == "number" && right.contains(&"integer"))
        {
            // integer is a subset of number
            Some("integer")
        } else {
            None
        };
        if let Some(kept) = kept {
            if !common.contains(&kept) {
                common.push(kept);
            }
        }
    }

    match common.as_slice() {
        [] => Err(IntersectError::empty(keyword, a, b)),
        [single] => Ok(Value::String(single.to_string())),
        many => Ok(Value::Array(
            many.iter().map(|t| Value::String(t.to_string())).collect(),
        )),
    }
}

fn type_set<'a>(keyword: &str, value: &'a Value) -> Result<Vec<&'a str>, IntersectError> {
    match value {
        Value::String(s) => Ok(vec![s.as_str()]),
        Value::Array(_) => string_list(keyword, value),
        other => Err(IntersectError::invalid(keyword, "string or array of strings", other)),
    }
}

fn merge_text(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let a = expect_str(keyword, a)?;
    let b = expect_str(keyword, b)?;
    Ok(Value::String(format!(
        "Intersection of {} and {}",
        parenthesize(a),
        parenthesize(b)
    )))
}

fn parenthesize(text: &str) -> String {
    if text.contains(' ') {
        format!("({text})")
    } else {
        text.to_string()
    }
}

fn merge_or(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    Ok(Value::Bool(expect_bool(keyword, a)? || expect_bool(keyword, b)?))
}

fn merge_min(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let (x, y) = (expect_number(keyword, a)?, expect_number(keyword, b)?);
    Ok(if y < x { b.clone() } else { a.clone() })
}

fn merge_max(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let (x, y) = (expect_number(keyword, a)?, expect_number(keyword, b)?);
    Ok(if y > x { b.clone() } else { a.clone() })
}

/// Largest power of ten tried when scaling decimal `multipleOf` values.
const MAX_DECIMAL_DIGITS: u32 = 9;

fn merge_multiple_of(
    _: Scope,
    keyword: &str,
    a: &Value,
    b: &Value,
) -> Result<Value, IntersectError> {
    let x = expect_number(keyword, a)?;
    let y = expect_number(keyword, b)?;
    if x <= 0.0 || y <= 0.0 {
        return Err(IntersectError::invalid(
            keyword,
            "strictly positive number",
            if x <= 0.0 { a } else { b },
        ));
    }

    let (scale, xi, yi) =
        scale_to_integers(x, y).ok_or_else(|| IntersectError::not_supported(keyword, a, b))?;
    let lcm = lcm(xi, yi).ok_or_else(|| IntersectError::not_supported(keyword, a, b))?;

    if lcm == xi {
        return Ok(a.clone());
    }
    if lcm == yi {
        return Ok(b.clone());
    }
    if scale == 1 {
        return Ok(Value::Number(Number::from(lcm)));
    }
    Number::from_f64(lcm as f64 / scale as f64)
        .map(Value::Number)
        .ok_or_else(|| IntersectError::not_supported(keyword, a, b))
}

/// Find the smallest power of ten turning both values into exact integers.
fn scale_to_integers(x: f64, y: f64) -> Option<(u64, u64, u64)> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53

    (0..=MAX_DECIMAL_DIGITS).find_map(|digits| {
        let scale = 10u64.pow(digits);
        let (xs, ys) = (x * scale as f64, y * scale as f64);
        let exact = |v: f64| (v - v.round()).abs() <= v.abs() * 1e-12 && v.round() <= MAX_EXACT;
        (exact(xs) && exact(ys)).then(|| (scale, xs.round() as u64, ys.round() as u64))
    })
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}

fn merge_pattern(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    let a = expect_str(keyword, a)?;
    let b = expect_str(keyword, b)?;
    Ok(Value::String(format!("^{}{}", lookahead(a), lookahead(b))))
}

fn lookahead(pattern: &str) -> String {
    if pattern.starts_with('^') {
        format!("(?={pattern})")
    } else {
        format!("(?=.*{pattern})")
    }
}

fn merge_required(_: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    Ok(union_names(string_list(keyword, a)?, string_list(keyword, b)?))
}

fn merge_dependent_required(
    _: Scope,
    keyword: &str,
    a: &Value,
    b: &Value,
) -> Result<Value, IntersectError> {
    let left = expect_object(keyword, a)?;
    let right = expect_object(keyword, b)?;

    let mut merged = left.clone();
    for (name, names) in right {
        let combined = match left.get(name) {
            Some(existing) => union_names(
                string_list(keyword, existing)?,
                string_list(keyword, names)?,
            ),
            None => {
                string_list(keyword, names)?;
                names.clone()
            }
        };
        merged.insert(name.clone(), combined);
    }
    Ok(Value::Object(merged))
}

fn merge_subschema(scope: Scope, _: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    scope.intersect(a, b)
}

fn merge_items(scope: Scope, keyword: &str, a: &Value, b: &Value) -> Result<Value, IntersectError> {
    if a.is_array() || b.is_array() {
        return Err(IntersectError::not_supported(keyword, a, b));
    }
    scope.intersect(a, b)
}
