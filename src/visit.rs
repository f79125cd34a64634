//! Document traversal.
//!
//! Walks an OpenAPI document (or a bare JSON Schema) and hands every schema
//! node to a callback, children before parents. The walk rebuilds the tree
//! as it goes, so the input is never modified and the callback only has to
//! return the replacement for the node it was given.

use serde_json::{Map, Value};

/// Keywords whose value is a map of name to schema.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
];

/// Keywords whose value is an array of schemas.
const SCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value is a single schema.
const SUBSCHEMA_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "additionalProperties",
    "propertyNames",
    "not",
    "if",
    "then",
    "else",
    "contains",
    "unevaluatedItems",
    "unevaluatedProperties",
    "contentSchema",
];

/// True when the document declares an `openapi` or `swagger` version.
pub fn is_openapi(document: &Value) -> bool {
    document.get("openapi").is_some() || document.get("swagger").is_some()
}

/// Visit every schema in an OpenAPI 2.0 / 3.x document.
///
/// Schemas are found under `schema` keys (parameters, media types, headers,
/// OpenAPI 2.0 responses), `components/schemas` and the OpenAPI 2.0 root
/// `definitions`. Examples and `x-` extensions are copied verbatim.
///
/// # Errors
///
/// Returns the first error produced by `visit`.
pub fn visit_document<E, F>(document: &Value, visit: &mut F) -> Result<Value, E>
where
    F: FnMut(Value, &str) -> Result<Value, E>,
{
    walk_document(document, "", visit)
}

/// Visit every schema node in a JSON Schema tree, including the root.
///
/// `path` is the JSON Pointer of `schema` within its document.
///
/// # Errors
///
/// Returns the first error produced by `visit`.
pub fn visit_schema<E, F>(schema: &Value, path: &str, visit: &mut F) -> Result<Value, E>
where
    F: FnMut(Value, &str) -> Result<Value, E>,
{
    let Value::Object(map) = schema else {
        return visit(schema.clone(), path);
    };

    let mut result = Map::new();
    for (key, child) in map {
        let child_path = pointer(path, key);
        let keyword = key.as_str();
        let is_schema_list =
            SCHEMA_LIST_KEYWORDS.contains(&keyword) || (keyword == "items" && child.is_array());
        let walked = if SCHEMA_MAP_KEYWORDS.contains(&keyword) {
            walk_schema_map(child, &child_path, visit)?
        } else if is_schema_list {
            walk_schema_list(child, &child_path, visit)?
        } else if SUBSCHEMA_KEYWORDS.contains(&keyword) {
            walk_subschema(child, &child_path, visit)?
        } else {
            child.clone()
        };
        result.insert(key.clone(), walked);
    }

    visit(Value::Object(result), path)
}

/// Append a reference token to a JSON Pointer (RFC 6901 escaping).
pub fn pointer(base: &str, token: &str) -> String {
    format!("{}/{}", base, token.replace('~', "~0").replace('/', "~1"))
}

// --- Internal implementation ---

fn walk_document<E, F>(value: &Value, path: &str, visit: &mut F) -> Result<Value, E>
where
    F: FnMut(Value, &str) -> Result<Value, E>,
{
    match value {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, child) in map {
                let child_path = pointer(path, key);
                let walked = match key.as_str() {
                    "schema" => walk_subschema(child, &child_path, visit)?,
                    "schemas" if path == "/components" => {
                        walk_schema_map(child, &child_path, visit)?
                    }
                    "definitions" if path.is_empty() => walk_schema_map(child, &child_path, visit)?,
                    // Example payloads may look like anything, including schemas
                    "example" | "examples" => child.clone(),
                    k if k.starts_with("x-") => child.clone(),
                    _ => walk_document(child, &child_path, visit)?,
                };
                result.insert(key.clone(), walked);
            }
            Ok(Value::Object(result))
        }
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                result.push(walk_document(item, &pointer(path, &i.to_string()), visit)?);
            }
            Ok(Value::Array(result))
        }
        other => Ok(other.clone()),
    }
}

fn walk_subschema<E, F>(value: &Value, path: &str, visit: &mut F) -> Result<Value, E>
where
    F: FnMut(Value, &str) -> Result<Value, E>,
{
    if value.is_object() || value.is_boolean() {
        visit_schema(value, path, visit)
    } else {
        Ok(value.clone())
    }
}

fn walk_schema_map<E, F>(value: &Value, path: &str, visit: &mut F) -> Result<Value, E>
where
    F: FnMut(Value, &str) -> Result<Value, E>,
{
    let Some(schemas) = value.as_object() else {
        return Ok(value.clone());
    };

    let mut result = Map::new();
    for (name, schema) in schemas {
        let walked = walk_subschema(schema, &pointer(path, name), visit)?;
        result.insert(name.clone(), walked);
    }
    Ok(Value::Object(result))
}

fn walk_schema_list<E, F>(value: &Value, path: &str, visit: &mut F) -> Result<Value, E>
where
    F: FnMut(Value, &str) -> Result<Value, E>,
{
    let Some(schemas) = value.as_array() else {
        return Ok(value.clone());
    };

    let mut result = Vec::with_capacity(schemas.len());
    for (i, schema) in schemas.iter().enumerate() {
        result.push(walk_subschema(schema, &pointer(path, &i.to_string()), visit)?);
    }
    Ok(Value::Array(result))
}
