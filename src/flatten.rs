//! Combinator-flattening passes.
//!
//! Each pass replaces `{..., "allOf": [A, B]}`-style schema nodes with the
//! intersection of the node's own keywords and the combinator members.
//!
//! | Pass | Empty array | Several members |
//! |------|-------------|-----------------|
//! | `allOf` | removed | intersected |
//! | `anyOf` | kept, warning | error unless all members are equal |
//! | `oneOf` | kept, warning | error |
//!
//! Single-combinator passes propagate every failure. [`MergeSubschemas`]
//! runs all three and leaves a node's combinator in place when it cannot be
//! merged, so one bad schema does not stop the rest of the document.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FlattenError;
use crate::intersect::Intersector;
use crate::schema::{json_equal, json_type_name};
use crate::visit::{is_openapi, visit_document, visit_schema};

/// Schema combinator keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    AllOf,
    AnyOf,
    OneOf,
}

impl Combinator {
    /// All combinators, in the order the combined pass applies them.
    pub const ALL: [Combinator; 3] = [Combinator::AllOf, Combinator::AnyOf, Combinator::OneOf];

    /// Returns the JSON Schema keyword for this combinator.
    pub fn keyword(&self) -> &'static str {
        match self {
            Combinator::AllOf => "allOf",
            Combinator::AnyOf => "anyOf",
            Combinator::OneOf => "oneOf",
        }
    }
}

/// A document-level schema rewrite.
///
/// Implementors only rewrite a single node; the provided methods walk a
/// document bottom-up and rebuild it around the replacements.
pub trait SchemaTransformer {
    /// Rewrite one schema node whose children were already transformed.
    ///
    /// # Errors
    ///
    /// Returns `FlattenError` when the node cannot be rewritten.
    fn transform_node(&self, schema: Value, path: &str) -> Result<Value, FlattenError>;

    /// Transform every schema in an OpenAPI document.
    ///
    /// # Errors
    ///
    /// Returns the first `FlattenError` raised for any node.
    #[tracing::instrument(skip_all)]
    fn transform_openapi(&self, document: &Value) -> Result<Value, FlattenError> {
        visit_document(document, &mut |node, path| self.transform_node(node, path))
    }

    /// Transform a JSON Schema and all of its subschemas.
    ///
    /// # Errors
    ///
    /// Returns the first `FlattenError` raised for any node.
    #[tracing::instrument(skip_all)]
    fn transform_schema(&self, schema: &Value) -> Result<Value, FlattenError> {
        visit_schema(schema, "", &mut |node, path| self.transform_node(node, path))
    }

    /// Transform an OpenAPI document or, if it declares no OpenAPI version,
    /// a plain JSON Schema.
    ///
    /// # Errors
    ///
    /// Returns the first `FlattenError` raised for any node.
    fn transform(&self, document: &Value) -> Result<Value, FlattenError> {
        if is_openapi(document) {
            self.transform_openapi(document)
        } else {
            self.transform_schema(document)
        }
    }
}

/// Flattens a single combinator keyword, failing fast.
#[derive(Debug, Clone, Copy)]
pub struct MergeCombinator {
    combinator: Combinator,
    intersector: Intersector,
}

impl MergeCombinator {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            intersector: Intersector::default(),
        }
    }

    /// Flatten `allOf`.
    pub fn all_of() -> Self {
        Self::new(Combinator::AllOf)
    }

    /// Flatten single-member `anyOf`.
    pub fn any_of() -> Self {
        Self::new(Combinator::AnyOf)
    }

    /// Flatten single-member `oneOf`.
    pub fn one_of() -> Self {
        Self::new(Combinator::OneOf)
    }

    pub fn with_intersector(mut self, intersector: Intersector) -> Self {
        self.intersector = intersector;
        self
    }
}

impl SchemaTransformer for MergeCombinator {
    fn transform_node(&self, schema: Value, path: &str) -> Result<Value, FlattenError> {
        flatten_node(&self.intersector, self.combinator, schema, path)
    }
}

type SkipPredicate = Box<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Whether the combined pass should leave a combinator alone.
#[derive(Default)]
pub enum Skip {
    #[default]
    Never,
    Always,
    /// Skip when the predicate returns true for the combinator's members.
    When(SkipPredicate),
}

impl Skip {
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        Skip::When(Box::new(predicate))
    }

    fn applies(&self, members: &[Value]) -> bool {
        match self {
            Skip::Never => false,
            Skip::Always => true,
            Skip::When(predicate) => predicate(members),
        }
    }
}

impl From<bool> for Skip {
    fn from(skip: bool) -> Self {
        if skip {
            Skip::Always
        } else {
            Skip::Never
        }
    }
}

impl fmt::Debug for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::Never => f.write_str("Never"),
            Skip::Always => f.write_str("Always"),
            Skip::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Flattens `allOf`, `anyOf` and `oneOf` as far as possible.
///
/// Nodes whose members are contradictory or cannot be merged are logged and
/// left as they are. Multi-member `anyOf`/`oneOf` are kept silently.
#[derive(Debug, Default)]
pub struct MergeSubschemas {
    skip_all_of: Skip,
    skip_any_of: Skip,
    skip_one_of: Skip,
    intersector: Intersector,
}

impl MergeSubschemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_all_of(mut self, skip: impl Into<Skip>) -> Self {
        self.skip_all_of = skip.into();
        self
    }

    pub fn skip_any_of(mut self, skip: impl Into<Skip>) -> Self {
        self.skip_any_of = skip.into();
        self
    }

    pub fn skip_one_of(mut self, skip: impl Into<Skip>) -> Self {
        self.skip_one_of = skip.into();
        self
    }

    pub fn with_intersector(mut self, intersector: Intersector) -> Self {
        self.intersector = intersector;
        self
    }

    fn skip_for(&self, combinator: Combinator) -> &Skip {
        match combinator {
            Combinator::AllOf => &self.skip_all_of,
            Combinator::AnyOf => &self.skip_any_of,
            Combinator::OneOf => &self.skip_one_of,
        }
    }
}

impl SchemaTransformer for MergeSubschemas {
    fn transform_node(&self, schema: Value, path: &str) -> Result<Value, FlattenError> {
        let mut node = schema;
        for combinator in Combinator::ALL {
            let keyword = combinator.keyword();
            let skipped = match node.get(keyword).and_then(Value::as_array) {
                Some(members) => self.skip_for(combinator).applies(members),
                // absent; a non-array value is reported by flatten_node
                None => node.get(keyword).is_none(),
            };
            if skipped {
                continue;
            }

            match flatten_node(&self.intersector, combinator, node.clone(), path) {
                Ok(flattened) => node = flattened,
                Err(FlattenError::NotImplemented { count, .. }) => {
                    debug!(path = %path, keyword, count, "keeping multi-member combinator");
                }
                Err(FlattenError::Intersect { source, .. })
                    if source.is_empty_intersection() || source.is_not_supported() =>
                {
                    warn!(path = %path, keyword, error = %source, "leaving combinator unflattened");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(node)
    }
}

/// Replace `combinator` on one node with the intersection of its members and
/// the node's remaining keywords.
fn flatten_node(
    intersector: &Intersector,
    combinator: Combinator,
    schema: Value,
    path: &str,
) -> Result<Value, FlattenError> {
    let keyword = combinator.keyword();
    let Value::Object(mut map) = schema else {
        return Ok(schema);
    };
    let members = match map.get(keyword) {
        None => return Ok(Value::Object(map)),
        Some(Value::Array(members)) => members.clone(),
        Some(other) => {
            return Err(FlattenError::InvalidCombinator {
                keyword,
                path: path.to_string(),
                actual: json_type_name(other).to_string(),
            })
        }
    };

    if members.is_empty() {
        if combinator == Combinator::AllOf {
            // vacuously true
            map.remove(keyword);
        } else {
            warn!(path = %path, keyword, "empty {keyword} matches nothing, leaving it in place");
        }
        return Ok(Value::Object(map));
    }

    let members = match combinator {
        Combinator::AnyOf => dedup(members),
        // oneOf: [A, A] matches nothing, so duplicates are meaningful
        Combinator::AllOf | Combinator::OneOf => members,
    };
    if combinator != Combinator::AllOf && members.len() > 1 {
        return Err(FlattenError::NotImplemented {
            keyword,
            count: members.len(),
            path: path.to_string(),
        });
    }

    map.remove(keyword);
    let flattened = members
        .iter()
        .try_fold(Value::Object(map), |parent, member| {
            intersector.intersect(&parent, member)
        })
        .map_err(|source| FlattenError::Intersect {
            path: path.to_string(),
            source,
        })?;

    debug!(path = %path, keyword, members = members.len(), "flattened combinator");
    Ok(flattened)
}

fn dedup(members: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(members.len());
    for member in members {
        if !unique.iter().any(|kept| json_equal(kept, &member)) {
            unique.push(member);
        }
    }
    unique
}
