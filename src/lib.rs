//! Schema Intersection
//!
//! Computes a single JSON Schema equivalent to the conjunction of two or more
//! schemas, and uses it to flatten `allOf` / `anyOf` / `oneOf` in OpenAPI
//! documents before they reach a code generator.
//!
//! # Example
//!
//! ```
//! use schema_intersect::intersect_schema;
//! use serde_json::json;
//!
//! let merged = intersect_schema(
//!     &json!({ "type": "number", "maximum": 10 }),
//!     &json!({ "type": "integer", "maximum": 5, "required": ["id"] }),
//! )
//! .unwrap();
//!
//! assert_eq!(merged, json!({ "type": "integer", "maximum": 5, "required": ["id"] }));
//! ```
//!
//! Flattening a document:
//!
//! ```
//! use schema_intersect::{MergeCombinator, SchemaTransformer};
//! use serde_json::json;
//!
//! let document = json!({
//!     "openapi": "3.1.0",
//!     "components": {
//!         "schemas": {
//!             "Count": { "maximum": 5, "allOf": [{ "minimum": 3 }] }
//!         }
//!     }
//! });
//!
//! let flattened = MergeCombinator::all_of().transform_openapi(&document).unwrap();
//! assert_eq!(
//!     flattened["components"]["schemas"]["Count"],
//!     json!({ "maximum": 5, "minimum": 3 })
//! );
//! ```
//!
//! # Outcomes
//!
//! | Result | Meaning |
//! |--------|---------|
//! | `Ok(schema)` | `schema` accepts exactly what both inputs accept |
//! | `EmptyIntersection` | no instance satisfies both; equivalent to `false` |
//! | `NotSupported` | no sound merge rule is known; leave the inputs separate |
//! | `InvalidValue` / `InvalidSchema` | malformed input |

mod bounds;
mod combinators;
mod error;
mod flatten;
mod intersect;
mod keyword;
mod loader;
mod properties;
mod schema;
mod visit;

pub use error::{FlattenError, IntersectError, LoadError};
pub use flatten::{Combinator, MergeCombinator, MergeSubschemas, SchemaTransformer, Skip};
pub use intersect::{intersect_schema, Intersector, DEFAULT_MAX_DEPTH};
pub use keyword::Keyword;
pub use loader::{
    is_url, load_document, load_document_auto, load_document_stdin, load_document_str,
    STDIN_SOURCE,
};
pub use schema::{json_type_name, Schema};
pub use visit::{is_openapi, pointer, visit_document, visit_schema};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
