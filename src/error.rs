//! Error types for schema intersection, flattening, and document loading.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Errors raised while intersecting two schemas.
#[derive(Debug, Error)]
pub enum IntersectError {
    /// The two schemas provably share no satisfying instance.
    #[error("empty intersection for {keyword}: {left} and {right} are incompatible")]
    EmptyIntersection {
        keyword: String,
        left: Value,
        right: Value,
    },

    /// No sound merge rule is known for this keyword/value combination.
    #[error("intersection not supported for keyword {keyword}: {left} and {right}")]
    NotSupported {
        keyword: String,
        left: Value,
        right: Value,
    },

    #[error("invalid value for {keyword}: expected {expected}, got {actual}")]
    InvalidValue {
        keyword: String,
        expected: &'static str,
        actual: String,
    },

    #[error("invalid schema: expected boolean or object, got {actual}")]
    InvalidSchema { actual: String },

    #[error("invalid patternProperties key {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },

    #[error("schema nesting exceeds maximum depth of {limit}")]
    DepthExceeded { limit: usize },
}

impl IntersectError {
    pub(crate) fn empty(keyword: &str, left: &Value, right: &Value) -> Self {
        Self::EmptyIntersection {
            keyword: keyword.to_string(),
            left: left.clone(),
            right: right.clone(),
        }
    }

    pub(crate) fn not_supported(keyword: &str, left: &Value, right: &Value) -> Self {
        Self::NotSupported {
            keyword: keyword.to_string(),
            left: left.clone(),
            right: right.clone(),
        }
    }

    pub(crate) fn invalid(keyword: &str, expected: &'static str, actual: &Value) -> Self {
        Self::InvalidValue {
            keyword: keyword.to_string(),
            expected,
            actual: crate::schema::json_type_name(actual).to_string(),
        }
    }

    /// True when the inputs are contradictory (the result would be `false`).
    pub fn is_empty_intersection(&self) -> bool {
        matches!(self, Self::EmptyIntersection { .. })
    }

    /// True when the engine does not know how to merge the inputs.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EmptyIntersection { .. } => 1,
            _ => 2,
        }
    }
}

/// Errors raised by the combinator-flattening passes.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("cannot flatten schema at {path}: {source}")]
    Intersect {
        path: String,
        #[source]
        source: IntersectError,
    },

    #[error("flattening {keyword} with {count} alternatives is not implemented (at {path})")]
    NotImplemented {
        keyword: &'static str,
        count: usize,
        path: String,
    },

    #[error("invalid {keyword} at {path}: expected array, got {actual}")]
    InvalidCombinator {
        keyword: &'static str,
        path: String,
        actual: String,
    },
}

impl FlattenError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlattenError::Intersect { source, .. } => source.exit_code(),
            _ => 2,
        }
    }
}

/// Errors while loading a document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}
