//! Error types for schema loading and sanitizing

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors raised while building or sanitizing a schema.
///
/// Hook, validate and access functions fail with their own errors; those are
/// passed through to the caller and never wrapped here.
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Two data-bearing fields resolve to the same path
    #[error("duplicate field name at '{path}'")]
    DuplicateFieldName { path: String },

    /// Two blocks of one blocks field share a slug
    #[error("duplicate block slug '{slug}' in '{path}'")]
    DuplicateBlockSlug { path: String, slug: String },

    /// Field names must be non-empty, contain no '.', and not read as a row segment
    #[error("invalid field name '{name}' at '{path}'")]
    InvalidFieldName { path: String, name: String },

    /// Two in-code collections share a slug
    #[error("duplicate collection: {slug}")]
    DuplicateCollection { slug: String },

    /// Collection not found by slug
    #[error("collection not found: {slug}")]
    CollectionNotFound { slug: String },

    /// Schema directory not found
    #[error("schema directory not found: {path}")]
    NotInitialized { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
