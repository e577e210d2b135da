//! Field configuration schema for content documents
//!
//! `fieldkit-fields` models the fields of a document collection: a closed
//! set of field kinds, the predicates every consumer uses to ask what a
//! field can do, the rule that maps a nested field tree onto stored data
//! paths, and the function slots (hooks, validators, access predicates,
//! conditions) that document engines and renderers invoke.
//!
//! # Architecture
//!
//! - **Schema-only**: Describes fields and runs their functions on request; storage belongs to the caller
//! - **Closed taxonomy**: `Field` is a tagged enum; toggled shapes are separate variants, so invalid configs do not parse
//! - **One traversal rule**: `path` defines transparent/opaque boundaries once; hooks, validation and sanitizing reuse it
//! - **Sync or deferred**: every hook/validate/access result is a `Deferred`, resolved before the next step observes it
//! - **YAML on disk**: `SchemaRegistry` loads one `.yaml` per collection and merges collections defined in code

pub mod access;
pub mod admin;
pub mod classify;
pub mod context;
pub mod contract;
pub mod error;
pub mod hooks;
pub mod path;
pub mod sanitize;
pub mod types;
pub mod validation;

pub use access::{AccessArgs, FieldAccess, FieldAccessControl};
pub use classify::{FieldKind, WithMany, WithMaxDepth, WithSubFields};
pub use context::{CollectionConfig, SchemaRegistry, SchemaRegistryBuilder};
pub use contract::{
    Condition, Deferred, Document, DocumentId, FilterOptions, FilterOptionsArgs, Operation,
    Request, RequestContext, UserRecord,
};
pub use error::{FieldsError, Result};
pub use hooks::{
    run_field_hooks, run_stage, run_stages, FieldHook, FieldHooks, HookArgs, HookScope, HookStage,
};
pub use path::{
    data_paths, document_entries, resolve, walk_schema, Boundary, FieldPath, NodeRef, PathSegment,
};
pub use sanitize::sanitize_fields;
pub use types::{
    option_is_object, option_is_value, options_are_objects, Block, Cardinality, Field, FieldBase,
    Label, Labels, LocalizedText, RelationTo, RelationshipValue, RowBounds, SelectOption, Tab,
    ValueWithRelation,
};
pub use validation::{
    validate_default, FieldConstraints, FieldError, Validate, ValidateOptions, ValidationEngine,
    ValidationResult, ValidationScope,
};
