//! Field validation.
//!
//! A field may carry its own [`Validate`] function. Without one, the
//! [`ValidationEngine`] applies a default policy built only from the
//! constraints the field declares (required, bounds, lengths, row counts,
//! option lists). Either way the answer is [`ValidationResult::Valid`] or a
//! human-readable message; validation never raises errors of its own.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::contract::{Deferred, Document, DocumentId, Operation, UserRecord};
use crate::path::{document_entries, FieldPath, NodeRef};
use crate::types::{
    Cardinality, Field, RelationTo, RowBounds, SelectOption, ValueWithRelation, BLOCK_TYPE_KEY,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

const REQUIRED: &str = "This field is required.";

/// Outcome of validating one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn invalid(message: impl Into<String>) -> Self {
        ValidationResult::Invalid(message.into())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(message) => Some(message),
        }
    }
}

/// What a field declares about acceptable values.
///
/// `rows` is present exactly when the field stores a list: arrays, blocks
/// and `hasMany` number/select/relationship fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldConstraints {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub rows: Option<RowBounds>,
    /// Allowed values, for select and radio fields.
    pub options: Vec<String>,
}

impl FieldConstraints {
    pub fn is_multi_valued(&self) -> bool {
        self.rows.is_some()
    }
}

fn option_values(options: &[SelectOption]) -> Vec<String> {
    options.iter().map(|o| o.value().to_string()).collect()
}

impl Field {
    /// The constraints this field declares.
    ///
    /// Groups cannot be required; a `required` flag on one is ignored and
    /// only its children's own flags apply.
    pub fn constraints(&self) -> FieldConstraints {
        let required =
            !matches!(self, Field::Group(_)) && self.base().is_some_and(|b| b.required);
        let base = FieldConstraints {
            required,
            ..Default::default()
        };
        match self {
            Field::Text(f) => FieldConstraints {
                min_length: f.min_length,
                max_length: f.max_length,
                ..base
            },
            Field::Textarea(f) => FieldConstraints {
                min_length: f.min_length,
                max_length: f.max_length,
                ..base
            },
            Field::Code(f) => FieldConstraints {
                min_length: f.min_length,
                max_length: f.max_length,
                ..base
            },
            Field::Number(f) => FieldConstraints {
                min: f.min,
                max: f.max,
                rows: f.cardinality.row_bounds(),
                ..base
            },
            Field::Select(f) => FieldConstraints {
                rows: f.cardinality.row_bounds(),
                options: option_values(&f.options),
                ..base
            },
            Field::Radio(f) => FieldConstraints {
                options: option_values(&f.options),
                ..base
            },
            Field::Relationship(f) => FieldConstraints {
                rows: f.cardinality.0.row_bounds(),
                ..base
            },
            Field::Array(f) => FieldConstraints {
                rows: Some(f.rows),
                ..base
            },
            Field::Blocks(f) => FieldConstraints {
                rows: Some(f.rows),
                ..base
            },
            Field::Email(_)
            | Field::Checkbox(_)
            | Field::Date(_)
            | Field::Group(_)
            | Field::RichText(_)
            | Field::Upload(_)
            | Field::Json(_)
            | Field::Point(_)
            | Field::Row(_)
            | Field::Collapsible(_)
            | Field::Tabs(_)
            | Field::Ui(_)
            | Field::Tab(_) => base,
        }
    }
}

/// The bundle handed to a validate function alongside the value.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub data: Document,
    pub sibling_data: Document,
    pub id: Option<DocumentId>,
    pub user: Option<UserRecord>,
    pub operation: Option<Operation>,
    pub path: FieldPath,
    pub constraints: FieldConstraints,
}

type ValidateFn =
    dyn Fn(Option<Value>, ValidateOptions) -> Deferred<ValidationResult> + Send + Sync;

/// A custom validate function. Replaces the default policy for its field.
#[derive(Clone)]
pub struct Validate(Arc<ValidateFn>);

impl Validate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<Value>, ValidateOptions) -> Deferred<ValidationResult> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Option<Value>, ValidateOptions) -> ValidationResult + Send + Sync + 'static,
    {
        Self::new(move |value, options| Deferred::ready(f(value, options)))
    }

    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(Option<Value>, ValidateOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ValidationResult> + Send + 'static,
    {
        Self::new(move |value, options| Deferred::pending(f(value, options)))
    }

    pub fn call(
        &self,
        value: Option<Value>,
        options: ValidateOptions,
    ) -> Deferred<ValidationResult> {
        (self.0)(value, options)
    }
}

impl fmt::Debug for Validate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validate").finish_non_exhaustive()
    }
}

impl PartialEq for Validate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn check_rows(bounds: RowBounds, len: usize) -> Result<(), String> {
    if let Some(min) = bounds.min_rows {
        if len < min as usize {
            return Err(format!("This field requires at least {min} row(s)."));
        }
    }
    if let Some(max) = bounds.max_rows {
        if len > max as usize {
            return Err(format!("This field allows no more than {max} row(s)."));
        }
    }
    Ok(())
}

fn check_length(constraints: &FieldConstraints, value: &Value) -> Result<(), String> {
    let Some(s) = value.as_str() else {
        return Err("This field must be text.".into());
    };
    let len = s.chars().count();
    if let Some(min) = constraints.min_length {
        if len < min as usize {
            return Err(format!("This value must be at least {min} characters long."));
        }
    }
    if let Some(max) = constraints.max_length {
        if len > max as usize {
            return Err(format!("This value must be at most {max} characters long."));
        }
    }
    Ok(())
}

fn check_number(constraints: &FieldConstraints, value: &Value) -> Result<(), String> {
    let Some(n) = value.as_f64() else {
        return Err(format!("{value} is not a valid number."));
    };
    if let Some(min) = constraints.min {
        if n < min {
            return Err(format!("{n} is less than the minimum of {min}."));
        }
    }
    if let Some(max) = constraints.max {
        if n > max {
            return Err(format!("{n} is greater than the maximum of {max}."));
        }
    }
    Ok(())
}

fn check_option(constraints: &FieldConstraints, value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(s) if constraints.options.iter().any(|o| o == s) => Ok(()),
        _ => Err(format!("{value} is not a valid option.")),
    }
}

fn check_date(value: &Value) -> Result<(), String> {
    let valid = value.as_str().is_some_and(|s| {
        DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
    });
    if valid {
        Ok(())
    } else {
        Err(format!("{value} is not a valid date."))
    }
}

fn check_point(value: &Value) -> Result<(), String> {
    let coords: Option<Vec<f64>> = value
        .as_array()
        .filter(|a| a.len() == 2)
        .and_then(|a| a.iter().map(Value::as_f64).collect());
    match coords.as_deref() {
        Some([lng, lat]) if (-180.0..=180.0).contains(lng) && (-90.0..=90.0).contains(lat) => {
            Ok(())
        }
        Some(_) => Err("Coordinates are out of range.".into()),
        None => Err("A point must be a [longitude, latitude] pair.".into()),
    }
}

fn check_relation(relation_to: &RelationTo, value: &Value) -> Result<(), String> {
    match relation_to {
        RelationTo::Many(slugs) => match ValueWithRelation::from_value(value) {
            Some(pair) if slugs.contains(&pair.relation_to) => Ok(()),
            Some(pair) => Err(format!("{} is not a valid relation.", pair.relation_to)),
            None => Err("A relation must name its collection.".into()),
        },
        RelationTo::One(_) => match value {
            Value::String(_) | Value::Number(_) | Value::Object(_) => Ok(()),
            _ => Err(format!("{value} is not a valid id.")),
        },
    }
}

fn expect_rows(constraints: &FieldConstraints, value: &Value) -> Result<Vec<Value>, String> {
    let Some(items) = value.as_array() else {
        return Err("This field must be a list.".into());
    };
    if let Some(bounds) = constraints.rows {
        check_rows(bounds, items.len())?;
    }
    Ok(items.clone())
}

/// Apply the default policy for a field to a candidate value.
pub fn validate_default(field: &Field, value: Option<&Value>) -> ValidationResult {
    let constraints = field.constraints();
    if is_empty(value) {
        if constraints.required {
            return ValidationResult::invalid(REQUIRED);
        }
        // An empty list still has to meet its minimum row count.
        if let (Some(Value::Array(_)), Some(bounds)) = (value, constraints.rows) {
            if let Err(message) = check_rows(bounds, 0) {
                return ValidationResult::Invalid(message);
            }
        }
        return ValidationResult::Valid;
    }
    let Some(value) = value else {
        return ValidationResult::Valid;
    };
    match check_kind(field, &constraints, value) {
        Ok(()) => ValidationResult::Valid,
        Err(message) => ValidationResult::Invalid(message),
    }
}

fn check_kind(field: &Field, constraints: &FieldConstraints, value: &Value) -> Result<(), String> {
    match field {
        Field::Text(_) | Field::Textarea(_) | Field::Code(_) => check_length(constraints, value),
        Field::Email(_) => match value.as_str() {
            Some(s) if EMAIL_RE.is_match(s) => Ok(()),
            _ => Err("Please enter a valid email address.".into()),
        },
        Field::Number(f) => match f.cardinality {
            Cardinality::One => check_number(constraints, value),
            Cardinality::Many(_) => expect_rows(constraints, value)?
                .iter()
                .try_for_each(|n| check_number(constraints, n)),
        },
        Field::Checkbox(_) => match value {
            Value::Bool(_) => Ok(()),
            _ => Err("This field must be true or false.".into()),
        },
        Field::Date(_) => check_date(value),
        Field::Select(f) => match f.cardinality {
            Cardinality::One => check_option(constraints, value),
            Cardinality::Many(_) => expect_rows(constraints, value)?
                .iter()
                .try_for_each(|o| check_option(constraints, o)),
        },
        Field::Radio(_) => check_option(constraints, value),
        Field::Relationship(f) => match f.cardinality.0 {
            Cardinality::One => check_relation(&f.relation_to, value),
            Cardinality::Many(_) => expect_rows(constraints, value)?
                .iter()
                .try_for_each(|v| check_relation(&f.relation_to, v)),
        },
        Field::Upload(_) => match value {
            Value::String(_) | Value::Number(_) | Value::Object(_) => Ok(()),
            _ => Err(format!("{value} is not a valid id.")),
        },
        Field::Point(_) => check_point(value),
        Field::Array(_) => expect_rows(constraints, value).map(|_| ()),
        Field::Blocks(f) => {
            for row in expect_rows(constraints, value)? {
                let block_type = row.get(BLOCK_TYPE_KEY).and_then(Value::as_str);
                match block_type {
                    Some(slug) if f.block(slug).is_some() => {}
                    Some(slug) => return Err(format!("{slug} is not a valid block.")),
                    None => return Err("Every row must name its block.".into()),
                }
            }
            Ok(())
        }
        Field::Group(_) | Field::Tab(_) => match value {
            Value::Object(_) => Ok(()),
            _ => Err("This field must be an object.".into()),
        },
        Field::Json(_)
        | Field::RichText(_)
        | Field::Row(_)
        | Field::Collapsible(_)
        | Field::Tabs(_)
        | Field::Ui(_) => Ok(()),
    }
}

/// One failed field of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Per-document inputs for [`ValidationEngine::validate_document`].
#[derive(Debug, Clone, Default)]
pub struct ValidationScope {
    pub id: Option<DocumentId>,
    pub user: Option<UserRecord>,
    pub operation: Option<Operation>,
}

/// Runs custom validators, falling back to the default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Validate one value against one field.
    pub async fn validate_field(
        &self,
        field: &Field,
        value: Option<&Value>,
        options: ValidateOptions,
    ) -> ValidationResult {
        match field.base().and_then(|b| b.validate.as_ref()) {
            Some(validate) => validate.call(value.cloned(), options).await,
            None => validate_default(field, value),
        }
    }

    /// Validate every data-bearing field of a document, in tree order.
    ///
    /// Nested fields are validated against the data at their own level, so
    /// a required field inside a missing group is reported.
    pub async fn validate_document(
        &self,
        fields: &[Field],
        doc: &Document,
        scope: &ValidationScope,
    ) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for entry in document_entries(fields, doc) {
            let field = match entry.node {
                NodeRef::Field(field) => field,
                NodeRef::Tab(_) => continue,
            };
            let options = ValidateOptions {
                data: doc.clone(),
                sibling_data: entry.siblings.clone(),
                id: scope.id.clone(),
                user: scope.user.clone(),
                operation: scope.operation,
                path: entry.path.clone(),
                constraints: field.constraints(),
            };
            if let ValidationResult::Invalid(message) =
                self.validate_field(field, entry.value, options).await
            {
                errors.push(FieldError {
                    path: entry.path.to_string(),
                    message,
                });
            }
        }
        debug!(errors = errors.len(), "document validated");
        errors
    }
}
