//! The field taxonomy.
//!
//! A [`Field`] is exactly one of a closed set of kinds, tagged on the wire by
//! `type`. Kinds that store a value share [`FieldBase`]; layout containers
//! (`row`, `collapsible`, `tabs`) and the presentational `ui` kind carry only
//! what they use. Every shape serializes to/from YAML and JSON via serde.
//! Function slots (hooks, validators, access predicates, conditions) never
//! hit the wire and are attached in code.
//!
//! Shapes whose attributes depend on a toggle are modeled as separate
//! variants so the invalid combinations cannot be constructed:
//!
//! - [`Cardinality`]: `hasMany` gates the row-count bounds.
//! - [`Tab`]: a named tab may be localized and carry an interface name, an
//!   unnamed tab may not.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::access::FieldAccessControl;
use crate::admin::{
    is_default, is_false, Admin, CodeAdmin, CollapsibleAdmin, DateAdmin, GroupAdmin, JsonAdmin,
    LayoutAdmin, NumberAdmin, RadioAdmin, RelationshipAdmin, RichTextAdmin, SelectAdmin,
    TextAdmin, TextareaAdmin, UiAdmin,
};
use crate::contract::{Condition, Document, DocumentId, FilterOptions, UserRecord};
use crate::hooks::FieldHooks;
use crate::validation::Validate;

/// Text that is either a single string or keyed by locale.
///
/// Locale keys are opaque here; resolution belongs to the localization layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    ByLocale(BTreeMap<String, String>),
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        LocalizedText::Plain(s.to_string())
    }
}

impl From<String> for LocalizedText {
    fn from(s: String) -> Self {
        LocalizedText::Plain(s)
    }
}

/// A field label. `false` on the wire suppresses the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLabel", into = "RawLabel")]
pub enum Label {
    Text(LocalizedText),
    Suppressed,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Flag(bool),
    Text(LocalizedText),
}

impl TryFrom<RawLabel> for Label {
    type Error = String;

    fn try_from(raw: RawLabel) -> Result<Self, Self::Error> {
        match raw {
            RawLabel::Flag(false) => Ok(Label::Suppressed),
            RawLabel::Flag(true) => Err("a label may be text or `false`, not `true`".into()),
            RawLabel::Text(text) => Ok(Label::Text(text)),
        }
    }
}

impl From<Label> for RawLabel {
    fn from(label: Label) -> Self {
        match label {
            Label::Text(text) => RawLabel::Text(text),
            Label::Suppressed => RawLabel::Flag(false),
        }
    }
}

/// Singular and plural display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    pub singular: LocalizedText,
    pub plural: LocalizedText,
}

/// One choice of a `select` or `radio` field: a bare value, or a labelled one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectOption {
    Value(String),
    Object(OptionObject),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionObject {
    pub label: LocalizedText,
    pub value: String,
}

impl SelectOption {
    /// The stored value, whichever shape the option takes.
    pub fn value(&self) -> &str {
        match self {
            SelectOption::Value(v) => v,
            SelectOption::Object(o) => &o.value,
        }
    }

    pub fn as_object(&self) -> Option<&OptionObject> {
        match self {
            SelectOption::Object(o) => Some(o),
            SelectOption::Value(_) => None,
        }
    }
}

impl From<&str> for SelectOption {
    fn from(s: &str) -> Self {
        SelectOption::Value(s.to_string())
    }
}

pub fn option_is_object(option: &SelectOption) -> bool {
    option.as_object().is_some()
}

pub fn option_is_value(option: &SelectOption) -> bool {
    matches!(option, SelectOption::Value(_))
}

/// Options are treated as labelled objects when the first one is.
pub fn options_are_objects(options: &[SelectOption]) -> bool {
    options.first().is_some_and(option_is_object)
}

/// Bounds on the number of entries of a multi-valued field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRowBounds")]
pub struct RowBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u32>,
}

impl RowBounds {
    pub fn new(min_rows: Option<u32>, max_rows: Option<u32>) -> Self {
        Self { min_rows, max_rows }
    }

    fn check(self) -> Result<Self, String> {
        match (self.min_rows, self.max_rows) {
            (Some(min), Some(max)) if min > max => {
                Err(format!("`minRows` ({min}) exceeds `maxRows` ({max})"))
            }
            _ => Ok(self),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRowBounds {
    #[serde(default)]
    min_rows: Option<u32>,
    #[serde(default)]
    max_rows: Option<u32>,
}

impl TryFrom<RawRowBounds> for RowBounds {
    type Error = String;

    fn try_from(raw: RawRowBounds) -> Result<Self, Self::Error> {
        RowBounds::new(raw.min_rows, raw.max_rows).check()
    }
}

/// Whether a field stores one value or an ordered list of them.
///
/// Row-count bounds exist only on the `Many` side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCardinality", into = "RawCardinality")]
pub enum Cardinality {
    #[default]
    One,
    Many(RowBounds),
}

impl Cardinality {
    pub fn is_many(&self) -> bool {
        matches!(self, Cardinality::Many(_))
    }

    pub fn row_bounds(&self) -> Option<RowBounds> {
        match self {
            Cardinality::One => None,
            Cardinality::Many(bounds) => Some(*bounds),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCardinality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    has_many: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_rows: Option<u32>,
}

impl TryFrom<RawCardinality> for Cardinality {
    type Error = String;

    fn try_from(raw: RawCardinality) -> Result<Self, Self::Error> {
        if raw.has_many == Some(true) {
            return RowBounds::new(raw.min_rows, raw.max_rows)
                .check()
                .map(Cardinality::Many);
        }
        if raw.min_rows.is_some() || raw.max_rows.is_some() {
            return Err("`minRows` and `maxRows` require `hasMany: true`".into());
        }
        Ok(Cardinality::One)
    }
}

impl From<Cardinality> for RawCardinality {
    fn from(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::One => RawCardinality::default(),
            Cardinality::Many(bounds) => RawCardinality {
                has_many: Some(true),
                min_rows: bounds.min_rows,
                max_rows: bounds.max_rows,
            },
        }
    }
}

/// Relationship cardinality.
///
/// The legacy `min`/`max` spellings of the row bounds are refused outright,
/// with or without `hasMany`, instead of being silently ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRelationshipCardinality", into = "RawCardinality")]
pub struct RelationshipCardinality(pub Cardinality);

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelationshipCardinality {
    #[serde(default)]
    has_many: Option<bool>,
    #[serde(default)]
    min_rows: Option<u32>,
    #[serde(default)]
    max_rows: Option<u32>,
    #[serde(default)]
    min: Option<Value>,
    #[serde(default)]
    max: Option<Value>,
}

impl TryFrom<RawRelationshipCardinality> for RelationshipCardinality {
    type Error = String;

    fn try_from(raw: RawRelationshipCardinality) -> Result<Self, Self::Error> {
        if raw.min.is_some() || raw.max.is_some() {
            return Err(
                "relationship bounds are `minRows`/`maxRows` with `hasMany: true`; `min`/`max` are not accepted"
                    .into(),
            );
        }
        Cardinality::try_from(RawCardinality {
            has_many: raw.has_many,
            min_rows: raw.min_rows,
            max_rows: raw.max_rows,
        })
        .map(RelationshipCardinality)
    }
}

impl From<RelationshipCardinality> for RawCardinality {
    fn from(cardinality: RelationshipCardinality) -> Self {
        cardinality.0.into()
    }
}

/// The collection(s) a relationship may point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationTo {
    One(String),
    Many(Vec<String>),
}

impl RelationTo {
    /// True when stored values must record which collection they point at.
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, RelationTo::Many(_))
    }

    pub fn slugs(&self) -> Vec<&str> {
        match self {
            RelationTo::One(slug) => vec![slug.as_str()],
            RelationTo::Many(slugs) => slugs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for RelationTo {
    fn from(s: &str) -> Self {
        RelationTo::One(s.to_string())
    }
}

/// A polymorphic relationship value: the target collection plus the id.
///
/// Only the `{ relationTo, value }` object form is accepted; a bare list is
/// a list of ids, never a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Map<String, Value>")]
pub struct ValueWithRelation {
    pub relation_to: String,
    pub value: DocumentId,
}

impl TryFrom<Map<String, Value>> for ValueWithRelation {
    type Error = String;

    fn try_from(mut obj: Map<String, Value>) -> Result<Self, Self::Error> {
        let relation_to = match obj.remove("relationTo") {
            Some(Value::String(slug)) => slug,
            Some(other) => return Err(format!("`relationTo` must be a slug, got {other}")),
            None => return Err("missing `relationTo`".into()),
        };
        let value = obj.remove("value").ok_or("missing `value`")?;
        let value = serde_json::from_value(value).map_err(|e| e.to_string())?;
        Ok(Self { relation_to, value })
    }
}

impl ValueWithRelation {
    /// Recognize a stored `{ relationTo, value }` pair.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Self::try_from(obj.clone()).ok()
    }
}

/// Every shape a stored relationship value can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipValue {
    Id(DocumentId),
    Ids(Vec<DocumentId>),
    Related(ValueWithRelation),
    RelatedMany(Vec<ValueWithRelation>),
}

/// Attributes shared by every value-bearing kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub index: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, rename = "saveToJWT", skip_serializing_if = "is_false")]
    pub save_to_jwt: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub localized: bool,
    #[serde(skip)]
    pub validate: Option<Validate>,
    #[serde(skip)]
    pub hooks: FieldHooks,
    #[serde(skip)]
    pub access: FieldAccessControl,
    /// Extension bag; never read by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

impl FieldBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: TextAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: TextAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextareaField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: TextareaAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: CodeAdmin,
}

/// A number, or with `hasMany` an ordered list of numbers.
///
/// `min`/`max` bound each value; `minRows`/`maxRows` bound the list length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(flatten)]
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: NumberAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: Admin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: DateAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: JsonAdmin,
}

/// A `[longitude, latitude]` pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: Admin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: RichTextAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub options: Vec<SelectOption>,
    #[serde(flatten)]
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: SelectAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: RadioAdmin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub relation_to: RelationTo,
    /// Limit on how deep related documents are populated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_options: Option<FilterOptions>,
    #[serde(flatten)]
    pub cardinality: RelationshipCardinality,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: RelationshipAdmin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub relation_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_options: Option<FilterOptions>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: Admin,
}

/// Nests its children under its own name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub fields: Vec<Field>,
    /// Name of the generated schema type shared across collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: GroupAdmin,
}

/// A repeatable list of rows sharing one shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(flatten)]
    pub rows: RowBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: CollapsibleAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockGraphQl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular_name: Option<String>,
}

/// A named row template for a `blocks` field, referenced by `slug`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    pub fields: Vec<Field>,
    #[serde(default, rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt_text: Option<String>,
    /// Superseded by `interface_name`.
    #[serde(default, rename = "graphQL", skip_serializing_if = "Option::is_none")]
    pub graph_ql: Option<BlockGraphQl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
}

impl Block {
    pub fn new(slug: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            slug: slug.into(),
            fields,
            ..Default::default()
        }
    }
}

/// Stored rows name their template in this key.
pub const BLOCK_TYPE_KEY: &str = "blockType";

/// A repeatable list of rows, each shaped by one of several blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(flatten)]
    pub rows: RowBounds,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: CollapsibleAdmin,
}

impl BlocksField {
    pub fn block(&self, slug: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.slug == slug)
    }

    /// The block a stored row was written with.
    pub fn block_for_row(&self, row: &Map<String, Value>) -> Option<&Block> {
        row.get(BLOCK_TYPE_KEY)
            .and_then(Value::as_str)
            .and_then(|slug| self.block(slug))
    }
}

/// Lays its children out side by side. Contributes nothing to storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowField {
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: LayoutAdmin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

/// A titled, foldable box around its children. Contributes nothing to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapsibleField {
    pub label: LocalizedText,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: CollapsibleAdmin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsField {
    pub tabs: Vec<Tab>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: LayoutAdmin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

/// A tab with a name nests its children under that name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedTab {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub localized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: Admin,
    #[serde(skip)]
    pub hooks: FieldHooks,
    #[serde(skip)]
    pub access: FieldAccessControl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

/// A tab without a name is purely visual; its children live in the
/// enclosing scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnnamedTab {
    pub label: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

/// One tab of a `tabs` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTab")]
pub enum Tab {
    Named(NamedTab),
    Unnamed(UnnamedTab),
}

impl Tab {
    pub fn named(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Tab::Named(NamedTab {
            name: name.into(),
            fields,
            ..Default::default()
        })
    }

    pub fn unnamed(label: impl Into<LocalizedText>, fields: Vec<Field>) -> Self {
        Tab::Unnamed(UnnamedTab {
            label: label.into(),
            description: None,
            fields,
            admin: Admin::default(),
            custom: None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Tab::Named(tab) => Some(&tab.name),
            Tab::Unnamed(_) => None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            Tab::Named(tab) => &tab.fields,
            Tab::Unnamed(tab) => &tab.fields,
        }
    }

    pub fn admin(&self) -> &Admin {
        match self {
            Tab::Named(tab) => &tab.admin,
            Tab::Unnamed(tab) => &tab.admin,
        }
    }

    fn admin_mut(&mut self) -> &mut Admin {
        match self {
            Tab::Named(tab) => &mut tab.admin,
            Tab::Unnamed(tab) => &mut tab.admin,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.admin().condition()
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.admin_mut().layout.condition = Some(condition);
        self
    }

    /// Whether the tab should be shown. Tabs without a condition are.
    pub fn is_visible(
        &self,
        data: &Document,
        sibling_data: &Document,
        user: Option<&UserRecord>,
    ) -> bool {
        self.condition()
            .is_none_or(|c| c.evaluate(data, sibling_data, user))
    }
}

impl Serialize for Tab {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tab::Named(tab) => tab.serialize(serializer),
            Tab::Unnamed(tab) => tab.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTab {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    label: Option<Label>,
    #[serde(default)]
    localized: Option<bool>,
    #[serde(default)]
    interface_name: Option<String>,
    #[serde(default)]
    description: Option<LocalizedText>,
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    admin: Admin,
    #[serde(default)]
    custom: Option<Map<String, Value>>,
}

impl TryFrom<RawTab> for Tab {
    type Error = String;

    fn try_from(raw: RawTab) -> Result<Self, Self::Error> {
        if let Some(name) = raw.name {
            return Ok(Tab::Named(NamedTab {
                name,
                label: raw.label,
                localized: raw.localized.unwrap_or(false),
                interface_name: raw.interface_name,
                description: raw.description,
                fields: raw.fields,
                admin: raw.admin,
                hooks: FieldHooks::default(),
                access: FieldAccessControl::default(),
                custom: raw.custom,
            }));
        }
        if raw.localized.is_some() {
            return Err("an unnamed tab cannot declare `localized`".into());
        }
        if raw.interface_name.is_some() {
            return Err("an unnamed tab cannot declare `interfaceName`".into());
        }
        let label = match raw.label {
            Some(Label::Text(label)) => label,
            Some(Label::Suppressed) | None => {
                return Err("an unnamed tab requires a text `label`".into())
            }
        };
        Ok(Tab::Unnamed(UnnamedTab {
            label,
            description: raw.description,
            fields: raw.fields,
            admin: raw.admin,
            custom: raw.custom,
        }))
    }
}

/// Presentational-only field: rendered, never stored. The name addresses it
/// in rendering and conditional logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub admin: UiAdmin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

/// One schema entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Field {
    Text(TextField),
    Number(NumberField),
    Email(EmailField),
    Textarea(TextareaField),
    Checkbox(CheckboxField),
    Date(DateField),
    Blocks(BlocksField),
    Group(GroupField),
    Radio(RadioField),
    Relationship(RelationshipField),
    Array(ArrayField),
    RichText(RichTextField),
    Select(SelectField),
    Upload(UploadField),
    Code(CodeField),
    Json(JsonField),
    Point(PointField),
    Row(RowField),
    Collapsible(CollapsibleField),
    Tabs(TabsField),
    Ui(UiField),
    /// A single tab addressed as a field of its own.
    Tab(Tab),
}

impl Field {
    pub fn text(name: impl Into<String>) -> Self {
        Field::Text(TextField {
            base: FieldBase::new(name),
            ..Default::default()
        })
    }

    pub fn email(name: impl Into<String>) -> Self {
        Field::Email(EmailField {
            base: FieldBase::new(name),
            ..Default::default()
        })
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Field::Textarea(TextareaField {
            base: FieldBase::new(name),
            ..Default::default()
        })
    }

    pub fn number(name: impl Into<String>) -> Self {
        Field::Number(NumberField {
            base: FieldBase::new(name),
            ..Default::default()
        })
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Field::Checkbox(CheckboxField {
            base: FieldBase::new(name),
            ..Default::default()
        })
    }

    pub fn date(name: impl Into<String>) -> Self {
        Field::Date(DateField {
            base: FieldBase::new(name),
            ..Default::default()
        })
    }

    pub fn point(name: impl Into<String>) -> Self {
        Field::Point(PointField {
            base: FieldBase::new(name),
            ..Default::default()
        })
    }

    pub fn select(name: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Field::Select(SelectField {
            base: FieldBase::new(name),
            options,
            ..Default::default()
        })
    }

    pub fn radio(name: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Field::Radio(RadioField {
            base: FieldBase::new(name),
            options,
            ..Default::default()
        })
    }

    pub fn relationship(name: impl Into<String>, relation_to: impl Into<RelationTo>) -> Self {
        Field::Relationship(RelationshipField {
            base: FieldBase::new(name),
            relation_to: relation_to.into(),
            max_depth: None,
            filter_options: None,
            cardinality: RelationshipCardinality::default(),
            admin: RelationshipAdmin::default(),
        })
    }

    pub fn upload(name: impl Into<String>, relation_to: impl Into<String>) -> Self {
        Field::Upload(UploadField {
            base: FieldBase::new(name),
            relation_to: relation_to.into(),
            max_depth: None,
            filter_options: None,
            admin: Admin::default(),
        })
    }

    pub fn group(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Field::Group(GroupField {
            base: FieldBase::new(name),
            fields,
            ..Default::default()
        })
    }

    pub fn array(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Field::Array(ArrayField {
            base: FieldBase::new(name),
            fields,
            ..Default::default()
        })
    }

    pub fn blocks(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Field::Blocks(BlocksField {
            base: FieldBase::new(name),
            blocks,
            ..Default::default()
        })
    }

    pub fn row(fields: Vec<Field>) -> Self {
        Field::Row(RowField {
            fields,
            ..Default::default()
        })
    }

    pub fn collapsible(label: impl Into<LocalizedText>, fields: Vec<Field>) -> Self {
        Field::Collapsible(CollapsibleField {
            label: label.into(),
            fields,
            admin: CollapsibleAdmin::default(),
            custom: None,
        })
    }

    pub fn tabs(tabs: Vec<Tab>) -> Self {
        Field::Tabs(TabsField {
            tabs,
            ..Default::default()
        })
    }

    pub fn ui(name: impl Into<String>) -> Self {
        Field::Ui(UiField {
            name: name.into(),
            ..Default::default()
        })
    }

    /// Adjust the shared base, for kinds that have one. Other kinds are
    /// returned unchanged.
    pub fn with_base(mut self, f: impl FnOnce(&mut FieldBase)) -> Self {
        if let Some(base) = self.base_mut() {
            f(base);
        }
        self
    }

    pub fn base(&self) -> Option<&FieldBase> {
        match self {
            Field::Text(f) => Some(&f.base),
            Field::Number(f) => Some(&f.base),
            Field::Email(f) => Some(&f.base),
            Field::Textarea(f) => Some(&f.base),
            Field::Checkbox(f) => Some(&f.base),
            Field::Date(f) => Some(&f.base),
            Field::Blocks(f) => Some(&f.base),
            Field::Group(f) => Some(&f.base),
            Field::Radio(f) => Some(&f.base),
            Field::Relationship(f) => Some(&f.base),
            Field::Array(f) => Some(&f.base),
            Field::RichText(f) => Some(&f.base),
            Field::Select(f) => Some(&f.base),
            Field::Upload(f) => Some(&f.base),
            Field::Code(f) => Some(&f.base),
            Field::Json(f) => Some(&f.base),
            Field::Point(f) => Some(&f.base),
            Field::Row(_) | Field::Collapsible(_) | Field::Tabs(_) | Field::Ui(_) | Field::Tab(_) => {
                None
            }
        }
    }

    pub fn base_mut(&mut self) -> Option<&mut FieldBase> {
        match self {
            Field::Text(f) => Some(&mut f.base),
            Field::Number(f) => Some(&mut f.base),
            Field::Email(f) => Some(&mut f.base),
            Field::Textarea(f) => Some(&mut f.base),
            Field::Checkbox(f) => Some(&mut f.base),
            Field::Date(f) => Some(&mut f.base),
            Field::Blocks(f) => Some(&mut f.base),
            Field::Group(f) => Some(&mut f.base),
            Field::Radio(f) => Some(&mut f.base),
            Field::Relationship(f) => Some(&mut f.base),
            Field::Array(f) => Some(&mut f.base),
            Field::RichText(f) => Some(&mut f.base),
            Field::Select(f) => Some(&mut f.base),
            Field::Upload(f) => Some(&mut f.base),
            Field::Code(f) => Some(&mut f.base),
            Field::Json(f) => Some(&mut f.base),
            Field::Point(f) => Some(&mut f.base),
            Field::Row(_) | Field::Collapsible(_) | Field::Tabs(_) | Field::Ui(_) | Field::Tab(_) => {
                None
            }
        }
    }

    /// The declared name, if this kind has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Field::Ui(f) => Some(&f.name),
            Field::Tab(tab) => tab.name(),
            Field::Row(_) | Field::Collapsible(_) | Field::Tabs(_) => None,
            Field::Text(_)
            | Field::Number(_)
            | Field::Email(_)
            | Field::Textarea(_)
            | Field::Checkbox(_)
            | Field::Date(_)
            | Field::Blocks(_)
            | Field::Group(_)
            | Field::Radio(_)
            | Field::Relationship(_)
            | Field::Array(_)
            | Field::RichText(_)
            | Field::Select(_)
            | Field::Upload(_)
            | Field::Code(_)
            | Field::Json(_)
            | Field::Point(_) => self.base().map(|b| b.name.as_str()),
        }
    }

    /// The rendering condition, if one is attached.
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Field::Text(f) => f.admin.base.condition(),
            Field::Number(f) => f.admin.base.condition(),
            Field::Email(f) => f.admin.base.condition(),
            Field::Textarea(f) => f.admin.base.condition(),
            Field::Checkbox(f) => f.admin.condition(),
            Field::Date(f) => f.admin.base.condition(),
            Field::Blocks(f) => f.admin.base.condition(),
            Field::Group(f) => f.admin.base.condition(),
            Field::Radio(f) => f.admin.base.condition(),
            Field::Relationship(f) => f.admin.base.condition(),
            Field::Array(f) => f.admin.base.condition(),
            Field::RichText(f) => f.admin.base.condition(),
            Field::Select(f) => f.admin.base.condition(),
            Field::Upload(f) => f.admin.condition(),
            Field::Code(f) => f.admin.base.condition(),
            Field::Json(f) => f.admin.base.condition(),
            Field::Point(f) => f.admin.condition(),
            Field::Collapsible(f) => f.admin.base.condition(),
            Field::Row(f) => f.admin.condition.as_ref(),
            Field::Tabs(f) => f.admin.condition.as_ref(),
            Field::Ui(f) => f.admin.condition.as_ref(),
            Field::Tab(tab) => tab.condition(),
        }
    }

    /// Attach a rendering condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        let slot = match &mut self {
            Field::Text(f) => &mut f.admin.base.layout.condition,
            Field::Number(f) => &mut f.admin.base.layout.condition,
            Field::Email(f) => &mut f.admin.base.layout.condition,
            Field::Textarea(f) => &mut f.admin.base.layout.condition,
            Field::Checkbox(f) => &mut f.admin.layout.condition,
            Field::Date(f) => &mut f.admin.base.layout.condition,
            Field::Blocks(f) => &mut f.admin.base.layout.condition,
            Field::Group(f) => &mut f.admin.base.layout.condition,
            Field::Radio(f) => &mut f.admin.base.layout.condition,
            Field::Relationship(f) => &mut f.admin.base.layout.condition,
            Field::Array(f) => &mut f.admin.base.layout.condition,
            Field::RichText(f) => &mut f.admin.base.layout.condition,
            Field::Select(f) => &mut f.admin.base.layout.condition,
            Field::Upload(f) => &mut f.admin.layout.condition,
            Field::Code(f) => &mut f.admin.base.layout.condition,
            Field::Json(f) => &mut f.admin.base.layout.condition,
            Field::Point(f) => &mut f.admin.layout.condition,
            Field::Collapsible(f) => &mut f.admin.base.layout.condition,
            Field::Row(f) => &mut f.admin.condition,
            Field::Tabs(f) => &mut f.admin.condition,
            Field::Ui(f) => &mut f.admin.condition,
            Field::Tab(tab) => &mut tab.admin_mut().layout.condition,
        };
        *slot = Some(condition);
        self
    }

    /// Whether the field should be shown. Fields without a condition are.
    pub fn is_visible(
        &self,
        data: &Document,
        sibling_data: &Document,
        user: Option<&UserRecord>,
    ) -> bool {
        self.condition()
            .is_none_or(|c| c.evaluate(data, sibling_data, user))
    }
}
