//! Classification predicates over the taxonomy.
//!
//! Consumers walk schemas by asking what a field *does* (holds children,
//! repeats, stores data) rather than matching on its kind. Each predicate
//! that confirms a capability also has an `as_*` accessor returning the
//! narrowed shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::FieldAccessControl;
use crate::types::{
    ArrayField, BlocksField, Cardinality, Field, GroupField, NamedTab, RelationshipField,
    SelectField, Tab, UploadField,
};

/// The kind discriminant of a [`Field`], as it appears in the `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Number,
    Email,
    Textarea,
    Checkbox,
    Date,
    Blocks,
    Group,
    Radio,
    Relationship,
    Array,
    RichText,
    Select,
    Upload,
    Code,
    Json,
    Point,
    Row,
    Collapsible,
    Tabs,
    Ui,
    Tab,
}

impl FieldKind {
    pub const ALL: [FieldKind; 22] = [
        FieldKind::Text,
        FieldKind::Number,
        FieldKind::Email,
        FieldKind::Textarea,
        FieldKind::Checkbox,
        FieldKind::Date,
        FieldKind::Blocks,
        FieldKind::Group,
        FieldKind::Radio,
        FieldKind::Relationship,
        FieldKind::Array,
        FieldKind::RichText,
        FieldKind::Select,
        FieldKind::Upload,
        FieldKind::Code,
        FieldKind::Json,
        FieldKind::Point,
        FieldKind::Row,
        FieldKind::Collapsible,
        FieldKind::Tabs,
        FieldKind::Ui,
        FieldKind::Tab,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Email => "email",
            FieldKind::Textarea => "textarea",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Date => "date",
            FieldKind::Blocks => "blocks",
            FieldKind::Group => "group",
            FieldKind::Radio => "radio",
            FieldKind::Relationship => "relationship",
            FieldKind::Array => "array",
            FieldKind::RichText => "richText",
            FieldKind::Select => "select",
            FieldKind::Upload => "upload",
            FieldKind::Code => "code",
            FieldKind::Json => "json",
            FieldKind::Point => "point",
            FieldKind::Row => "row",
            FieldKind::Collapsible => "collapsible",
            FieldKind::Tabs => "tabs",
            FieldKind::Ui => "ui",
            FieldKind::Tab => "tab",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of a field that holds a flat list of children.
#[derive(Debug, Clone, Copy)]
pub enum WithSubFields<'a> {
    Group(&'a GroupField),
    Array(&'a ArrayField),
    Row(&'a [Field]),
    Collapsible(&'a [Field]),
}

impl<'a> WithSubFields<'a> {
    pub fn fields(&self) -> &'a [Field] {
        match *self {
            WithSubFields::Group(f) => &f.fields,
            WithSubFields::Array(f) => &f.fields,
            WithSubFields::Row(fields) | WithSubFields::Collapsible(fields) => fields,
        }
    }
}

/// Borrowed view of a field that may store many values.
#[derive(Debug, Clone, Copy)]
pub enum WithMany<'a> {
    Select(&'a SelectField),
    Relationship(&'a RelationshipField),
}

impl WithMany<'_> {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            WithMany::Select(f) => f.cardinality,
            WithMany::Relationship(f) => f.cardinality.0,
        }
    }

    pub fn has_many(&self) -> bool {
        self.cardinality().is_many()
    }
}

/// Borrowed view of a field that populates related documents.
#[derive(Debug, Clone, Copy)]
pub enum WithMaxDepth<'a> {
    Upload(&'a UploadField),
    Relationship(&'a RelationshipField),
}

impl WithMaxDepth<'_> {
    pub fn max_depth(&self) -> Option<u32> {
        match self {
            WithMaxDepth::Upload(f) => f.max_depth,
            WithMaxDepth::Relationship(f) => f.max_depth,
        }
    }
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Text(_) => FieldKind::Text,
            Field::Number(_) => FieldKind::Number,
            Field::Email(_) => FieldKind::Email,
            Field::Textarea(_) => FieldKind::Textarea,
            Field::Checkbox(_) => FieldKind::Checkbox,
            Field::Date(_) => FieldKind::Date,
            Field::Blocks(_) => FieldKind::Blocks,
            Field::Group(_) => FieldKind::Group,
            Field::Radio(_) => FieldKind::Radio,
            Field::Relationship(_) => FieldKind::Relationship,
            Field::Array(_) => FieldKind::Array,
            Field::RichText(_) => FieldKind::RichText,
            Field::Select(_) => FieldKind::Select,
            Field::Upload(_) => FieldKind::Upload,
            Field::Code(_) => FieldKind::Code,
            Field::Json(_) => FieldKind::Json,
            Field::Point(_) => FieldKind::Point,
            Field::Row(_) => FieldKind::Row,
            Field::Collapsible(_) => FieldKind::Collapsible,
            Field::Tabs(_) => FieldKind::Tabs,
            Field::Ui(_) => FieldKind::Ui,
            Field::Tab(_) => FieldKind::Tab,
        }
    }

    /// Group, array, row and collapsible hold a flat `fields` list.
    pub fn has_sub_fields(&self) -> bool {
        self.as_with_sub_fields().is_some()
    }

    pub fn as_with_sub_fields(&self) -> Option<WithSubFields<'_>> {
        match self {
            Field::Group(f) => Some(WithSubFields::Group(f)),
            Field::Array(f) => Some(WithSubFields::Array(f)),
            Field::Row(f) => Some(WithSubFields::Row(&f.fields)),
            Field::Collapsible(f) => Some(WithSubFields::Collapsible(&f.fields)),
            Field::Text(_)
            | Field::Number(_)
            | Field::Email(_)
            | Field::Textarea(_)
            | Field::Checkbox(_)
            | Field::Date(_)
            | Field::Blocks(_)
            | Field::Radio(_)
            | Field::Relationship(_)
            | Field::RichText(_)
            | Field::Select(_)
            | Field::Upload(_)
            | Field::Code(_)
            | Field::Json(_)
            | Field::Point(_)
            | Field::Tabs(_)
            | Field::Ui(_)
            | Field::Tab(_) => None,
        }
    }

    pub fn is_array_type(&self) -> bool {
        self.as_array().is_some()
    }

    pub fn as_array(&self) -> Option<&ArrayField> {
        match self {
            Field::Array(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_block_type(&self) -> bool {
        self.as_blocks().is_some()
    }

    pub fn as_blocks(&self) -> Option<&BlocksField> {
        match self {
            Field::Blocks(f) => Some(f),
            _ => None,
        }
    }

    /// Select and relationship may be declared `hasMany`.
    pub fn supports_many(&self) -> bool {
        self.as_with_many().is_some()
    }

    pub fn as_with_many(&self) -> Option<WithMany<'_>> {
        match self {
            Field::Select(f) => Some(WithMany::Select(f)),
            Field::Relationship(f) => Some(WithMany::Relationship(f)),
            _ => None,
        }
    }

    /// Upload and relationship may limit population depth.
    pub fn supports_max_depth(&self) -> bool {
        self.as_with_max_depth().is_some()
    }

    pub fn as_with_max_depth(&self) -> Option<WithMaxDepth<'_>> {
        match self {
            Field::Upload(f) => Some(WithMaxDepth::Upload(f)),
            Field::Relationship(f) => Some(WithMaxDepth::Relationship(f)),
            _ => None,
        }
    }

    /// True only when a depth limit is actually declared.
    pub fn has_max_depth(&self) -> bool {
        self.max_depth().is_some()
    }

    pub fn max_depth(&self) -> Option<u32> {
        self.as_with_max_depth().and_then(|f| f.max_depth())
    }

    /// Ui fields render but never store data.
    pub fn is_presentational_only(&self) -> bool {
        matches!(self, Field::Ui(_))
    }

    /// Whether this field contributes a named key to stored data.
    pub fn affects_data(&self) -> bool {
        match self {
            Field::Ui(_) => false,
            Field::Row(_) | Field::Collapsible(_) | Field::Tabs(_) => false,
            Field::Tab(tab) => tab.has_name(),
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
            | Field::Point(_) => true,
        }
    }

    /// Layout containers that never introduce a data boundary.
    pub fn is_layout_only(&self) -> bool {
        matches!(self, Field::Row(_) | Field::Collapsible(_) | Field::Tabs(_))
    }

    pub fn is_localized(&self) -> bool {
        match self {
            Field::Tab(tab) => tab.is_localized(),
            _ => self.base().is_some_and(|b| b.localized),
        }
    }

    pub fn access(&self) -> Option<&FieldAccessControl> {
        match self {
            Field::Tab(Tab::Named(tab)) => Some(&tab.access),
            _ => self.base().map(|b| &b.access),
        }
    }
}

impl Tab {
    pub fn has_name(&self) -> bool {
        matches!(self, Tab::Named(_))
    }

    pub fn as_named(&self) -> Option<&NamedTab> {
        match self {
            Tab::Named(tab) => Some(tab),
            Tab::Unnamed(_) => None,
        }
    }

    pub fn is_localized(&self) -> bool {
        self.as_named().is_some_and(|t| t.localized)
    }
}
