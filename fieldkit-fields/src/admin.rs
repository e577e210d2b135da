//! Admin-facing display configuration.
//!
//! The renderer reads these; this crate only carries them. `LayoutAdmin` is
//! the description-free set shared by layout containers, `Admin` adds a
//! description, and the per-kind structs extend `Admin` with the handful of
//! knobs that kind's editor understands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::contract::Condition;
use crate::types::LocalizedText;

pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Where the field renders in the edit view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminPosition {
    Sidebar,
}

/// Display options for layout containers (`row`, `tabs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAdmin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AdminPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(skip)]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_bulk_edit: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

/// Display options shared by every value-bearing kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(flatten)]
    pub layout: LayoutAdmin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
}

impl Admin {
    pub fn condition(&self) -> Option<&Condition> {
        self.layout.condition.as_ref()
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.layout.condition = Some(condition);
        self
    }
}

/// `text` and `email`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_complete: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_complete: Option<String>,
    /// Increment used by the browser's stepper controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextareaAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<LocalizedText>,
    /// Date picker props, passed through to the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide_gutter: bool,
}

/// `array`, `blocks` and `collapsible`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapsibleAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "is_false")]
    pub init_collapsed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_clearable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_sortable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_sortable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_create: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioLayout {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<RadioLayout>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_options: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_options: Option<Map<String, Value>>,
}

/// Rich text editor options. Elements and leaves are referenced by name; the
/// editor resolves them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextAdmin {
    #[serde(flatten)]
    pub base: Admin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaves: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide_gutter: bool,
}

/// The reduced option set of presentational `ui` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAdmin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip)]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_bulk_edit: bool,
}
