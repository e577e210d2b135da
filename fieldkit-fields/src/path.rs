//! Tree walking and path resolution.
//!
//! A schema is a tree, but stored data is addressed by dotted paths that
//! skip some of its levels. Each node is one of:
//!
//! - *transparent*: row, collapsible, tabs and unnamed tabs lay out their
//!   children without adding a path segment;
//! - *opaque*: group and named tabs nest their children under their own
//!   name, array and blocks additionally add one entry index per row;
//! - *leaf*: everything else.
//!
//! Schema paths use `*` for "any row"; paths into a concrete document use
//! the row index.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::contract::Document;
use crate::types::{Field, Tab};

static EMPTY_DOCUMENT: Lazy<Document> = Lazy::new(Document::new);

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Name(String),
    Index(usize),
    /// Any row of a repeatable container.
    AnyIndex,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::AnyIndex => f.write_str("*"),
        }
    }
}

/// A dotted path into stored data, e.g. `blocks.2.heading`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        self.push(PathSegment::Name(name.into()))
    }

    pub fn entry(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    pub fn any_entry(&self) -> Self {
        self.push(PathSegment::AnyIndex)
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final name segment, if the path ends in one.
    pub fn leaf_name(&self) -> Option<&str> {
        match self.0.last()? {
            PathSegment::Name(name) => Some(name),
            PathSegment::Index(_) | PathSegment::AnyIndex => None,
        }
    }

    /// Replace every concrete row index with `*`.
    pub fn to_schema_path(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|s| match s {
                    PathSegment::Index(_) => PathSegment::AnyIndex,
                    other => other.clone(),
                })
                .collect(),
        )
    }

    /// Follow the path through a document. `*` segments never match.
    pub fn lookup<'a>(&self, doc: &'a Document) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let PathSegment::Name(name) = first else {
            return None;
        };
        let mut current = doc.get(name)?;
        for segment in rest {
            current = match segment {
                PathSegment::Name(name) => current.as_object()?.get(name)?,
                PathSegment::Index(i) => current.as_array()?.get(*i)?,
                PathSegment::AnyIndex => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self(
            s.split('.')
                .map(|part| match part {
                    "*" => PathSegment::AnyIndex,
                    _ => part
                        .parse::<usize>()
                        .map(PathSegment::Index)
                        .unwrap_or_else(|_| PathSegment::Name(part.to_string())),
                })
                .collect(),
        ))
    }
}

/// How a node relates its children to stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Children share the enclosing scope.
    Transparent,
    /// Children nest under this node's name, once per row when repeatable.
    Opaque { repeatable: bool },
    Leaf,
}

/// A schema node: a field, or a tab inside a `tabs` field.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Field(&'a Field),
    Tab(&'a Tab),
}

impl<'a> NodeRef<'a> {
    pub fn name(&self) -> Option<&'a str> {
        match *self {
            NodeRef::Field(f) => f.name(),
            NodeRef::Tab(t) => t.name(),
        }
    }

    pub fn as_field(&self) -> Option<&'a Field> {
        match *self {
            NodeRef::Field(f) => Some(f),
            NodeRef::Tab(_) => None,
        }
    }

    pub fn affects_data(&self) -> bool {
        match self {
            NodeRef::Field(f) => f.affects_data(),
            NodeRef::Tab(t) => t.has_name(),
        }
    }

    pub fn boundary(&self) -> Boundary {
        match *self {
            NodeRef::Tab(tab) | NodeRef::Field(Field::Tab(tab)) => tab_boundary(tab),
            NodeRef::Field(field) => field_boundary(field),
        }
    }

    /// Direct children, in declaration order. A blocks field yields the
    /// fields of every block in turn.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        let fields: &'a [Field] = match *self {
            NodeRef::Tab(tab) | NodeRef::Field(Field::Tab(tab)) => tab.fields(),
            NodeRef::Field(Field::Tabs(tabs)) => {
                return tabs.tabs.iter().map(NodeRef::Tab).collect();
            }
            NodeRef::Field(Field::Blocks(blocks)) => {
                return blocks
                    .blocks
                    .iter()
                    .flat_map(|b| b.fields.iter().map(NodeRef::Field))
                    .collect();
            }
            NodeRef::Field(field) => match field.as_with_sub_fields() {
                Some(holder) => holder.fields(),
                None => &[],
            },
        };
        fields.iter().map(NodeRef::Field).collect()
    }
}

fn tab_boundary(tab: &Tab) -> Boundary {
    match tab {
        Tab::Named(_) => Boundary::Opaque { repeatable: false },
        Tab::Unnamed(_) => Boundary::Transparent,
    }
}

fn field_boundary(field: &Field) -> Boundary {
    match field {
        Field::Row(_) | Field::Collapsible(_) | Field::Tabs(_) => Boundary::Transparent,
        Field::Group(_) => Boundary::Opaque { repeatable: false },
        Field::Array(_) | Field::Blocks(_) => Boundary::Opaque { repeatable: true },
        Field::Tab(tab) => tab_boundary(tab),
        Field::Text(_)
        | Field::Number(_)
        | Field::Email(_)
        | Field::Textarea(_)
        | Field::Checkbox(_)
        | Field::Date(_)
        | Field::Radio(_)
        | Field::Relationship(_)
        | Field::RichText(_)
        | Field::Select(_)
        | Field::Upload(_)
        | Field::Code(_)
        | Field::Json(_)
        | Field::Point(_)
        | Field::Ui(_) => Boundary::Leaf,
    }
}

/// A node visited by [`walk_schema`].
#[derive(Debug, Clone)]
pub struct SchemaEntry<'a> {
    pub node: NodeRef<'a>,
    /// Data path of the scope the node sits in.
    pub scope: FieldPath,
    /// The node's own path, for named nodes.
    pub path: Option<FieldPath>,
    pub depth: usize,
}

/// Visit every node in preorder, including transparent containers.
pub fn walk_schema(fields: &[Field]) -> Vec<SchemaEntry<'_>> {
    let mut out = Vec::new();
    for field in fields {
        walk_node(NodeRef::Field(field), &FieldPath::root(), 0, &mut out);
    }
    out
}

fn walk_node<'a>(
    node: NodeRef<'a>,
    scope: &FieldPath,
    depth: usize,
    out: &mut Vec<SchemaEntry<'a>>,
) {
    let path = node.name().map(|name| scope.child(name));
    let inner = match node.boundary() {
        Boundary::Leaf => None,
        Boundary::Transparent => Some(scope.clone()),
        Boundary::Opaque { repeatable } => {
            let own = path.clone().unwrap_or_else(|| scope.clone());
            Some(if repeatable { own.any_entry() } else { own })
        }
    };
    out.push(SchemaEntry {
        node,
        scope: scope.clone(),
        path,
        depth,
    });
    if let Some(inner) = inner {
        for child in node.children() {
            walk_node(child, &inner, depth + 1, out);
        }
    }
}

/// Paths of every node that stores data, in preorder.
pub fn data_paths(fields: &[Field]) -> Vec<FieldPath> {
    walk_schema(fields)
        .into_iter()
        .filter(|e| e.node.affects_data())
        .filter_map(|e| e.path)
        .collect()
}

/// Find the named node a path addresses. Row indices match any row.
pub fn resolve<'a>(fields: &'a [Field], path: &FieldPath) -> Option<NodeRef<'a>> {
    let target = path.to_schema_path();
    walk_schema(fields)
        .into_iter()
        .find(|e| e.path.as_ref() == Some(&target))
        .map(|e| e.node)
}

/// A stored value reached by [`document_entries`].
#[derive(Debug, Clone)]
pub struct DataEntry<'a> {
    pub node: NodeRef<'a>,
    /// Concrete path, with row indices.
    pub path: FieldPath,
    pub value: Option<&'a Value>,
    /// The data at the node's own level.
    pub siblings: &'a Document,
}

/// Pair every data-bearing node with its value in `doc`.
///
/// Missing groups and named tabs are descended into with empty data, so
/// their children are still visited. Array rows are visited once each;
/// blocks rows use the block named by their `blockType`, and rows naming
/// an unknown block are skipped.
pub fn document_entries<'a>(fields: &'a [Field], doc: &'a Document) -> Vec<DataEntry<'a>> {
    let mut out = Vec::new();
    for field in fields {
        visit_data(NodeRef::Field(field), &FieldPath::root(), doc, &mut out);
    }
    out
}

fn visit_data<'a>(
    node: NodeRef<'a>,
    scope: &FieldPath,
    siblings: &'a Document,
    out: &mut Vec<DataEntry<'a>>,
) {
    if node.boundary() == Boundary::Transparent {
        for child in node.children() {
            visit_data(child, scope, siblings, out);
        }
        return;
    }
    if !node.affects_data() {
        return;
    }
    let Some(name) = node.name() else {
        return;
    };
    let path = scope.child(name);
    let value = siblings.get(name);
    out.push(DataEntry {
        node,
        path: path.clone(),
        value,
        siblings,
    });

    match node {
        NodeRef::Field(Field::Array(array)) => {
            for (i, row) in rows(value) {
                let row_path = path.entry(i);
                for child in &array.fields {
                    visit_data(NodeRef::Field(child), &row_path, row, out);
                }
            }
        }
        NodeRef::Field(Field::Blocks(blocks)) => {
            for (i, row) in rows(value) {
                let Some(block) = blocks.block_for_row(row) else {
                    continue;
                };
                let row_path = path.entry(i);
                for child in &block.fields {
                    visit_data(NodeRef::Field(child), &row_path, row, out);
                }
            }
        }
        _ if node.boundary() == (Boundary::Opaque { repeatable: false }) => {
            let nested = value
                .and_then(Value::as_object)
                .unwrap_or(&*EMPTY_DOCUMENT);
            for child in node.children() {
                visit_data(child, &path, nested, out);
            }
        }
        _ => {}
    }
}

fn rows(value: Option<&Value>) -> impl Iterator<Item = (usize, &Document)> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
        .filter_map(|(i, row)| row.as_object().map(|obj| (i, obj)))
}
