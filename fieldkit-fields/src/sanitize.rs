//! Build-time checks on a field tree.
//!
//! The taxonomy cannot express that names are unique within a scope, so
//! this pass checks it before a schema is used. A scope is everything
//! reachable from an opaque node through transparent ones: a text field in
//! a row collides with a text field of the same name next to that row.
//! Each block of a blocks field is its own scope. Names must read back
//! unchanged from a printed path, so `*` and all-digit names are refused.

use std::collections::HashSet;

use crate::error::{FieldsError, Result};
use crate::path::{Boundary, FieldPath, NodeRef};
use crate::types::{Block, Field};

/// Check a top-level field list. Stops at the first problem found.
pub fn sanitize_fields(fields: &[Field]) -> Result<()> {
    check_scope(fields.iter().map(NodeRef::Field).collect(), &FieldPath::root())
}

fn scope_members<'a>(nodes: Vec<NodeRef<'a>>, out: &mut Vec<NodeRef<'a>>) {
    for node in nodes {
        if node.boundary() == Boundary::Transparent {
            scope_members(node.children(), out);
        } else {
            out.push(node);
        }
    }
}

fn check_scope(nodes: Vec<NodeRef<'_>>, scope: &FieldPath) -> Result<()> {
    let mut members = Vec::new();
    scope_members(nodes, &mut members);

    let mut seen = HashSet::new();
    for node in &members {
        let Some(name) = node.name() else {
            continue;
        };
        if !is_valid_name(name) {
            return Err(FieldsError::InvalidFieldName {
                path: scope.to_string(),
                name: name.to_string(),
            });
        }
        if node.affects_data() && !seen.insert(name) {
            return Err(FieldsError::DuplicateFieldName {
                path: scope.child(name).to_string(),
            });
        }
    }

    for node in members {
        let Some(name) = node.name() else {
            continue;
        };
        let path = scope.child(name);
        match node {
            NodeRef::Field(Field::Blocks(blocks)) => {
                check_block_slugs(&blocks.blocks, &path)?;
                for block in &blocks.blocks {
                    let nodes = block.fields.iter().map(NodeRef::Field).collect();
                    check_scope(nodes, &path.any_entry())?;
                }
            }
            NodeRef::Field(Field::Array(array)) => {
                let nodes = array.fields.iter().map(NodeRef::Field).collect();
                check_scope(nodes, &path.any_entry())?;
            }
            _ if matches!(node.boundary(), Boundary::Opaque { .. }) => {
                check_scope(node.children(), &path)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// A name must read back as a name segment of a [`FieldPath`]: non-empty,
/// no `.`, not `*` and not all digits.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('.')
        && name != "*"
        && !name.bytes().all(|b| b.is_ascii_digit())
}

fn check_block_slugs(blocks: &[Block], path: &FieldPath) -> Result<()> {
    let mut seen = HashSet::new();
    for block in blocks {
        if !seen.insert(block.slug.as_str()) {
            return Err(FieldsError::DuplicateBlockSlug {
                path: path.to_string(),
                slug: block.slug.clone(),
            });
        }
    }
    Ok(())
}
