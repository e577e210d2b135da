//! SchemaRegistry: the loaded set of collection schemas.
//!
//! Collections come from two places: YAML files under `collections/` in the
//! registry root, and configs registered in code. Only in-code configs can
//! carry hooks, validators, access predicates and conditions, so an in-code
//! collection replaces a YAML collection with the same slug. Every
//! collection is sanitized before the registry is handed out; after that it
//! is read-only and can be shared across tasks.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{FieldsError, Result};
use crate::sanitize::sanitize_fields;
use crate::types::{Field, Labels};

/// One collection: a slug and its field tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    pub fields: Vec<Field>,
}

impl CollectionConfig {
    pub fn new(slug: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            slug: slug.into(),
            labels: None,
            fields,
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = Some(labels);
        self
    }
}

/// Builder for `SchemaRegistry`. Created by `SchemaRegistry::open()`.
pub struct SchemaRegistryBuilder {
    root: PathBuf,
    collections: Vec<CollectionConfig>,
}

impl SchemaRegistryBuilder {
    /// Register a collection defined in code.
    pub fn with_collection(mut self, config: CollectionConfig) -> Self {
        self.collections.push(config);
        self
    }

    /// Build the registry: load YAML, merge in-code collections, sanitize.
    pub async fn build(self) -> Result<SchemaRegistry> {
        let root = self.root;
        if !root.is_dir() {
            return Err(FieldsError::NotInitialized { path: root });
        }

        let mut collections = load_collections(&root.join("collections")).await?;
        let yaml_count = collections.len();

        let mut in_code = HashSet::new();
        for config in self.collections {
            if !in_code.insert(config.slug.clone()) {
                return Err(FieldsError::DuplicateCollection { slug: config.slug });
            }
            if collections.contains_key(&config.slug) {
                debug!(slug = %config.slug, "in-code collection replaces yaml definition");
            }
            collections.insert(config.slug.clone(), config);
        }

        for config in collections.values() {
            sanitize_fields(&config.fields)?;
        }

        debug!(
            collections = collections.len(),
            from_yaml = yaml_count,
            "schema registry opened"
        );

        Ok(SchemaRegistry { root, collections })
    }
}

/// Read every `.yaml` file in `dir` as a collection, in file name order.
///
/// Files that fail to parse are skipped. A missing directory is empty.
async fn load_collections(dir: &Path) -> Result<IndexMap<String, CollectionConfig>> {
    let mut collections = IndexMap::new();
    if !dir.is_dir() {
        return Ok(collections);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        let content = fs::read_to_string(&path).await?;
        match serde_yaml::from_str::<CollectionConfig>(&content) {
            Ok(config) => {
                if collections.contains_key(&config.slug) {
                    warn!(?path, slug = %config.slug, "collection slug defined twice; later file wins");
                }
                collections.insert(config.slug.clone(), config);
            }
            Err(e) => {
                warn!(?path, %e, "skipping invalid collection definition");
            }
        }
    }
    Ok(collections)
}

/// Collections by slug, in load order.
///
/// Owns a directory on disk with the structure:
/// ```text
/// schema/
///   collections/    ← one .yaml per collection
/// ```
#[derive(Debug)]
pub struct SchemaRegistry {
    root: PathBuf,
    collections: IndexMap<String, CollectionConfig>,
}

impl SchemaRegistry {
    /// Open a schema directory. Returns a builder for in-code collections.
    ///
    /// ```rust,ignore
    /// let registry = SchemaRegistry::open(path)
    ///     .with_collection(CollectionConfig::new("posts", fields))
    ///     .build()
    ///     .await?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> SchemaRegistryBuilder {
        SchemaRegistryBuilder {
            root: root.into(),
            collections: Vec::new(),
        }
    }

    pub fn get(&self, slug: &str) -> Option<&CollectionConfig> {
        self.collections.get(slug)
    }

    /// Like `get`, but a missing slug is an error.
    pub fn require(&self, slug: &str) -> Result<&CollectionConfig> {
        self.get(slug)
            .ok_or_else(|| FieldsError::CollectionNotFound {
                slug: slug.to_string(),
            })
    }

    pub fn collections(&self) -> impl Iterator<Item = &CollectionConfig> {
        self.collections.values()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// The root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{FieldHook, FieldHooks, HookStage};
    use tempfile::TempDir;

    const POSTS_YAML: &str = r#"
slug: posts
labels:
  singular: Post
  plural: Posts
fields:
  - type: text
    name: title
    required: true
  - type: tabs
    tabs:
      - label: Content
        fields:
          - type: richText
            name: body
      - name: meta
        fields:
          - type: text
            name: description
"#;

    async fn schema_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("collections"))
            .await
            .unwrap();
        temp
    }

    async fn write_collection(temp: &TempDir, file: &str, yaml: &str) {
        fs::write(temp.path().join("collections").join(file), yaml)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_empty_root() {
        let temp = TempDir::new().unwrap();
        let registry = SchemaRegistry::open(temp.path()).build().await.unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.root(), temp.path());
    }

    #[tokio::test]
    async fn test_missing_root_is_not_initialized() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = SchemaRegistry::open(&missing).build().await.unwrap_err();
        assert!(matches!(err, FieldsError::NotInitialized { path } if path == missing));
    }

    #[tokio::test]
    async fn test_loads_yaml_collections() {
        let temp = schema_dir().await;
        write_collection(&temp, "posts.yaml", POSTS_YAML).await;
        write_collection(&temp, "notes.txt", "ignored").await;

        let registry = SchemaRegistry::open(temp.path()).build().await.unwrap();
        assert_eq!(registry.len(), 1);
        let posts = registry.require("posts").unwrap();
        assert_eq!(posts.fields.len(), 2);
        assert!(posts.labels.is_some());
        assert!(matches!(
            registry.require("pages"),
            Err(FieldsError::CollectionNotFound { slug }) if slug == "pages"
        ));
    }

    #[tokio::test]
    async fn test_skips_invalid_yaml() {
        let temp = schema_dir().await;
        write_collection(&temp, "posts.yaml", POSTS_YAML).await;
        write_collection(&temp, "broken.yaml", "slug: [unterminated").await;
        let bad_tab = r#"
slug: pages
fields:
  - type: tabs
    tabs:
      - label: Meta
        localized: true
        fields: []
"#;
        write_collection(&temp, "pages.yaml", bad_tab).await;

        let registry = SchemaRegistry::open(temp.path()).build().await.unwrap();
        assert_eq!(registry.slugs().collect::<Vec<_>>(), vec!["posts"]);
    }

    #[tokio::test]
    async fn test_in_code_collection_replaces_yaml() {
        let temp = schema_dir().await;
        write_collection(&temp, "posts.yaml", POSTS_YAML).await;

        let hooked = Field::text("title").with_base(|b| {
            b.hooks = FieldHooks::default()
                .with(HookStage::BeforeChange, FieldHook::sync(|args| Ok(args.value)));
        });
        let registry = SchemaRegistry::open(temp.path())
            .with_collection(CollectionConfig::new("posts", vec![hooked]))
            .with_collection(CollectionConfig::new("media", vec![Field::upload("file", "media")]))
            .build()
            .await
            .unwrap();

        assert_eq!(registry.len(), 2);
        let posts = registry.get("posts").unwrap();
        assert_eq!(posts.fields.len(), 1);
        assert!(!posts.fields[0].base().unwrap().hooks.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_in_code_collection() {
        let temp = TempDir::new().unwrap();
        let err = SchemaRegistry::open(temp.path())
            .with_collection(CollectionConfig::new("posts", vec![]))
            .with_collection(CollectionConfig::new("posts", vec![]))
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, FieldsError::DuplicateCollection { slug } if slug == "posts"));
    }

    #[tokio::test]
    async fn test_sanitizes_loaded_collections() {
        let temp = schema_dir().await;
        let clash = r#"
slug: clash
fields:
  - type: text
    name: title
  - type: row
    fields:
      - type: text
        name: title
"#;
        write_collection(&temp, "clash.yaml", clash).await;
        let err = SchemaRegistry::open(temp.path()).build().await.unwrap_err();
        assert!(matches!(err, FieldsError::DuplicateFieldName { path } if path == "title"));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaRegistry>();
    }
}
