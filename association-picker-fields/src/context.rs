//! YAML-backed collection metadata registry.
//!
//! Keeps one `.yaml` file per collection under a root directory and an
//! in-memory name index for lookup. Implements [`CollectionCatalog`] so the
//! query builder can read field metadata straight from it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::catalog::CollectionCatalog;
use crate::error::{FieldsError, Result};
use crate::types::CollectionDef;

/// Default collection definitions seeded on open.
///
/// Consumers build this to pass to `CollectionsContextBuilder::with_defaults()`.
/// Defaults whose file already exists on disk are left alone.
pub struct CollectionDefaults {
    collections: Vec<CollectionDef>,
}

impl CollectionDefaults {
    pub fn new() -> Self {
        Self {
            collections: Vec::new(),
        }
    }

    /// Add a default collection definition.
    pub fn collection(mut self, def: CollectionDef) -> Self {
        self.collections.push(def);
        self
    }

    pub fn collections(&self) -> &[CollectionDef] {
        &self.collections
    }
}

impl Default for CollectionDefaults {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CollectionsContext`. Created by `CollectionsContext::open()`.
pub struct CollectionsContextBuilder {
    root: PathBuf,
    defaults: Option<CollectionDefaults>,
}

impl CollectionsContextBuilder {
    /// Provide default collections. Seeded on first open; existing files are preserved.
    pub fn with_defaults(mut self, defaults: CollectionDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Build the context: create the directory, seed defaults, load from disk.
    pub async fn build(self) -> Result<CollectionsContext> {
        let root = self.root;
        fs::create_dir_all(&root).await?;

        if let Some(defaults) = self.defaults {
            seed_defaults(&root, &defaults).await?;
        }

        let mut ctx = CollectionsContext {
            root,
            collections: Vec::new(),
            name_index: HashMap::new(),
        };
        ctx.load_collections().await?;

        debug!(
            collections = ctx.collections.len(),
            "collections context opened"
        );

        Ok(ctx)
    }
}

/// Seed default collections whose file does not exist yet (matched by name).
async fn seed_defaults(root: &Path, defaults: &CollectionDefaults) -> Result<()> {
    for def in &defaults.collections {
        validate_name(&def.name)?;
        let path = collection_path(root, &def.name);
        if !path.exists() {
            let yaml = serde_yaml_ng::to_string(def)?;
            atomic_write(&path, yaml.as_bytes()).await?;
            debug!(name = %def.name, "seeded default collection");
        }
    }
    Ok(())
}

/// Collection names double as file stems and must stay inside the root.
fn validate_name(name: &str) -> Result<()> {
    let message = if name.trim().is_empty() {
        "name cannot be empty"
    } else if name.contains(['/', '\\']) || name.contains("..") {
        "name cannot contain path separators or '..'"
    } else if name.starts_with('.') {
        "name cannot start with '.'"
    } else {
        return Ok(());
    };
    Err(FieldsError::InvalidCollection {
        name: name.to_string(),
        message: message.into(),
    })
}

fn collection_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.yaml"))
}

/// Registry of collection definitions.
///
/// Owns a directory on disk with the structure:
/// ```text
/// collections/
///   users.yaml
///   tasks.yaml
/// ```
pub struct CollectionsContext {
    root: PathBuf,
    collections: Vec<CollectionDef>,
    name_index: HashMap<String, usize>,
}

impl CollectionsContext {
    /// Open or create a collections directory. Returns a builder for optional configuration.
    ///
    /// ```rust,ignore
    /// let ctx = CollectionsContext::open(path)
    ///     .with_defaults(my_defaults())
    ///     .build()
    ///     .await?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> CollectionsContextBuilder {
        CollectionsContextBuilder {
            root: root.into(),
            defaults: None,
        }
    }

    /// Get a collection definition by name.
    pub fn get_collection(&self, name: &str) -> Option<&CollectionDef> {
        self.name_index.get(name).map(|&i| &self.collections[i])
    }

    /// All collection definitions.
    pub fn all_collections(&self) -> &[CollectionDef] {
        &self.collections
    }

    /// Write (create or update) a collection definition. Persists to YAML immediately.
    pub async fn write_collection(&mut self, def: &CollectionDef) -> Result<()> {
        validate_name(&def.name)?;

        let yaml = serde_yaml_ng::to_string(def)?;
        atomic_write(&collection_path(&self.root, &def.name), yaml.as_bytes()).await?;

        if let Some(&idx) = self.name_index.get(&def.name) {
            self.collections[idx] = def.clone();
        } else {
            let idx = self.collections.len();
            self.collections.push(def.clone());
            self.name_index.insert(def.name.clone(), idx);
        }

        Ok(())
    }

    /// Delete a collection definition by name.
    pub async fn delete_collection(&mut self, name: &str) -> Result<()> {
        let idx = self
            .name_index
            .get(name)
            .copied()
            .ok_or_else(|| FieldsError::CollectionNotFound {
                name: name.to_string(),
            })?;

        match fs::remove_file(collection_path(&self.root, name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.name_index.remove(name);

        // Swap-remove and fix the moved entry's index
        self.collections.swap_remove(idx);
        if idx < self.collections.len() {
            let moved = &self.collections[idx];
            self.name_index.insert(moved.name.clone(), idx);
        }

        Ok(())
    }

    /// The root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn load_collections(&mut self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(FieldsError::NotInitialized {
                path: self.root.clone(),
            });
        }
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_yaml_ng::from_str::<CollectionDef>(&content) {
                Ok(def) if path.file_stem().and_then(|s| s.to_str()) != Some(def.name.as_str()) => {
                    warn!(?path, name = %def.name, "skipping collection whose name does not match its file");
                }
                Ok(def) if self.name_index.contains_key(&def.name) => {
                    warn!(?path, name = %def.name, "skipping duplicate collection");
                }
                Ok(def) => {
                    let idx = self.collections.len();
                    self.name_index.insert(def.name.clone(), idx);
                    self.collections.push(def);
                }
                Err(e) => {
                    warn!(?path, %e, "skipping invalid collection definition");
                }
            }
        }
        Ok(())
    }
}

impl CollectionCatalog for CollectionsContext {
    fn collection(&self, name: &str) -> Option<&CollectionDef> {
        self.get_collection(name)
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldMeta;
    use tempfile::TempDir;

    fn users() -> CollectionDef {
        CollectionDef::new("users")
            .with_field(FieldMeta::typed("id", "bigInt").with_interface("integer"))
            .with_field(FieldMeta::typed("nickname", "string").with_interface("input"))
    }

    #[tokio::test]
    async fn open_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("collections");
        let ctx = CollectionsContext::open(&root).build().await.unwrap();
        assert!(root.is_dir());
        assert!(ctx.all_collections().is_empty());
        assert_eq!(ctx.root(), root.as_path());
    }

    #[tokio::test]
    async fn write_and_read_collection() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("collections");
        let mut ctx = CollectionsContext::open(&root).build().await.unwrap();

        ctx.write_collection(&users()).await.unwrap();

        assert_eq!(ctx.all_collections().len(), 1);
        assert_eq!(ctx.get_collection("users").unwrap().fields.len(), 2);
        assert!(root.join("users.yaml").exists());
        assert!(ctx.collection("users").is_some());
    }

    #[tokio::test]
    async fn write_collection_updates_in_place() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();

        ctx.write_collection(&users()).await.unwrap();
        let updated = users().with_field(FieldMeta::typed("email", "string"));
        ctx.write_collection(&updated).await.unwrap();

        assert_eq!(ctx.all_collections().len(), 1);
        assert!(ctx.get_collection("users").unwrap().field("email").is_some());
    }

    #[tokio::test]
    async fn write_rejects_blank_name() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();
        let result = ctx.write_collection(&CollectionDef::new("  ")).await;
        assert!(matches!(result, Err(FieldsError::InvalidCollection { .. })));
    }

    #[tokio::test]
    async fn write_rejects_names_that_leave_the_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("collections");
        let mut ctx = CollectionsContext::open(&root).build().await.unwrap();

        for name in ["../escaped", "nested/users", "nested\\users", ".hidden", "a..b"] {
            let result = ctx.write_collection(&CollectionDef::new(name)).await;
            assert!(
                matches!(result, Err(FieldsError::InvalidCollection { .. })),
                "{name} accepted"
            );
        }
        assert!(!tmp.path().join("escaped.yaml").exists());
        assert!(ctx.all_collections().is_empty());
    }

    #[tokio::test]
    async fn defaults_with_unsafe_names_fail_to_open() {
        let tmp = TempDir::new().unwrap();
        let result = CollectionsContext::open(tmp.path().join("collections"))
            .with_defaults(CollectionDefaults::new().collection(CollectionDef::new("../up")))
            .build()
            .await;
        assert!(matches!(result, Err(FieldsError::InvalidCollection { .. })));
    }

    #[tokio::test]
    async fn file_named_differently_from_its_collection_is_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("users.yaml"), "name: people\n").unwrap();
        std::fs::write(tmp.path().join("tasks.yaml"), "name: tasks\n").unwrap();

        let mut ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();
        assert!(ctx.get_collection("people").is_none());
        assert_eq!(ctx.all_collections().len(), 1);
        assert!(matches!(
            ctx.delete_collection("people").await,
            Err(FieldsError::CollectionNotFound { .. })
        ));

        ctx.delete_collection("tasks").await.unwrap();
        let reopened = CollectionsContext::open(tmp.path()).build().await.unwrap();
        assert!(reopened.all_collections().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn delete_reports_remove_failure() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();
        ctx.write_collection(&CollectionDef::new("locked")).await.unwrap();
        // A directory in place of the file makes the unlink fail
        std::fs::remove_file(tmp.path().join("locked.yaml")).unwrap();
        std::fs::create_dir(tmp.path().join("locked.yaml")).unwrap();

        assert!(matches!(
            ctx.delete_collection("locked").await,
            Err(FieldsError::Io(_))
        ));
    }

    #[tokio::test]
    async fn delete_tolerates_already_removed_file() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();
        ctx.write_collection(&CollectionDef::new("gone")).await.unwrap();
        std::fs::remove_file(tmp.path().join("gone.yaml")).unwrap();

        ctx.delete_collection("gone").await.unwrap();
        assert!(ctx.get_collection("gone").is_none());
    }

    #[tokio::test]
    async fn delete_collection_fixes_indexes() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();
        ctx.write_collection(&CollectionDef::new("a")).await.unwrap();
        ctx.write_collection(&CollectionDef::new("b")).await.unwrap();
        ctx.write_collection(&CollectionDef::new("c")).await.unwrap();

        ctx.delete_collection("a").await.unwrap();

        assert_eq!(ctx.all_collections().len(), 2);
        assert!(ctx.get_collection("a").is_none());
        assert_eq!(ctx.get_collection("b").unwrap().name, "b");
        assert_eq!(ctx.get_collection("c").unwrap().name, "c");
        assert!(!tmp.path().join("a.yaml").exists());
    }

    #[tokio::test]
    async fn delete_nonexistent_collection_errors() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();
        let result = ctx.delete_collection("ghost").await;
        assert!(matches!(result, Err(FieldsError::CollectionNotFound { .. })));
    }

    #[tokio::test]
    async fn defaults_seed_without_overwriting() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("collections");

        {
            let mut ctx = CollectionsContext::open(&root).build().await.unwrap();
            let customized = CollectionDef::new("users").with_field(FieldMeta::new("custom"));
            ctx.write_collection(&customized).await.unwrap();
        }

        let defaults = CollectionDefaults::new()
            .collection(users())
            .collection(CollectionDef::new("tasks"));
        let ctx = CollectionsContext::open(&root)
            .with_defaults(defaults)
            .build()
            .await
            .unwrap();

        assert_eq!(ctx.all_collections().len(), 2);
        let users = ctx.get_collection("users").unwrap();
        assert!(users.field("custom").is_some());
        assert!(users.field("nickname").is_none());
        assert!(ctx.get_collection("tasks").is_some());
    }

    #[tokio::test]
    async fn invalid_yaml_is_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.yaml"), "fields: [[[").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        let ctx = CollectionsContext::open(tmp.path()).build().await.unwrap();
        assert!(ctx.all_collections().is_empty());
    }
}
