//! The collection metadata provider seam.

use std::collections::HashMap;

use crate::types::CollectionDef;

/// Resolves collections by name.
///
/// The query builder consumes this; hosts back it with whatever schema store
/// they have. Returning `None` means metadata is unavailable and callers fall
/// back to degraded behavior.
pub trait CollectionCatalog: Send + Sync {
    fn collection(&self, name: &str) -> Option<&CollectionDef>;
}

/// A fixed, in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    collections: HashMap<String, CollectionDef>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a collection definition.
    pub fn with_collection(mut self, def: CollectionDef) -> Self {
        self.insert(def);
        self
    }

    pub fn insert(&mut self, def: CollectionDef) {
        self.collections.insert(def.name.clone(), def);
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl CollectionCatalog for StaticCatalog {
    fn collection(&self, name: &str) -> Option<&CollectionDef> {
        self.collections.get(name)
    }
}

impl<T: CollectionCatalog + ?Sized> CollectionCatalog for std::sync::Arc<T> {
    fn collection(&self, name: &str) -> Option<&CollectionDef> {
        (**self).collection(name)
    }
}
