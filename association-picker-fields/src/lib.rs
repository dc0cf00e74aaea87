//! Association field descriptors and collection metadata
//!
//! `association-picker-fields` is the schema side of the association picker. It
//! knows how an association field points at another collection and what fields
//! that collection exposes, but nothing about searching, selecting or rendering.
//!
//! # Architecture
//!
//! - **Descriptors**: [`FieldDescriptor`] is the immutable description of one association
//! - **Metadata**: [`CollectionDef`] / [`FieldMeta`] describe a target collection's fields
//! - **Catalog seam**: [`CollectionCatalog`] is the metadata-provider trait the query builder consumes
//! - **YAML on disk**: [`CollectionsContext`] keeps one `.yaml` file per collection

pub mod catalog;
pub mod context;
pub mod error;
pub mod types;

pub use catalog::{CollectionCatalog, StaticCatalog};
pub use context::{CollectionDefaults, CollectionsContext, CollectionsContextBuilder};
pub use error::{FieldsError, Result};
pub use types::{CollectionDef, FieldDescriptor, FieldMeta, RelationKind, DEFAULT_KEY};
