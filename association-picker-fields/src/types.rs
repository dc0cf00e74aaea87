//! Core association and collection types.
//!
//! All types serialize to/from YAML and JSON via serde. A [`FieldDescriptor`]
//! describes how one association field reaches into its target collection;
//! a [`CollectionDef`] lists the fields a collection exposes.

use serde::{Deserialize, Serialize};

/// Identity field used when a descriptor does not name one.
pub const DEFAULT_KEY: &str = "id";

/// The relationship an association field models, named by its interface code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One-to-one, declared on the side that has the other record.
    #[serde(rename = "oho")]
    OneHasOne,
    /// One-to-one, declared on the side that belongs to the other record.
    #[serde(rename = "obo")]
    OneBelongsToOne,
    #[serde(rename = "o2m")]
    OneToMany,
    #[serde(rename = "m2o")]
    ManyToOne,
    #[serde(rename = "m2m")]
    ManyToMany,
}

impl RelationKind {
    /// Interface code as used by the host schema.
    pub fn code(self) -> &'static str {
        match self {
            Self::OneHasOne => "oho",
            Self::OneBelongsToOne => "obo",
            Self::OneToMany => "o2m",
            Self::ManyToOne => "m2o",
            Self::ManyToMany => "m2m",
        }
    }

    /// Relations where the foreign key lives on the target and points back at
    /// the owner, so a target row can belong to at most one owner.
    pub fn is_owner_exclusive(self) -> bool {
        matches!(self, Self::OneHasOne | Self::OneToMany)
    }

    /// Whether the owner side holds a sequence of targets.
    pub fn is_to_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

/// Describes one association field. Immutable for the lifetime of a control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Field name on the owning collection.
    pub name: String,
    /// Target collection name. A descriptor without one cannot be queried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<RelationKind>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = Some(key.into());
        self
    }

    pub fn with_target_key(mut self, key: impl Into<String>) -> Self {
        self.target_key = Some(key.into());
        self
    }

    pub fn with_interface(mut self, interface: RelationKind) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Target collection name, treating an empty string as absent.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.is_empty())
    }

    /// Identity field of target records, `id` unless configured.
    pub fn identity_key(&self) -> &str {
        self.target_key.as_deref().unwrap_or(DEFAULT_KEY)
    }

    /// Field on the owning record holding the value the foreign key points at.
    pub fn source_key(&self) -> &str {
        self.source_key.as_deref().unwrap_or(DEFAULT_KEY)
    }

    /// Whether queries should be narrowed to rows unassigned or assigned to the owner.
    pub fn scopes_to_owner(&self) -> bool {
        self.foreign_key.is_some() && self.interface.is_some_and(RelationKind::is_owner_exclusive)
    }
}

/// Metadata for a single field of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Storage type, e.g. `string`, `integer`, `password`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// UI interface, e.g. `input`, `select`, `password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            type_: None,
            interface: None,
        }
    }

    pub fn typed(name: impl Into<String>, type_: impl Into<String>) -> Self {
        Self {
            type_: Some(type_.into()),
            ..Self::new(name)
        }
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_.as_deref()
    }

    pub fn interface_name(&self) -> Option<&str> {
        self.interface.as_deref()
    }
}

/// A collection definition: the fields a target collection exposes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

impl CollectionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields with a usable (non-empty) name, in declaration order.
    pub fn named_fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter().filter(|f| !f.name.is_empty())
    }
}
