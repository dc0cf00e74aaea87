//! Per-field selector settings
//!
//! The host attaches these to an association field as component props:
//!
//! ```json
//! {
//!   "allowMultiple": true,
//!   "customSelectorMode": "modal",
//!   "renderItem": "function(item) { return item.name; }",
//!   "searchFields": ["name", "email"],
//!   "dataScopeFilter": {"status": {"$eq": "active"}},
//!   "pageSize": 20
//! }
//! ```

use association_picker_config::PickerConfig;
use association_picker_fields::CollectionDef;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::filter::Filter;
use crate::render::{RenderKind, RenderTemplate};

/// Which surface presents the picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorMode {
    #[default]
    Dropdown,
    Modal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorSettings {
    #[serde(alias = "multiple")]
    pub allow_multiple: bool,
    pub custom_selector_mode: SelectorMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_scope_filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl SelectorSettings {
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Template for candidate rows, generated when blank.
    pub fn item_template(&self, collection: Option<&CollectionDef>) -> RenderTemplate {
        resolve(self.render_item.as_deref(), RenderKind::Item, collection)
    }

    /// Template for selected-value tags, generated when blank.
    pub fn value_template(&self, collection: Option<&CollectionDef>) -> RenderTemplate {
        resolve(self.render_value.as_deref(), RenderKind::Value, collection)
    }

    /// The per-field page size, else the configured one.
    pub fn effective_page_size(&self, config: &PickerConfig) -> u32 {
        self.page_size.filter(|n| *n >= 1).unwrap_or(config.page_size)
    }
}

fn resolve(source: Option<&str>, kind: RenderKind, collection: Option<&CollectionDef>) -> RenderTemplate {
    match source.filter(|s| !s.trim().is_empty()) {
        Some(source) => RenderTemplate::parse(source),
        None => RenderTemplate::default_for(kind, collection),
    }
}
