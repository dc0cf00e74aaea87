//! # Association Picker
//!
//! The selection and query reconciliation engine behind an association picker
//! control: a form field that references records in another collection.
//!
//! ## Components
//!
//! - [`QueryParamsBuilder`]: search text, owning record and page cursor to a [`QueryRequest`]
//! - [`SelectionState`]: the selected set, reconciled against the host-owned value
//! - [`SelectorDataSource`]: debounced search, fetch tickets and stale-result dropping
//! - [`RenderTemplateEvaluator`]: sandboxed render templates with fallback text
//! - [`Dropdown`] / [`Modal`]: headless surfaces composing the above
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use association_picker::{
//!     MemorySource, PickerConfig, Record, RenderTemplateEvaluator, Selector, SelectionValue,
//!     SelectorSettings, SurfaceCore,
//! };
//! use association_picker_fields::{CollectionDef, FieldDescriptor, FieldMeta, StaticCatalog};
//!
//! # async fn example() -> association_picker::Result<()> {
//! let config = PickerConfig::default();
//! let catalog = StaticCatalog::new()
//!     .with_collection(CollectionDef::new("users").with_field(FieldMeta::typed("name", "string")));
//! let settings = SelectorSettings::from_json(&serde_json::json!({"allowMultiple": true}))?;
//!
//! let core = SurfaceCore::from_settings(
//!     &settings,
//!     FieldDescriptor::new("assignees").with_target("users"),
//!     SelectionValue::Empty,
//!     Arc::new(catalog),
//!     RenderTemplateEvaluator::new(&config.render)?,
//!     &config,
//! );
//! let mut selector = Selector::new(settings.custom_selector_mode, core);
//!
//! let source = MemorySource::new().with_records("users", vec![Record::new().with("id", 1).with("name", "Ann")]);
//! selector.core_mut().data_mut().open();
//! selector.core_mut().data_mut().refresh(&source).await;
//! for row in selector.core().rows().await {
//!     println!("{}", row.markup);
//! }
//! # Ok(())
//! # }
//! ```

pub mod data_source;
pub mod error;
pub mod filter;
pub mod logging;
pub mod query;
pub mod record;
pub mod render;
pub mod selection;
pub mod settings;
pub mod source;
pub mod surface;

pub use data_source::{FetchTicket, SelectorDataSource, DEFAULT_DEBOUNCE};
pub use error::{PickerError, Result};
pub use filter::{Condition, Filter};
pub use logging::{init_tracing, Pretty};
pub use query::{QueryInput, QueryParamsBuilder, QueryRequest, DEFAULT_PAGE_SIZE};
pub use record::{OwningRecord, Record, SelectionValue};
pub use render::{
    fallback_text, NamedRenderer, RenderKind, RenderTemplate, RenderTemplateEvaluator,
    RendererRegistry, UNKNOWN_TEXT,
};
pub use selection::SelectionState;
pub use settings::{SelectorMode, SelectorSettings};
pub use source::{ListMeta, ListResponse, MemorySource, RecordSource};
pub use surface::{Dropdown, Modal, RenderedCandidate, Selector, SurfaceCore};

pub use association_picker_config::{ConfigProvider, PickerConfig, RenderLimits};
