//! Headless dropdown and modal surfaces
//!
//! These hold no presentation. They translate UI events (focus, keystrokes,
//! picks, confirm) into calls on [`SelectionState`] and [`SelectorDataSource`]
//! and render rows and tags through the [`RenderTemplateEvaluator`].

use std::sync::Arc;

use association_picker_config::PickerConfig;
use association_picker_fields::{CollectionCatalog, FieldDescriptor};
use tokio::time::Instant;
use tracing::warn;

use crate::data_source::SelectorDataSource;
use crate::query::QueryParamsBuilder;
use crate::record::{display_text, Record, SelectionValue};
use crate::render::{RenderKind, RenderTemplate, RenderTemplateEvaluator};
use crate::selection::SelectionState;
use crate::settings::{SelectorMode, SelectorSettings};

/// A candidate row or selected tag, rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCandidate {
    /// Identity as text; `None` for records without one.
    pub key: Option<String>,
    pub markup: String,
    pub selected: bool,
}

/// State shared by both surfaces.
pub struct SurfaceCore {
    selection: SelectionState,
    data: SelectorDataSource,
    evaluator: RenderTemplateEvaluator,
    item_template: RenderTemplate,
    value_template: RenderTemplate,
}

impl SurfaceCore {
    pub fn new(
        selection: SelectionState,
        data: SelectorDataSource,
        evaluator: RenderTemplateEvaluator,
        item_template: RenderTemplate,
        value_template: RenderTemplate,
    ) -> Self {
        Self {
            selection,
            data,
            evaluator,
            item_template,
            value_template,
        }
    }

    /// Assemble from per-field settings and the picker configuration.
    pub fn from_settings(
        settings: &SelectorSettings,
        field: FieldDescriptor,
        value: SelectionValue,
        catalog: Arc<dyn CollectionCatalog>,
        evaluator: RenderTemplateEvaluator,
        config: &PickerConfig,
    ) -> Self {
        if field.target().is_none() {
            warn!(field = %field.name, "association field has no target collection");
        }
        let collection = field.target().and_then(|t| catalog.collection(t));
        let item_template = settings.item_template(collection);
        let value_template = settings.value_template(collection);

        let selection = SelectionState::new(value, settings.allow_multiple, &field);
        let data = SelectorDataSource::new(QueryParamsBuilder::new(catalog), field)
            .with_config(config)
            .with_page_size(settings.effective_page_size(config))
            .with_search_fields(settings.search_fields.clone())
            .with_base_filter(settings.data_scope_filter.clone());

        Self::new(selection, data, evaluator, item_template, value_template)
    }

    /// Render the current result page.
    pub async fn rows(&self) -> Vec<RenderedCandidate> {
        let mut rows = Vec::with_capacity(self.data.items().len());
        for record in self.data.items() {
            rows.push(RenderedCandidate {
                key: self.key(record),
                markup: self
                    .evaluator
                    .evaluate(&self.item_template, record, RenderKind::Item)
                    .await,
                selected: self.selection.is_selected(record),
            });
        }
        rows
    }

    /// Render the external value as tags, in order.
    pub async fn tags(&self) -> Vec<RenderedCandidate> {
        let mut tags = Vec::new();
        for record in self.selection.value().records() {
            tags.push(RenderedCandidate {
                key: self.key(record),
                markup: self
                    .evaluator
                    .evaluate(&self.value_template, record, RenderKind::Value)
                    .await,
                selected: true,
            });
        }
        tags
    }

    pub fn is_selected(&self, candidate: &Record) -> bool {
        self.selection.is_selected(candidate)
    }

    /// The host's value changed.
    pub fn reconcile(&mut self, value: SelectionValue) {
        self.selection.reconcile(value);
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    pub fn data(&self) -> &SelectorDataSource {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SelectorDataSource {
        &mut self.data
    }

    fn key(&self, record: &Record) -> Option<String> {
        record
            .identity(self.selection.identity_key())
            .map(display_text)
    }
}

/// Inline dropdown: opens on focus, searches as you type.
pub struct Dropdown {
    core: SurfaceCore,
    open: bool,
}

impl Dropdown {
    pub fn new(core: SurfaceCore) -> Self {
        Self { core, open: false }
    }

    pub fn focus(&mut self) {
        self.open = true;
        self.core.data.open();
    }

    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.core.data.set_search(text, now);
    }

    /// Single-select emits and closes; multi-select toggles and stays open.
    pub fn pick(&mut self, candidate: &Record) -> Option<SelectionValue> {
        let emitted = self.core.selection.toggle(candidate);
        if !self.core.selection.is_multiple() {
            self.close();
        }
        emitted
    }

    /// Backspace in an empty search box removes the last value.
    pub fn backspace(&mut self) -> Option<SelectionValue> {
        if self.core.data.raw_search().trim().is_empty() {
            self.core.selection.remove_last()
        } else {
            None
        }
    }

    pub fn remove(&mut self, candidate: &Record) -> Option<SelectionValue> {
        self.core.selection.remove(candidate)
    }

    pub fn clear(&mut self) -> Option<SelectionValue> {
        self.core.selection.clear()
    }

    /// Losing focus closes a single-select dropdown only.
    pub fn blur(&mut self) {
        if !self.core.selection.is_multiple() {
            self.close();
        }
    }

    /// Clicking elsewhere closes a multi-select dropdown.
    pub fn click_outside(&mut self) {
        if self.core.selection.is_multiple() && self.open {
            self.close();
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.core.data.close();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn core(&self) -> &SurfaceCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SurfaceCore {
        &mut self.core
    }
}

/// Paginated modal. Multi-select changes are batched until [`Modal::confirm`].
pub struct Modal {
    core: SurfaceCore,
    visible: bool,
}

impl Modal {
    pub fn new(core: SurfaceCore) -> Self {
        Self {
            core,
            visible: false,
        }
    }

    pub fn open(&mut self) {
        self.visible = true;
        self.core.data.open();
    }

    /// Close without emitting; unconfirmed toggles are discarded.
    pub fn cancel(&mut self) {
        self.core.selection.discard_local();
        self.close();
    }

    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.core.data.set_search(text, now);
    }

    pub fn set_page(&mut self, page: u32) {
        self.core.data.set_page(page);
    }

    /// Single-select emits and closes; multi-select toggles locally.
    pub fn pick(&mut self, candidate: &Record) -> Option<SelectionValue> {
        if self.core.selection.is_multiple() {
            self.core.selection.toggle_local(candidate);
            return None;
        }
        let emitted = self.core.selection.toggle(candidate);
        self.close();
        emitted
    }

    /// Emit the locally selected set (multi-select) and close.
    pub fn confirm(&mut self) -> Option<SelectionValue> {
        let emitted = if self.core.selection.is_multiple() {
            self.core.selection.commit()
        } else {
            None
        };
        self.close();
        emitted
    }

    pub fn remove(&mut self, candidate: &Record) -> Option<SelectionValue> {
        self.core.selection.remove(candidate)
    }

    pub fn clear(&mut self) -> Option<SelectionValue> {
        self.core.selection.clear()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn core(&self) -> &SurfaceCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SurfaceCore {
        &mut self.core
    }

    fn close(&mut self) {
        self.visible = false;
        self.core.data.close();
    }
}

/// The surface chosen by [`SelectorSettings::custom_selector_mode`].
pub enum Selector {
    Dropdown(Dropdown),
    Modal(Modal),
}

impl Selector {
    pub fn new(mode: SelectorMode, core: SurfaceCore) -> Self {
        match mode {
            SelectorMode::Dropdown => Self::Dropdown(Dropdown::new(core)),
            SelectorMode::Modal => Self::Modal(Modal::new(core)),
        }
    }

    pub fn core(&self) -> &SurfaceCore {
        match self {
            Self::Dropdown(d) => d.core(),
            Self::Modal(m) => m.core(),
        }
    }

    pub fn core_mut(&mut self) -> &mut SurfaceCore {
        match self {
            Self::Dropdown(d) => d.core_mut(),
            Self::Modal(m) => m.core_mut(),
        }
    }
}
