//! Selection state reconciled against an externally owned value
//!
//! The host owns the field value. [`SelectionState`] mirrors it as an ordered
//! selected set and proposes changes through an on-change callback; it never
//! treats its own mirror as the source of truth except for the multi-select
//! toggle, which updates the mirror immediately.

use association_picker_fields::FieldDescriptor;

use crate::record::{Record, SelectionValue};

/// Callback receiving every proposed new value.
pub type ChangeCallback = Box<dyn FnMut(&SelectionValue) + Send>;

pub struct SelectionState {
    multiple: bool,
    identity_key: String,
    value: SelectionValue,
    selected: Vec<Record>,
    on_change: Option<ChangeCallback>,
}

impl std::fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionState")
            .field("multiple", &self.multiple)
            .field("identity_key", &self.identity_key)
            .field("value", &self.value)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl SelectionState {
    /// Derive the initial state from the current value.
    pub fn new(value: SelectionValue, multiple: bool, field: &FieldDescriptor) -> Self {
        let mut state = Self {
            multiple,
            identity_key: field.identity_key().to_string(),
            value: SelectionValue::Empty,
            selected: Vec::new(),
            on_change: None,
        };
        state.reconcile(value);
        state
    }

    pub fn with_on_change(mut self, callback: impl FnMut(&SelectionValue) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Replace the selected set from a new external value.
    ///
    /// Always a full replace: multi-select copies the sequence, single-select
    /// wraps the record, an empty value clears. A multi-select state handed a
    /// single record treats it as a one-element sequence; a single-select state
    /// handed a sequence keeps its first element.
    pub fn reconcile(&mut self, value: SelectionValue) {
        self.selected = match (&value, self.multiple) {
            (SelectionValue::Empty, _) => Vec::new(),
            (SelectionValue::Multiple(records), true) => records.clone(),
            (SelectionValue::Single(record), _) => vec![record.clone()],
            (SelectionValue::Multiple(records), false) => records.iter().take(1).cloned().collect(),
        };
        self.value = value;
    }

    /// Select or unselect a candidate.
    ///
    /// Multi-select appends or removes by identity and updates the selected set.
    /// Single-select proposes the candidate and leaves the selected set to the
    /// next reconcile.
    pub fn toggle(&mut self, candidate: &Record) -> Option<SelectionValue> {
        if !self.multiple {
            return self.emit(SelectionValue::Single(candidate.clone()));
        }
        self.toggle_local(candidate);
        self.emit(SelectionValue::Multiple(self.selected.clone()))
    }

    /// Multi-select toggle on the selected set only, without emitting.
    ///
    /// Used by surfaces that batch changes until an explicit confirmation.
    pub fn toggle_local(&mut self, candidate: &Record) {
        let key = self.identity_key.as_str();
        if let Some(pos) = self
            .selected
            .iter()
            .position(|r| r.same_identity(candidate, key))
        {
            self.selected.remove(pos);
        } else {
            self.selected.push(candidate.clone());
        }
    }

    /// Propose the value without `candidate`.
    ///
    /// Multi-select filters the external value, not the selected set.
    pub fn remove(&mut self, candidate: &Record) -> Option<SelectionValue> {
        if !self.multiple {
            return self.emit(SelectionValue::Empty);
        }
        let key = self.identity_key.as_str();
        let remaining = self
            .value
            .records()
            .iter()
            .filter(|r| !r.same_identity(candidate, key))
            .cloned()
            .collect();
        self.emit(SelectionValue::Multiple(remaining))
    }

    /// Propose the value without its last element. No-op when empty.
    pub fn remove_last(&mut self) -> Option<SelectionValue> {
        if self.value.is_empty() {
            return None;
        }
        if !self.multiple {
            return self.emit(SelectionValue::Empty);
        }
        let records = self.value.records();
        let remaining = records[..records.len() - 1].to_vec();
        self.emit(SelectionValue::Multiple(remaining))
    }

    /// Propose an empty value.
    pub fn clear(&mut self) -> Option<SelectionValue> {
        self.emit(SelectionValue::Empty)
    }

    /// Propose the selected set as the new value.
    pub fn commit(&mut self) -> Option<SelectionValue> {
        let value = if self.multiple {
            SelectionValue::Multiple(self.selected.clone())
        } else {
            self.selected
                .first()
                .cloned()
                .map_or(SelectionValue::Empty, SelectionValue::Single)
        };
        self.emit(value)
    }

    /// Drop unconfirmed local changes by reconciling with the last value again.
    pub fn discard_local(&mut self) {
        self.reconcile(self.value.clone());
    }

    /// Whether a candidate with the same identity is in the selected set.
    pub fn is_selected(&self, candidate: &Record) -> bool {
        self.selected
            .iter()
            .any(|r| r.same_identity(candidate, &self.identity_key))
    }

    pub fn selected(&self) -> &[Record] {
        &self.selected
    }

    /// The last reconciled external value.
    pub fn value(&self) -> &SelectionValue {
        &self.value
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    fn emit(&mut self, value: SelectionValue) -> Option<SelectionValue> {
        if let Some(callback) = self.on_change.as_mut() {
            callback(&value);
        }
        Some(value)
    }
}
