//! Debounced search, query rebuilding and result bookkeeping
//!
//! [`SelectorDataSource`] keeps raw and committed search text, the page cursor
//! and the last applied result page. Time is passed in explicitly so the
//! debounce can be driven by an event loop, a test clock, or [`settle`].
//!
//! Fetches are split into [`begin_fetch`] and [`complete_fetch`] so a caller can
//! run the remote request anywhere. Each ticket carries the signature of the
//! query it was issued for; results whose signature no longer matches the
//! current query are dropped.
//!
//! [`settle`]: SelectorDataSource::settle
//! [`begin_fetch`]: SelectorDataSource::begin_fetch
//! [`complete_fetch`]: SelectorDataSource::complete_fetch

use std::time::Duration;

use association_picker_config::PickerConfig;
use association_picker_fields::FieldDescriptor;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::filter::Filter;
use crate::query::{QueryInput, QueryParamsBuilder, QueryRequest, DEFAULT_PAGE_SIZE};
use crate::record::Record;
use crate::source::{ListResponse, RecordSource};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// An issued fetch, to be completed with the remote result.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub collection: String,
    pub request: QueryRequest,
    pub signature: String,
    sequence: u64,
}

pub struct SelectorDataSource {
    builder: QueryParamsBuilder,
    field: FieldDescriptor,
    owner: Option<Record>,
    search_fields: Option<Vec<String>>,
    base_filter: Option<Filter>,
    page_size: u32,
    debounce: Duration,

    raw_search: String,
    committed_search: String,
    deadline: Option<Instant>,
    page: u32,
    active: bool,

    items: Vec<Record>,
    total_count: u64,
    loading: bool,
    issued: u64,
}

impl SelectorDataSource {
    pub fn new(builder: QueryParamsBuilder, field: FieldDescriptor) -> Self {
        Self {
            builder,
            field,
            owner: None,
            search_fields: None,
            base_filter: None,
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            raw_search: String::new(),
            committed_search: String::new(),
            deadline: None,
            page: 1,
            active: false,
            items: Vec::new(),
            total_count: 0,
            loading: false,
            issued: 0,
        }
    }

    /// Take page size and debounce window from configuration.
    pub fn with_config(self, config: &PickerConfig) -> Self {
        self.with_page_size(config.page_size)
            .with_debounce(config.debounce())
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_search_fields(mut self, fields: Option<Vec<String>>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn with_base_filter(mut self, filter: Option<Filter>) -> Self {
        self.base_filter = filter;
        self
    }

    pub fn with_owner(mut self, owner: Option<Record>) -> Self {
        self.owner = owner;
        self
    }

    /// Record a keystroke. Restarts the quiet period.
    pub fn set_search(&mut self, text: impl Into<String>, now: Instant) {
        self.raw_search = text.into();
        self.deadline = Some(now + self.debounce);
    }

    /// Commit the raw search once the quiet period has elapsed.
    ///
    /// Returns true when a commit happened; the page resets to 1 at the same time.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.committed_search = self.raw_search.clone();
                self.page = 1;
                debug!(search = %self.committed_search, "search committed");
                true
            }
            _ => false,
        }
    }

    /// When the pending commit fires, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Wait for the pending commit, if any, and apply it.
    pub async fn settle(&mut self) -> bool {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.tick(Instant::now())
            }
            None => false,
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_owner(&mut self, owner: Option<Record>) {
        self.owner = owner;
    }

    /// Start issuing fetches (surface opened).
    pub fn open(&mut self) {
        self.active = true;
    }

    /// Stop issuing fetches and reset search, pending debounce and page.
    pub fn close(&mut self) {
        self.active = false;
        self.raw_search.clear();
        self.committed_search.clear();
        self.deadline = None;
        self.page = 1;
    }

    /// The query for the current committed state, or `None` if unresolvable.
    pub fn query(&self) -> Option<QueryRequest> {
        let input = QueryInput::new(self.page, self.page_size)
            .with_search(&self.committed_search)
            .with_owner(self.owner.as_ref())
            .with_search_fields(self.search_fields.as_deref())
            .with_base_filter(self.base_filter.as_ref());
        self.builder.build(&self.field, &input)
    }

    /// Issue a fetch for the current query when active and resolvable.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.active {
            return None;
        }
        let collection = self.field.target()?.to_string();
        let request = self.query()?;

        self.issued += 1;
        self.loading = true;
        Some(FetchTicket {
            collection,
            signature: request.signature(),
            request,
            sequence: self.issued,
        })
    }

    /// Apply a fetch result if it still matches the current query.
    ///
    /// Errors become an empty page. Returns whether the result was applied.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<ListResponse>) -> bool {
        if ticket.sequence == self.issued {
            self.loading = false;
        }

        let current = self.query().map(|q| q.signature());
        if current.as_deref() != Some(ticket.signature.as_str()) {
            debug!(
                collection = %ticket.collection,
                stale = %ticket.signature,
                "dropping result for superseded query"
            );
            return false;
        }

        match result {
            Ok(response) => {
                self.items = response.data;
                self.total_count = response.meta.count;
            }
            Err(e) => {
                warn!(collection = %ticket.collection, error = %e, "list fetch failed");
                self.items.clear();
                self.total_count = 0;
            }
        }
        true
    }

    /// Fetch from `source` and apply the result.
    pub async fn refresh(&mut self, source: &dyn RecordSource) -> bool {
        let Some(ticket) = self.begin_fetch() else {
            return false;
        };
        let result = source.list(&ticket.collection, &ticket.request).await;
        self.complete_fetch(ticket, result)
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn raw_search(&self) -> &str {
        &self.raw_search
    }

    pub fn committed_search(&self) -> &str {
        &self.committed_search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn field(&self) -> &FieldDescriptor {
        &self.field
    }
}
