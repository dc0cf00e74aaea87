//! Query parameter construction
//!
//! [`QueryParamsBuilder`] turns an association field, committed search text,
//! the owning record and a page cursor into a [`QueryRequest`]. The request is
//! rebuilt from scratch on every call and depends only on its inputs.

use std::sync::Arc;

use association_picker_fields::{CollectionCatalog, CollectionDef, FieldDescriptor, FieldMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use crate::filter::Filter;
use crate::logging::Pretty;
use crate::record::Record;

/// Storage types and interfaces that are never searched.
pub const EXCLUDED_KINDS: &[&str] = &["password", "token"];

/// Field-name fragments that mark a field as sensitive (case-insensitive).
pub const SENSITIVE_NAMES: &[&str] = &[
    "password",
    "token",
    "resetToken",
    "accessToken",
    "refreshToken",
    "apiToken",
];

/// Storage types eligible for free-text search.
pub const SEARCHABLE_TYPES: &[&str] = &[
    "string", "text", "email", "phone", "uid", "nanoid", "integer", "bigInt", "float", "double",
    "decimal",
];

/// UI interfaces eligible for free-text search.
pub const SEARCHABLE_INTERFACES: &[&str] = &[
    "input",
    "textarea",
    "email",
    "phone",
    "integer",
    "number",
    "percent",
    "currency",
    "select",
    "radioGroup",
    "checkboxGroup",
];

/// Storage types that also get an exact numeric match.
pub const NUMERIC_TYPES: &[&str] = &["integer", "bigInt", "float", "double", "decimal"];

/// Field searched when the target collection's metadata is unavailable.
pub const FALLBACK_SEARCH_FIELD: &str = "name";

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A paginated remote list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filter: None,
        }
    }
}

impl QueryRequest {
    /// Canonical compact JSON; equal requests have equal signatures.
    pub fn signature(&self) -> String {
        self.to_json().to_string()
    }

    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("page".into(), self.page.into());
        map.insert("pageSize".into(), self.page_size.into());
        if let Some(filter) = &self.filter {
            map.insert("filter".into(), filter.to_json());
        }
        Value::Object(map)
    }
}

/// Everything besides the field that a query depends on.
#[derive(Debug, Clone, Copy)]
pub struct QueryInput<'a> {
    pub search: &'a str,
    pub owner: Option<&'a Record>,
    pub page: u32,
    pub page_size: u32,
    /// Allow-list of searchable field names; `None` or empty means all fields.
    pub search_fields: Option<&'a [String]>,
    /// Contextual filter always applied; blank filters count as absent.
    pub base_filter: Option<&'a Filter>,
}

impl<'a> QueryInput<'a> {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            search: "",
            owner: None,
            page,
            page_size,
            search_fields: None,
            base_filter: None,
        }
    }

    pub fn with_search(mut self, search: &'a str) -> Self {
        self.search = search;
        self
    }

    pub fn with_owner(mut self, owner: Option<&'a Record>) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_search_fields(mut self, fields: Option<&'a [String]>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn with_base_filter(mut self, filter: Option<&'a Filter>) -> Self {
        self.base_filter = filter;
        self
    }
}

impl Default for QueryInput<'_> {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Builds list queries against collections known to a [`CollectionCatalog`].
#[derive(Clone)]
pub struct QueryParamsBuilder {
    catalog: Arc<dyn CollectionCatalog>,
}

impl QueryParamsBuilder {
    pub fn new(catalog: Arc<dyn CollectionCatalog>) -> Self {
        Self { catalog }
    }

    /// Build the query, or `None` when the field has no target collection.
    pub fn build(&self, field: &FieldDescriptor, input: &QueryInput<'_>) -> Option<QueryRequest> {
        let target = field.target()?;

        let base = input.base_filter.filter(|f| !f.is_blank()).cloned();
        if let Some(base) = &base {
            debug!("base filter applied: {}", Pretty(base));
        }

        let search = input.search.trim();
        let search_filter = (!search.is_empty()).then(|| match self.catalog.collection(target) {
            Some(collection) => {
                let filter = multi_field_search(collection, search, input.search_fields);
                debug!("search filter applied: {}", Pretty(&filter));
                filter
            }
            None => {
                let label = field.target_key.as_deref().unwrap_or(FALLBACK_SEARCH_FIELD);
                let filter = Filter::includes(label, search);
                debug!(collection = target, "fallback search filter applied: {}", Pretty(&filter));
                filter
            }
        });

        let mut filter = match (base, search_filter) {
            (Some(base), Some(search)) => {
                let combined = Filter::and(vec![base, search]);
                debug!("combined filter: {}", Pretty(&combined));
                Some(combined)
            }
            (Some(base), None) => Some(base),
            (None, Some(search)) => Some(search),
            (None, None) => None,
        };

        if let Some(scope) = owner_scope(field, input.owner) {
            filter = Some(match filter {
                Some(existing) => Filter::and(vec![existing, scope]),
                None => scope,
            });
            debug!("association filter appended: {}", Pretty(&filter));
        }

        let request = QueryRequest {
            page: input.page,
            page_size: input.page_size,
            filter,
        };
        debug!("final query params: {}", request.signature());
        Some(request)
    }
}

/// OR of one predicate per searchable field.
fn multi_field_search(collection: &CollectionDef, search: &str, allow: Option<&[String]>) -> Filter {
    let number = parse_number(search);
    let predicates = searchable_fields(collection, allow)
        .into_iter()
        .map(|meta| {
            let includes = Filter::includes(&meta.name, search);
            match &number {
                Some(n) if is_numeric(meta) => {
                    Filter::or(vec![includes, Filter::eq(&meta.name, n.clone())])
                }
                _ => includes,
            }
        })
        .collect();
    Filter::or(predicates)
}

/// Fields of `collection` eligible for free-text search, in declaration order.
pub fn searchable_fields<'c>(collection: &'c CollectionDef, allow: Option<&[String]>) -> Vec<&'c FieldMeta> {
    let allow = allow.filter(|names| !names.is_empty());
    collection
        .named_fields()
        .filter(|meta| allow.is_none_or(|names| names.iter().any(|n| *n == meta.name)))
        .filter(|meta| is_searchable(meta))
        .collect()
}

/// Whether a field may take part in free-text search.
pub fn is_searchable(meta: &FieldMeta) -> bool {
    let type_ = meta.type_name();
    let interface = meta.interface_name();

    let excluded = |kind: Option<&str>| kind.is_some_and(|k| EXCLUDED_KINDS.contains(&k));
    if excluded(type_) || excluded(interface) {
        return false;
    }

    let lowered = meta.name.to_lowercase();
    if SENSITIVE_NAMES
        .iter()
        .any(|fragment| lowered.contains(&fragment.to_lowercase()))
    {
        return false;
    }

    type_.is_some_and(|t| SEARCHABLE_TYPES.contains(&t))
        || interface.is_some_and(|i| SEARCHABLE_INTERFACES.contains(&i))
}

fn is_numeric(meta: &FieldMeta) -> bool {
    meta.type_name().is_some_and(|t| NUMERIC_TYPES.contains(&t))
}

/// Parse the leading number of the search text, ignoring anything after it
/// (`"50%"` is 50). Integral values become JSON integers.
pub fn parse_number(text: &str) -> Option<Value> {
    let parsed: f64 = numeric_prefix(text.trim()).parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
        return Some(Value::from(parsed as i64));
    }
    Number::from_f64(parsed).map(Value::Number)
}

/// The longest prefix of `text` shaped like `[+-]digits[.digits][e[+-]digits]`,
/// where either side of the point may be empty but not both.
fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if mantissa || frac_end > end + 1 {
            mantissa = true;
            end = frac_end;
        }
    }
    if !mantissa {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }
    &text[..end]
}

/// `{$or: [{fk: {$is: null}}, {fk: {$eq: owner[sourceKey]}}]}` for owner-exclusive relations.
fn owner_scope(field: &FieldDescriptor, owner: Option<&Record>) -> Option<Filter> {
    if !field.scopes_to_owner() {
        return None;
    }
    let foreign_key = field.foreign_key.as_deref()?;
    let source_value = owner?.present(field.source_key())?;
    Some(Filter::or(vec![
        Filter::is_null(foreign_key),
        Filter::eq(foreign_key, source_value.clone()),
    ]))
}
