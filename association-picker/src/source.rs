//! The remote list collaborator

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PickerError, Result};
use crate::query::QueryRequest;
use crate::record::Record;

/// One page of list results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default)]
    pub meta: ListMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListMeta {
    /// Total matching rows across all pages.
    #[serde(default)]
    pub count: u64,
}

impl ListResponse {
    pub fn new(data: Vec<Record>, count: u64) -> Self {
        Self {
            data,
            meta: ListMeta { count },
        }
    }
}

/// Fetches a page of records from a collection.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list(&self, collection: &str, request: &QueryRequest) -> Result<ListResponse>;
}

/// An in-memory [`RecordSource`] that applies filters and pagination itself.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<Record>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, collection: impl Into<String>, records: Vec<Record>) -> Self {
        self.collections.insert(collection.into(), records);
        self
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn list(&self, collection: &str, request: &QueryRequest) -> Result<ListResponse> {
        let rows = self
            .collections
            .get(collection)
            .ok_or_else(|| PickerError::fetch(collection, "no such collection"))?;

        let matching: Vec<&Record> = rows
            .iter()
            .filter(|r| request.filter.as_ref().is_none_or(|f| f.matches(r)))
            .collect();

        let page = request.page.max(1) as usize;
        let size = request.page_size as usize;
        let data = matching
            .iter()
            .skip((page - 1).saturating_mul(size))
            .take(size)
            .map(|r| (*r).clone())
            .collect();

        Ok(ListResponse::new(data, matching.len() as u64))
    }
}
