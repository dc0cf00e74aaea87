use std::sync::Arc;

use association_picker::{
    ConfigProvider, Dropdown, ListResponse, MemorySource, PickerError, QueryRequest, Record,
    RecordSource, RenderTemplateEvaluator, SelectionValue, SelectorSettings, SurfaceCore,
};
use association_picker_config::FileDiscovery;
use association_picker_fields::{
    CollectionDef, CollectionDefaults, CollectionsContext, FieldDescriptor, FieldMeta,
};
use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use tokio::time::Instant;

fn users() -> Vec<Record> {
    ["Ann", "Anna", "Bob", "Hannah"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Record::new()
                .with("id", i as i64 + 1)
                .with("name", *name)
                .with("password", "secret")
        })
        .collect()
}

async fn registry(root: &std::path::Path) -> CollectionsContext {
    let defaults = CollectionDefaults::new().collection(
        CollectionDef::new("users")
            .with_field(FieldMeta::typed("id", "bigInt"))
            .with_field(FieldMeta::typed("name", "string").with_interface("input"))
            .with_field(FieldMeta::typed("password", "password").with_interface("password")),
    );
    CollectionsContext::open(root.join("collections"))
        .with_defaults(defaults)
        .build()
        .await
        .unwrap()
}

#[test_log::test(tokio::test)]
async fn dropdown_search_pick_flow() -> Result<(), PickerError> {
    let tmp = TempDir::new().unwrap();
    let catalog = registry(tmp.path()).await;
    let config = ConfigProvider::new()
        .with_discovery(FileDiscovery::with_directories(
            Some(tmp.path().join("project")),
            Some(tmp.path().join("global")),
        ))
        .load()?;

    let settings = SelectorSettings::from_json(&json!({"allowMultiple": true, "pageSize": 2}))?;
    let core = SurfaceCore::from_settings(
        &settings,
        FieldDescriptor::new("assignees").with_target("users"),
        SelectionValue::Empty,
        Arc::new(catalog),
        RenderTemplateEvaluator::new(&config.render)?,
        &config,
    );
    let mut dropdown = Dropdown::new(core);
    let source = MemorySource::new().with_records("users", users());

    dropdown.focus();
    assert!(dropdown.core_mut().data_mut().refresh(&source).await);
    assert_eq!(dropdown.core().data().total_count(), 4);
    assert_eq!(dropdown.core().data().items().len(), 2);

    dropdown.input("ann", Instant::now());
    dropdown.core_mut().data_mut().settle().await;
    assert!(dropdown.core_mut().data_mut().refresh(&source).await);
    // Ann, Anna, Hannah; the password column is never searched
    assert_eq!(dropdown.core().data().total_count(), 3);

    let rows = dropdown.core().rows().await;
    assert_eq!(rows[0].markup, "<span>1</span>");

    let first = dropdown.core().data().items()[0].clone();
    let emitted = dropdown.pick(&first).unwrap();
    dropdown.core_mut().reconcile(emitted);
    assert!(dropdown.core().is_selected(&first));
    assert!(dropdown.is_open());

    let tags = dropdown.core().tags().await;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].key.as_deref(), Some("1"));
    Ok(())
}

/// Answers every request with the same canned page.
struct CannedSource(ListResponse);

#[async_trait]
impl RecordSource for CannedSource {
    async fn list(&self, _collection: &str, _request: &QueryRequest) -> association_picker::Result<ListResponse> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn late_result_for_old_search_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let catalog = registry(tmp.path()).await;
    let config = association_picker::PickerConfig::default();
    let core = SurfaceCore::from_settings(
        &SelectorSettings::default(),
        FieldDescriptor::new("owner").with_target("users"),
        SelectionValue::Empty,
        Arc::new(catalog),
        RenderTemplateEvaluator::new(&config.render).unwrap(),
        &config,
    );
    let mut dropdown = Dropdown::new(core);
    dropdown.focus();

    let data = dropdown.core_mut().data_mut();
    let unfiltered = data.begin_fetch().unwrap();

    let t0 = Instant::now();
    data.set_search("bob", t0);
    data.tick(t0 + config.debounce());
    let filtered = data.begin_fetch().unwrap();

    let bob_page = CannedSource(ListResponse::new(vec![users()[2].clone()], 1));
    let result = bob_page.list(&filtered.collection, &filtered.request).await;
    assert!(data.complete_fetch(filtered, result));

    let everyone = MemorySource::new().with_records("users", users());
    let late = everyone.list(&unfiltered.collection, &unfiltered.request).await;
    assert!(!data.complete_fetch(unfiltered, late));

    assert_eq!(data.total_count(), 1);
    assert_eq!(data.items()[0].get("name").unwrap(), "Bob");
    assert!(!data.is_loading());
}

#[tokio::test]
async fn fetch_failure_clears_loading_and_results() {
    struct Failing;

    #[async_trait]
    impl RecordSource for Failing {
        async fn list(&self, collection: &str, _request: &QueryRequest) -> association_picker::Result<ListResponse> {
            Err(PickerError::fetch(collection, "503 Service Unavailable"))
        }
    }

    let tmp = TempDir::new().unwrap();
    let catalog = registry(tmp.path()).await;
    let config = association_picker::PickerConfig::default();
    let core = SurfaceCore::from_settings(
        &SelectorSettings::default(),
        FieldDescriptor::new("owner").with_target("users"),
        SelectionValue::Empty,
        Arc::new(catalog),
        RenderTemplateEvaluator::new(&config.render).unwrap(),
        &config,
    );
    let mut dropdown = Dropdown::new(core);
    dropdown.focus();

    let data = dropdown.core_mut().data_mut();
    assert!(data.refresh(&Failing).await);
    assert!(data.items().is_empty());
    assert_eq!(data.total_count(), 0);
    assert!(!data.is_loading());
}
