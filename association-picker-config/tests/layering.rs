use association_picker_config::{ConfigProvider, FileDiscovery, PickerConfig};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
#[serial]
fn global_then_project_then_env() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    fs::write(
        home.path().join("picker.toml"),
        "page_size = 50\ndebounce_ms = 200\n[render]\nmax_stack_bytes = 1024\n",
    )
    .unwrap();
    fs::write(project.path().join("picker.yml"), "page_size: 15\n").unwrap();

    std::env::set_var("PICKER_DEBOUNCE_MS", "120");
    let result = ConfigProvider::new()
        .with_discovery(FileDiscovery::with_directories(
            Some(project.path().to_path_buf()),
            Some(home.path().to_path_buf()),
        ))
        .load();
    std::env::remove_var("PICKER_DEBOUNCE_MS");

    let config = result.unwrap();
    assert_eq!(config.page_size, 15);
    assert_eq!(config.debounce_ms, 120);
    assert_eq!(config.render.max_stack_bytes, 1024);
    assert_eq!(
        config.render.memory_limit_bytes,
        PickerConfig::default().render.memory_limit_bytes
    );
}
