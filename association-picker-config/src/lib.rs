//! # Association Picker Configuration
//!
//! Layered configuration for the association picker, built on
//! [figment](https://docs.rs/figment).
//!
//! ## Precedence
//!
//! 1. Built-in defaults
//! 2. `~/.association-picker/picker.{toml,yaml,yml,json}`
//! 3. `./.association-picker/picker.{toml,yaml,yml,json}`
//! 4. Files added with [`ConfigProvider::with_file`]
//! 5. `PICKER_*` environment variables (`PICKER_RENDER__TIMEOUT_MS=100`)
//!
//! ```no_run
//! use association_picker_config::ConfigProvider;
//!
//! let config = ConfigProvider::new().load()?;
//! assert!(config.page_size >= 1);
//! # Ok::<(), association_picker_config::ConfigError>(())
//! ```

pub mod discovery;
pub mod error;
pub mod provider;
pub mod types;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery, CONFIG_DIR_NAME};
pub use error::{ConfigError, ConfigResult};
pub use provider::{ConfigProvider, ENV_PREFIX};
pub use types::{PickerConfig, RenderLimits, MAX_DEBOUNCE_MS};

/// Load configuration from the default sources.
pub fn load_config() -> ConfigResult<PickerConfig> {
    ConfigProvider::new().load()
}
