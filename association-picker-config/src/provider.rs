//! Configuration provider using Figment

use crate::{
    discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery},
    error::{ConfigError, ConfigResult},
    types::PickerConfig,
};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::PathBuf;
use tracing::{debug, trace};

/// Prefix for environment overrides, e.g. `PICKER_PAGE_SIZE=20`.
pub const ENV_PREFIX: &str = "PICKER_";

/// Loads [`PickerConfig`] from all sources.
///
/// Sources are merged in precedence order (later sources override earlier ones):
/// 1. Default values
/// 2. Discovered configuration files (global, then project)
/// 3. Files added with [`ConfigProvider::with_file`], in the order added
/// 4. Environment variables (`PICKER_` prefix, `__` for nesting)
///
/// Nothing is cached; every load reads the sources again.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
    explicit_files: Vec<PathBuf>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directory discovery used for discovered files.
    pub fn with_discovery(mut self, discovery: FileDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Layer an explicit file above the discovered ones.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_files.push(path.into());
        self
    }

    /// Load and validate the configuration.
    pub fn load(&self) -> ConfigResult<PickerConfig> {
        let config: PickerConfig = self.figment()?.extract()?;
        config.validate()?;
        debug!(
            page_size = config.page_size,
            debounce_ms = config.debounce_ms,
            render_timeout_ms = config.render.timeout_ms,
            "loaded picker configuration"
        );
        Ok(config)
    }

    /// Build the merged figment without extracting it.
    pub fn figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(PickerConfig::default()));

        for file in self.discovery.discover_all() {
            trace!("Loading config file: {} ({:?})", file.path.display(), file.format);
            figment = figment.merge(file_provider(&file));
        }

        for path in &self.explicit_files {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound { path: path.clone() });
            }
            let format = ConfigFormat::from_path(path)
                .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.clone() })?;
            trace!("Loading explicit config file: {}", path.display());
            figment = figment.merge(file_provider(&ConfigFile {
                path: path.clone(),
                format,
                scope: ConfigScope::Project,
            }));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }
}

fn file_provider(file: &ConfigFile) -> Figment {
    match file.format {
        ConfigFormat::Toml => Figment::from(Toml::file(&file.path)),
        ConfigFormat::Yaml => Figment::from(Yaml::file(&file.path)),
        ConfigFormat::Json => Figment::from(Json::file(&file.path)),
    }
}
