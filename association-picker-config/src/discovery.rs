//! Configuration file discovery
//!
//! Looks for `picker.{toml,yaml,yml,json}` in the global (`~/.association-picker/`)
//! and project (`./.association-picker/`) directories. Global files are returned
//! first so project files override them when merged.

use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Directory name searched in the home and working directories
pub const CONFIG_DIR_NAME: &str = ".association-picker";

const FILE_NAMES: [&str; 4] = ["picker.toml", "picker.yaml", "picker.yml", "picker.json"];

/// A discovered configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub format: ConfigFormat,
    pub scope: ConfigScope,
}

/// Configuration file format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Where a configuration file was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigScope {
    /// ~/.association-picker/
    Global,
    /// ./.association-picker/
    Project,
}

/// File discovery service for finding configuration files
#[derive(Debug, Clone, Default)]
pub struct FileDiscovery {
    project_dir: Option<PathBuf>,
    global_dir: Option<PathBuf>,
}

impl FileDiscovery {
    /// Directories are resolved at discovery time unless set explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit directories instead of the home and working directories.
    pub fn with_directories(project_dir: Option<PathBuf>, global_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            global_dir,
        }
    }

    /// Discover all configuration files, lowest precedence first.
    pub fn discover_all(&self) -> Vec<ConfigFile> {
        let project_dir = self.project_dir.clone().or_else(resolve_project_dir);
        let global_dir = self.global_dir.clone().or_else(resolve_global_dir);

        let mut files = Vec::new();
        if let Some(dir) = &global_dir {
            files.extend(search_directory(dir, ConfigScope::Global));
        }
        if let Some(dir) = &project_dir {
            files.extend(search_directory(dir, ConfigScope::Project));
        }
        files.sort_by_key(|f| f.scope);

        debug!(count = files.len(), "discovered configuration files");
        files
    }
}

fn search_directory(dir: &Path, scope: ConfigScope) -> Vec<ConfigFile> {
    if !dir.exists() {
        trace!("Directory does not exist: {}", dir.display());
        return Vec::new();
    }
    if !dir.is_dir() {
        warn!("Path exists but is not a directory: {}", dir.display());
        return Vec::new();
    }

    FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let format = ConfigFormat::from_path(&path)?;
            trace!("Found config: {} ({:?})", path.display(), format);
            Some(ConfigFile {
                path,
                format,
                scope,
            })
        })
        .collect()
}

fn resolve_project_dir() -> Option<PathBuf> {
    let dir = std::env::current_dir().ok()?.join(CONFIG_DIR_NAME);
    dir.is_dir().then_some(dir)
}

fn resolve_global_dir() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(CONFIG_DIR_NAME);
    dir.is_dir().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("YML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("Json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_global_files_sort_before_project_files() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(project.path().join("picker.yaml"), "page_size: 5").unwrap();
        fs::write(global.path().join("picker.toml"), "page_size = 20").unwrap();

        let discovery = FileDiscovery::with_directories(
            Some(project.path().to_path_buf()),
            Some(global.path().to_path_buf()),
        );
        let files = discovery.discover_all();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].scope, ConfigScope::Global);
        assert_eq!(files[0].format, ConfigFormat::Toml);
        assert_eq!(files[1].scope, ConfigScope::Project);
        assert_eq!(files[1].format, ConfigFormat::Yaml);
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("sah.toml"), "x = 1").unwrap();
        fs::write(project.path().join("picker.ini"), "x = 1").unwrap();

        let discovery = FileDiscovery::with_directories(
            Some(project.path().to_path_buf()),
            Some(project.path().join("missing")),
        );
        assert!(discovery.discover_all().is_empty());
    }
}
