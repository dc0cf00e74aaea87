//! Configuration value types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Longest accepted search debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Picker-wide settings. Every field has a default, so partial files are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Rows requested per page.
    pub page_size: u32,
    /// Quiet period before typed search text is committed.
    pub debounce_ms: u64,
    pub render: RenderLimits,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            debounce_ms: 300,
            render: RenderLimits::default(),
        }
    }
}

impl PickerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size < 1 {
            return Err(ConfigError::validation("page_size", "must be at least 1"));
        }
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::validation(
                "debounce_ms",
                format!("must not exceed {MAX_DEBOUNCE_MS}"),
            ));
        }
        if self.render.timeout_ms < 1 {
            return Err(ConfigError::validation(
                "render.timeout_ms",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Resource limits for the render-template sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderLimits {
    pub memory_limit_bytes: usize,
    pub max_stack_bytes: usize,
    pub timeout_ms: u64,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 10 * 1024 * 1024,
            max_stack_bytes: 512 * 1024,
            timeout_ms: 250,
        }
    }
}

impl RenderLimits {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PickerConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.render.memory_limit_bytes, 10_485_760);
        assert_eq!(config.render.max_stack_bytes, 524_288);
        assert_eq!(config.render.timeout(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PickerConfig =
            serde_json::from_str(r#"{"page_size": 25, "render": {"timeout_ms": 100}}"#).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.render.timeout_ms, 100);
        assert_eq!(config.render.max_stack_bytes, 524_288);
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        let zero_page = PickerConfig {
            page_size: 0,
            ..PickerConfig::default()
        };
        assert!(matches!(
            zero_page.validate(),
            Err(ConfigError::Validation { key, .. }) if key == "page_size"
        ));

        let slow = PickerConfig {
            debounce_ms: MAX_DEBOUNCE_MS + 1,
            ..PickerConfig::default()
        };
        assert!(slow.validate().is_err());

        let mut no_time = PickerConfig::default();
        no_time.render.timeout_ms = 0;
        assert!(matches!(
            no_time.validate(),
            Err(ConfigError::Validation { key, .. }) if key == "render.timeout_ms"
        ));
    }
}
