//! Logging helpers

use serde::Serialize;
use std::fmt::Debug;

/// Wrapper that renders a value as compact JSON in log statements.
///
/// ```ignore
/// tracing::debug!("final query params: {}", Pretty(&request));
/// ```
///
/// Debug output is used if serialization fails.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> std::fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

/// Install a global fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Hosts that already install a subscriber should not call this. Calling it
/// twice is harmless; the second call is ignored.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
