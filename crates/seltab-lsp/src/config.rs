//! Server configuration.
//!
//! Loaded once at startup from `seltab.toml` in the working directory or
//! the user config directory. Missing file means defaults; a malformed
//! file logs a warning and also means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Configuration for the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeltabConfig {
    /// Where the selector cache database lives.
    pub cache_path: PathBuf,
    /// Page fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Minimum occurrence count a cached selector needs to be offered.
    pub min_occurrences: i64,
    /// Ignore-list applied when a declaration supplies none of its own.
    /// Empty means the built-in defaults.
    pub ignore_elements: Vec<String>,
}

impl Default for SeltabConfig {
    fn default() -> Self {
        Self {
            cache_path: config_dir().join("selectors.sqlite"),
            fetch_timeout_secs: 10,
            min_occurrences: 1,
            ignore_elements: Vec::new(),
        }
    }
}

impl SeltabConfig {
    /// Loads configuration from the first `seltab.toml` found.
    #[must_use]
    pub fn load() -> Self {
        let candidates = [
            PathBuf::from("seltab.toml"),
            config_dir().join("seltab.toml"),
        ];
        for path in &candidates {
            match std::fs::read_to_string(path) {
                Ok(contents) => return Self::from_toml(&contents, path),
                Err(_) => continue,
            }
        }
        Self::default()
    }

    fn from_toml(contents: &str, path: &Path) -> Self {
        match toml::from_str(contents) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring malformed config");
                Self::default()
            }
        }
    }

    /// The fetch timeout as a [`Duration`].
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("seltab")
}
