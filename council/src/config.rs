//! Client configuration
//!
//! Defaults, then an optional TOML file, then environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CouncilError, CouncilResult};

/// Configuration for the council client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilConfig {
    /// Base URL of the debate service
    pub base_url: String,
    /// Path of the classification endpoint
    pub classify_path: String,
    /// Path of the short-summary endpoint
    pub summary_path: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum characters kept from an uploaded document
    pub max_document_chars: usize,
    /// Characters of the first query used as a new session's title
    pub title_max_chars: usize,
    /// Chat text used when the summary call fails
    pub summary_placeholder: String,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            classify_path: "/tsdc/classify".to_string(),
            summary_path: "/tsdc/tldr".to_string(),
            timeout_secs: 300,
            max_document_chars: 10_000,
            title_max_chars: 30,
            summary_placeholder: "Summary unavailable.".to_string(),
        }
    }
}

impl CouncilConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(raw: &str) -> CouncilResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file and overlay environment variables
    pub fn load(path: impl AsRef<Path>) -> CouncilResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("COUNCIL_API_URL") {
            self.base_url = url;
        }
        if let Ok(path) = std::env::var("COUNCIL_CLASSIFY_PATH") {
            self.classify_path = path;
        }
        if let Ok(path) = std::env::var("COUNCIL_SUMMARY_PATH") {
            self.summary_path = path;
        }
        if let Ok(secs) = std::env::var("COUNCIL_TIMEOUT_SECS") {
            if let Ok(n) = secs.parse() {
                self.timeout_secs = n;
            }
        }
        if let Ok(max) = std::env::var("COUNCIL_MAX_DOCUMENT_CHARS") {
            if let Ok(n) = max.parse() {
                self.max_document_chars = n;
            }
        }
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> CouncilResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(CouncilError::config("base_url must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(CouncilError::config("timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full classification URL
    pub fn classify_url(&self) -> String {
        join_url(&self.base_url, &self.classify_path)
    }

    /// Full summary URL
    pub fn summary_url(&self) -> String {
        join_url(&self.base_url, &self.summary_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
