//! # Runtime Configuration Module
//!
//! Client settings, layered in this order (later wins):
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config apiform.toml`); a missing file is not an error
//! 3. environment variables
//! 4. command-line flags ([`ClientConfig::apply_overrides`])
//!
//! ## Environment Variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `APIFORM_BASE_URL` | unset |
//! | `APIFORM_JSON_LOCATION` | `openapi.json` |
//! | `APIFORM_SPEC_FILE` | unset |
//! | `APIFORM_SPEC_TIMEOUT_SECS` | `15` |
//! | `APIFORM_REQUEST_TIMEOUT_SECS` | `20` |
//! | `APIFORM_MAX_FORM_DEPTH` | `10` |
//!
//! ## Example File
//!
//! ```toml
//! base_url = "http://localhost:8000"
//! json_location = "openapi.json"
//! request_timeout_secs = 30
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_JSON_LOCATION: &str = "openapi.json";
pub const DEFAULT_SPEC_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_MAX_FORM_DEPTH: usize = 10;

/// Settings of one client session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL; requests go to `<base_url><path>`
    pub base_url: Option<String>,
    /// Location of the API document relative to the base URL
    pub json_location: String,
    /// Local API document used instead of fetching one
    pub spec_file: Option<String>,
    pub spec_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Nesting limit of the form walker
    pub max_form_depth: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: None,
            json_location: DEFAULT_JSON_LOCATION.to_string(),
            spec_file: None,
            spec_timeout_secs: DEFAULT_SPEC_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_form_depth: DEFAULT_MAX_FORM_DEPTH,
        }
    }
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub json_location: Option<String>,
    pub spec_file: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_form_depth: Option<usize>,
}

/// Load a TOML config file.
///
/// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
/// cannot be read or parsed.
pub fn load_config_file(path: &Path) -> anyhow::Result<Option<ClientConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: ClientConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(Some(config))
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ClientConfig {
    /// Defaults, then `file` (if given and present), then the environment
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let base = match file {
            Some(path) => load_config_file(path)?.unwrap_or_default(),
            None => ClientConfig::default(),
        };
        Ok(base.with_env())
    }

    /// Overlay `APIFORM_*` environment variables
    pub fn with_env(mut self) -> Self {
        if let Some(url) = env::var("APIFORM_BASE_URL").ok().and_then(non_blank) {
            self.base_url = Some(url);
        }
        if let Some(location) = env::var("APIFORM_JSON_LOCATION").ok().and_then(non_blank) {
            self.json_location = location;
        }
        if let Some(file) = env::var("APIFORM_SPEC_FILE").ok().and_then(non_blank) {
            self.spec_file = Some(file);
        }
        if let Some(secs) = env_number("APIFORM_SPEC_TIMEOUT_SECS") {
            self.spec_timeout_secs = secs;
        }
        if let Some(secs) = env_number("APIFORM_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs;
        }
        if let Some(depth) = env_number("APIFORM_MAX_FORM_DEPTH") {
            self.max_form_depth = depth;
        }
        self
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = overrides.base_url.clone().and_then(non_blank) {
            self.base_url = Some(url);
        }
        if let Some(location) = overrides.json_location.clone().and_then(non_blank) {
            self.json_location = location;
        }
        if let Some(file) = overrides.spec_file.clone().and_then(non_blank) {
            self.spec_file = Some(file);
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(depth) = overrides.max_form_depth {
            self.max_form_depth = depth;
        }
    }

    pub fn spec_timeout(&self) -> Duration {
        Duration::from_secs(self.spec_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
