//! Configuration management for Arbiter
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (`ARBITER_<SECTION>__<KEY>`)
//! 3. arbiter.local.toml (gitignored, local overrides)
//! 4. arbiter.toml (git-tracked, project config)
//! 5. ~/.config/arbiter/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)
//!
//! The API key additionally falls back to the `WAY_API_KEY` environment
//! variable when no layer sets it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

/// Environment variable consulted when no configured API key is present.
pub const API_KEY_ENV_VAR: &str = "WAY_API_KEY";

/// Main Arbiter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    pub client: ClientSettings,
    pub engine: EngineSettings,
    pub policies: PolicySettings,
}

/// Settings for talking to a remote decision service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub admin_prefix: String,
    pub entities_path: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            api_key: None,
            timeout_secs: 60,
            admin_prefix: "/admin".to_string(),
            entities_path: "/admin/fetchers/registry/entities".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub default_action: String,
    pub bulk_check_max_requests: usize,
    pub bulk_check_batch_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_action: "access".to_string(),
            bulk_check_max_requests: 100,
            bulk_check_batch_size: 10,
        }
    }
}

/// Policy documents loaded for local evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub files: Vec<PathBuf>,
}

impl ArbiterConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Resolve relative policy file paths against `base_dir`
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();
        for file in &mut self.policies.files {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }

    /// Fill in the API key from `env_value` if no layer configured one.
    pub fn apply_api_key_fallback(&mut self, env_value: Option<String>) {
        if self.client.api_key.is_none() {
            self.client.api_key = env_value.filter(|key| !key.is_empty());
        }
    }

    /// Check values that would make the client or engine unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.client.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "client.endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "client.timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (name, path) in [
            ("client.admin_prefix", &self.client.admin_prefix),
            ("client.entities_path", &self.client.entities_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must start with '/', got '{path}'"
                )));
            }
        }
        if self.engine.default_action.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "engine.default_action must not be empty".to_string(),
            ));
        }
        if self.engine.bulk_check_max_requests == 0 || self.engine.bulk_check_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "engine bulk check limits must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }
}
