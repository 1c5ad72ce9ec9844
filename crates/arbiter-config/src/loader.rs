//! Configuration loader with multi-source merging

use crate::{API_KEY_ENV_VAR, ArbiterConfig};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

/// Git-tracked project config, read from the project directory.
const PROJECT_CONFIG_FILE: &str = "arbiter.toml";

/// Gitignored per-checkout overrides, read from the project directory.
const LOCAL_CONFIG_FILE: &str = "arbiter.local.toml";

/// User defaults (~/.config/arbiter/config.toml on Linux).
fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("com", "Arbiter", "arbiter").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    config_file: Option<PathBuf>,
    env_vars: Option<config::Map<String, String>>,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "ARBITER".to_string(),
            config_file: None,
            env_vars: None,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "ARBITER")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Add an explicit config file, layered above the local config
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read environment variables from `vars` instead of the process
    /// environment. Applies to both the prefixed layer and `WAY_API_KEY`.
    pub fn with_env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    fn env_var(&self, name: &str) -> Option<String> {
        match &self.env_vars {
            Some(vars) => vars.get(name).cloned(),
            None => env::var(name).ok(),
        }
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<ArbiterConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = ArbiterConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/arbiter/config.toml)
        if let Some(user_config_file) = user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        // 3. Project config (arbiter.toml)
        let project_config_file = self.project_dir.join(PROJECT_CONFIG_FILE);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (arbiter.local.toml, gitignored)
        let local_config_file = self.project_dir.join(LOCAL_CONFIG_FILE);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Explicit file (--config); must exist
        if let Some(file) = &self.config_file {
            if !file.exists() {
                anyhow::bail!("Config file not found: {}", file.display());
            }
            builder = builder.add_source(
                config::File::from(file.clone())
                    .required(true)
                    .format(config::FileFormat::Toml),
            );
        }

        // 6. Environment variables (ARBITER_CLIENT__ENDPOINT, ...)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(self.env_vars.clone()),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let mut arbiter_config: ArbiterConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        arbiter_config.apply_api_key_fallback(self.env_var(API_KEY_ENV_VAR));
        arbiter_config.resolve_paths(&self.project_dir);
        arbiter_config.validate()?;

        Ok(arbiter_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
