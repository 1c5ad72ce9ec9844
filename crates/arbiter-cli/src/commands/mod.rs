//! CLI command implementations.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use arbiter_client::{Client, ClientConfig};
use arbiter_config::{ArbiterConfig, ConfigLoader};
use arbiter_types::{AttributeValue, Attributes, CheckRequest, EntityCheck};
use clap::Args;

pub mod check;
pub mod config;
pub mod entity;
pub mod eval;
pub mod policy;
pub mod version;

/// Options shared by every command.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Project directory holding arbiter.toml.
    #[arg(long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Extra configuration file layered over the project config.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Decision service endpoint (overrides client.endpoint).
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<ArbiterConfig> {
        let mut loader = ConfigLoader::new().with_project_dir(&self.project);
        if let Some(file) = &self.config {
            loader = loader.with_config_file(file);
        }
        let mut config = loader.load().context("Failed to load configuration")?;
        if let Some(endpoint) = &self.endpoint {
            config.client.endpoint.clone_from(endpoint);
        }
        Ok(config)
    }
}

/// Principal, resource and action of a check, given on the command line.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// URI of a registered principal.
    #[arg(long)]
    pub principal_uri: Option<String>,

    /// Principal attribute as key=value (repeatable).
    #[arg(short = 'p', long = "principal", value_name = "KEY=VALUE", value_parser = parse_attribute)]
    pub principal: Vec<(String, AttributeValue)>,

    /// URI of a registered resource.
    #[arg(long)]
    pub resource_uri: Option<String>,

    /// Resource attribute as key=value (repeatable).
    #[arg(short = 'r', long = "resource", value_name = "KEY=VALUE", value_parser = parse_attribute)]
    pub resource: Vec<(String, AttributeValue)>,

    /// Action to check (defaults to engine.default_action).
    #[arg(short, long)]
    pub action: Option<String>,
}

impl RequestArgs {
    pub fn to_request(&self, default_action: &str) -> CheckRequest {
        let principal = entity_check(EntityCheck::principal(), self.principal_uri.as_deref(), &self.principal);
        let resource = entity_check(EntityCheck::resource(), self.resource_uri.as_deref(), &self.resource);
        let action = self.action.as_deref().unwrap_or(default_action);
        CheckRequest::new(principal, resource).with_action(action)
    }
}

fn entity_check(base: EntityCheck, uri: Option<&str>, pairs: &[(String, AttributeValue)]) -> EntityCheck {
    let check = base.with_attributes(collect_attributes(pairs));
    match uri {
        Some(uri) => check.with_uri(uri),
        None => check,
    }
}

pub fn collect_attributes(pairs: &[(String, AttributeValue)]) -> Attributes {
    pairs.iter().cloned().collect()
}

/// Parses `key=value`; the value goes through [`AttributeValue::parse_literal`].
pub fn parse_attribute(raw: &str) -> Result<(String, AttributeValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("attribute key is empty in '{raw}'"));
    }
    Ok((key.to_string(), AttributeValue::parse_literal(value)))
}

pub fn client(config: &ArbiterConfig) -> Result<Client> {
    let settings = &config.client;
    let mut client_config = ClientConfig::new(&settings.endpoint)
        .with_timeout(Duration::from_secs(settings.timeout_secs))
        .with_admin_prefix(&settings.admin_prefix)
        .with_entities_path(&settings.entities_path);
    if let Some(key) = &settings.api_key {
        client_config = client_config.with_api_key(key);
    }
    Client::new(client_config).context("Failed to create HTTP client")
}

/// Runs a future on a single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
